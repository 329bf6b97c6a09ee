#![allow(non_snake_case)]

use super::dim::{check_bound_split, OcpQpDim};
use super::error::{check_indices, check_len, ArenaError, QpError};
use super::layout::*;
use crate::algebra::*;
use std::marker::PhantomData;
use std::mem::size_of;

// positions of each block family within the header tables
#[derive(Clone, Copy)]
enum MatBlock {
    BAbt,
    RSQrq,
    DCt,
}

#[derive(Clone, Copy)]
enum VecBlock {
    B,
    Rqz,
    D,
    M,
    Z,
}

impl MatBlock {
    fn header_index(self, N: usize, stage: usize) -> usize {
        let (start, count) = match self {
            MatBlock::BAbt => (0, N),
            MatBlock::RSQrq => (N, N + 1),
            MatBlock::DCt => (2 * N + 1, N + 1),
        };
        assert!(stage < count, "stage {stage} has no such matrix block");
        start + stage
    }
}

impl VecBlock {
    fn header_index(self, N: usize, stage: usize) -> usize {
        let (start, count) = match self {
            VecBlock::B => (0, N),
            VecBlock::Rqz => (N, N + 1),
            VecBlock::D => (2 * N + 1, N + 1),
            VecBlock::M => (3 * N + 2, N + 1),
            VecBlock::Z => (4 * N + 3, N + 1),
        };
        assert!(stage < count, "stage {stage} has no such vector block");
        start + stage
    }
}

/// Structured OCP QP bound onto a single memory block.
///
/// All matrices and vectors of every stage are views into one owned byte
/// buffer, partitioned as described by [`OcpQpLayout`].  Upper bounds are
/// stored negated inside `d`, so that every inequality reads
/// `d - (constraint value) >= 0`.  Use the field accessors in
/// [`OcpQpField`](super::OcpQpField) for sign-correct access.
///
/// # Panics
///
/// The block accessors (`BAbt`, `RSQrq`, `DCt`, `b`, `rqz`, `d`, `m`, `Z`,
/// `idxb`, `idxs` and their `_mut` forms) index by stage like a slice and
/// panic for a stage without such a block, i.e. `stage > N`, or
/// `stage >= N` for the dynamics blocks `BAbt` and `b`.  The field
/// setters and getters return [`QpError::StageOutOfRange`] instead.
pub struct OcpQp<T: FloatT = f64> {
    dim: OcpQpDim,
    layout: OcpQpLayout,
    mem: Vec<u8>,
    // offset of the 64 byte aligned base within `mem`
    base: usize,
    phantom: PhantomData<T>,
}

impl<T> OcpQp<T>
where
    T: FloatT,
{
    /// Bytes required to bind a QP with dimensions `dim`.
    pub fn memsize(dim: &OcpQpDim) -> usize {
        memsize::<T>(dim)
    }

    /// Allocates a block of exactly [`memsize`](Self::memsize) bytes and
    /// binds a zeroed QP onto it.
    pub fn new(dim: &OcpQpDim) -> Result<Self, QpError> {
        let mem = vec![0u8; OcpQpLayout::new::<T>(dim)?.memsize()];
        Ok(Self::from_memory(dim, mem)?)
    }

    /// Binds a QP onto a caller supplied block, which must hold at least
    /// [`memsize`](Self::memsize) bytes.
    ///
    /// Every floating point payload is zeroed.  Index arrays keep whatever
    /// the block held and must be populated before use.
    pub fn from_memory(dim: &OcpQpDim, mut mem: Vec<u8>) -> Result<Self, ArenaError> {
        let layout = OcpQpLayout::new::<T>(dim)?;

        if mem.len() < layout.memsize() {
            return Err(ArenaError::CapacityExceeded {
                required: layout.memsize(),
                available: mem.len(),
            });
        }

        let base = mem.as_ptr().align_offset(CACHE_LINE_SIZE);
        let end = base.saturating_add(layout.used());
        if end > mem.len() {
            log::error!("OCP QP binder outside memory bounds: cursor {} > {}", end, mem.len());
            return Err(ArenaError::OutOfBounds {
                cursor: end,
                limit: mem.len(),
            });
        }

        write_headers(&mut mem, base, &layout);
        let (fstart, fend) = layout.float_span();
        mem[base + fstart..base + fend].fill(0);

        log::debug!(
            "bound OCP QP: N = {}, memsize = {} bytes, used = {} bytes, base offset = {}",
            dim.N,
            layout.memsize(),
            layout.used(),
            base
        );

        Ok(Self {
            dim: dim.clone(),
            layout,
            mem,
            base,
            phantom: PhantomData,
        })
    }

    /// Releases the QP, returning the backing block for reuse.
    pub fn into_memory(self) -> Vec<u8> {
        self.mem
    }

    pub fn dim(&self) -> &OcpQpDim {
        &self.dim
    }

    /// The placement plan, with headers for the current bound counts.
    pub fn layout(&self) -> &OcpQpLayout {
        &self.layout
    }

    /// Size of the backing block in bytes.
    pub fn capacity(&self) -> usize {
        self.mem.len()
    }

    // zeroes every floating point payload, leaving headers and index arrays
    pub(crate) fn clear_floats(&mut self) {
        let (fstart, fend) = self.layout.float_span();
        self.mem[self.base + fstart..self.base + fend].fill(0);
    }

    // ---------------------------------------------
    // headers, as currently stored in the block
    // ---------------------------------------------

    fn header_bytes(&self, kind: RegionKind) -> &[u8] {
        let r = self.layout.region(kind);
        &self.mem[self.base + r.offset..self.base + r.end()]
    }

    pub fn idx_headers(&self) -> &[IdxHeader] {
        bytemuck::cast_slice(self.header_bytes(RegionKind::IdxHeaders))
    }

    pub fn mat_headers(&self) -> &[MatHeader] {
        bytemuck::cast_slice(self.header_bytes(RegionKind::MatHeaders))
    }

    pub fn vec_headers(&self) -> &[VecHeader] {
        bytemuck::cast_slice(self.header_bytes(RegionKind::VecHeaders))
    }

    fn mat_header(&self, block: MatBlock, stage: usize) -> MatHeader {
        self.mat_headers()[block.header_index(self.dim.N, stage)]
    }

    fn vec_header(&self, block: VecBlock, stage: usize) -> VecHeader {
        self.vec_headers()[block.header_index(self.dim.N, stage)]
    }

    // ---------------------------------------------
    // typed payload views
    // ---------------------------------------------

    fn floats(&self, offset: usize, len: usize) -> &[T] {
        let start = self.base + offset;
        bytemuck::cast_slice(&self.mem[start..start + len * size_of::<T>()])
    }

    fn floats_mut(&mut self, offset: usize, len: usize) -> &mut [T] {
        let start = self.base + offset;
        bytemuck::cast_slice_mut(&mut self.mem[start..start + len * size_of::<T>()])
    }

    fn mat(&self, block: MatBlock, stage: usize) -> BorrowedMatrix<'_, T> {
        let h = self.mat_header(block, stage);
        BorrowedMatrix::<T>::from_slice(self.floats(h.offset, h.rows * h.cols), h.rows, h.cols)
    }

    fn mat_mut(&mut self, block: MatBlock, stage: usize) -> BorrowedMatrixMut<'_, T> {
        let h = self.mat_header(block, stage);
        BorrowedMatrixMut::<T>::from_slice_mut(self.floats_mut(h.offset, h.rows * h.cols), h.rows, h.cols)
    }

    fn vec(&self, block: VecBlock, stage: usize) -> &[T] {
        let h = self.vec_header(block, stage);
        self.floats(h.offset, h.len)
    }

    fn vec_mut(&mut self, block: VecBlock, stage: usize) -> &mut [T] {
        let h = self.vec_header(block, stage);
        self.floats_mut(h.offset, h.len)
    }

    fn idx(&self, which: usize) -> &[usize] {
        let h = self.idx_headers()[which];
        let start = self.base + h.offset;
        bytemuck::cast_slice(&self.mem[start..start + h.len * size_of::<usize>()])
    }

    fn idx_mut(&mut self, which: usize) -> &mut [usize] {
        let h = self.idx_headers()[which];
        let start = self.base + h.offset;
        bytemuck::cast_slice_mut(&mut self.mem[start..start + h.len * size_of::<usize>()])
    }

    /// Transposed augmented dynamics `[B'; A'; b']` of transition `stage`,
    /// shape `(nu+nx+1) x nx[stage+1]`.  Panics if `stage >= N`.
    pub fn BAbt(&self, stage: usize) -> BorrowedMatrix<'_, T> {
        self.mat(MatBlock::BAbt, stage)
    }
    pub fn BAbt_mut(&mut self, stage: usize) -> BorrowedMatrixMut<'_, T> {
        self.mat_mut(MatBlock::BAbt, stage)
    }

    /// Cost block `[R, .; S', Q; r', q']`, shape `(nu+nx+1) x (nu+nx)`,
    /// with only the lower triangle of the Hessian part populated.
    pub fn RSQrq(&self, stage: usize) -> BorrowedMatrix<'_, T> {
        self.mat(MatBlock::RSQrq, stage)
    }
    pub fn RSQrq_mut(&mut self, stage: usize) -> BorrowedMatrixMut<'_, T> {
        self.mat_mut(MatBlock::RSQrq, stage)
    }

    /// Transposed general constraint matrix `[D'; C']`, shape `(nu+nx) x ng`.
    pub fn DCt(&self, stage: usize) -> BorrowedMatrix<'_, T> {
        self.mat(MatBlock::DCt, stage)
    }
    pub fn DCt_mut(&mut self, stage: usize) -> BorrowedMatrixMut<'_, T> {
        self.mat_mut(MatBlock::DCt, stage)
    }

    /// Dynamics offset of transition `stage`.  Panics if `stage >= N`.
    pub fn b(&self, stage: usize) -> &[T] {
        self.vec(VecBlock::B, stage)
    }
    pub fn b_mut(&mut self, stage: usize) -> &mut [T] {
        self.vec_mut(VecBlock::B, stage)
    }

    /// Linear cost `[r; q; zl; zu]`.
    pub fn rqz(&self, stage: usize) -> &[T] {
        self.vec(VecBlock::Rqz, stage)
    }
    pub fn rqz_mut(&mut self, stage: usize) -> &mut [T] {
        self.vec_mut(VecBlock::Rqz, stage)
    }

    /// Constraint data `[lb; lg; -ub; -ug; ls; us]`.
    pub fn d(&self, stage: usize) -> &[T] {
        self.vec(VecBlock::D, stage)
    }
    pub fn d_mut(&mut self, stage: usize) -> &mut [T] {
        self.vec_mut(VecBlock::D, stage)
    }

    /// Complementarity offset, same packing as `d`.
    pub fn m(&self, stage: usize) -> &[T] {
        self.vec(VecBlock::M, stage)
    }
    pub fn m_mut(&mut self, stage: usize) -> &mut [T] {
        self.vec_mut(VecBlock::M, stage)
    }

    /// Slack weights `[Zl; Zu]`.
    pub fn Z(&self, stage: usize) -> &[T] {
        self.vec(VecBlock::Z, stage)
    }
    pub fn Z_mut(&mut self, stage: usize) -> &mut [T] {
        self.vec_mut(VecBlock::Z, stage)
    }

    /// Positions in `[u; x]` of the simple bounds at `stage`.
    pub fn idxb(&self, stage: usize) -> &[usize] {
        assert!(stage <= self.dim.N);
        self.idx(stage)
    }
    pub fn idxb_mut(&mut self, stage: usize) -> &mut [usize] {
        assert!(stage <= self.dim.N);
        self.idx_mut(stage)
    }

    /// Constraint rows in `[bounds; general]` softened by each slack.
    pub fn idxs(&self, stage: usize) -> &[usize] {
        assert!(stage <= self.dim.N);
        self.idx(self.dim.stages() + stage)
    }
    pub fn idxs_mut(&mut self, stage: usize) -> &mut [usize] {
        assert!(stage <= self.dim.N);
        let which = self.dim.stages() + stage;
        self.idx_mut(which)
    }

    // ---------------------------------------------
    // bound resizing
    // ---------------------------------------------

    /// Changes the input/state bound split of every stage without
    /// reallocating.  The `idxb`, `d` and `m` views are re-packed over the
    /// same bytes; their contents are not moved or cleared, and must be
    /// set again for the new bound counts.
    ///
    /// Fails without modifying the QP if the re-packed views exceed the
    /// capacity fixed at bind time, or if a slack in `idxs` softens a row
    /// that would no longer exist.
    pub fn resize_bounds(&mut self, nbu: &[usize], nbx: &[usize]) -> Result<(), QpError> {
        let st = self.dim.stages();
        check_len(st, nbu.len())?;
        check_len(st, nbx.len())?;
        check_bound_split(&self.dim.nx, &self.dim.nu, nbu, nbx)?;

        let nb: Vec<usize> = nbu.iter().zip(nbx).map(|(u, x)| u + x).collect();
        let nc: Vec<usize> = (0..st)
            .map(|i| 2 * (nb[i] + self.dim.ng[i] + self.dim.ns[i]))
            .collect();

        for i in 0..st {
            check_indices(self.idxs(i), nb[i] + self.dim.ng[i])?;
        }

        // capacities fixed at bind time
        let idxb_region = self.layout.region(RegionKind::Idxb);
        let idxb_bytes = nb.iter().sum::<usize>() * size_of::<usize>();
        if idxb_bytes > idxb_region.len {
            return Err(ArenaError::CapacityExceeded {
                required: idxb_bytes,
                available: idxb_region.len,
            }
            .into());
        }
        let d_region = self.layout.region(RegionKind::D);
        let d_bytes = nc.iter().sum::<usize>() * size_of::<T>();
        if d_bytes > d_region.len {
            return Err(ArenaError::CapacityExceeded {
                required: d_bytes,
                available: d_region.len,
            }
            .into());
        }

        let N = self.dim.N;
        let d0 = VecBlock::D.header_index(N, 0);
        let m0 = VecBlock::M.header_index(N, 0);
        let m_offset = self.layout.region(RegionKind::M).offset;

        self.layout.idx_headers[..st].copy_from_slice(&packed_idx(idxb_region.offset, &nb));
        self.layout.vec_headers[d0..d0 + st].copy_from_slice(&packed_vec::<T>(d_region.offset, &nc));
        self.layout.vec_headers[m0..m0 + st].copy_from_slice(&packed_vec::<T>(m_offset, &nc));
        write_headers(&mut self.mem, self.base, &self.layout);

        self.dim.nbu = nbu.to_vec();
        self.dim.nbx = nbx.to_vec();
        self.dim.nb = nb;

        log::debug!(
            "resized OCP QP bounds: nbu = {:?}, nbx = {:?}",
            self.dim.nbu,
            self.dim.nbx
        );

        Ok(())
    }
}

fn write_headers(mem: &mut [u8], base: usize, layout: &OcpQpLayout) {
    let tables: [(RegionKind, &[u8]); 3] = [
        (RegionKind::IdxHeaders, bytemuck::cast_slice(&layout.idx_headers)),
        (RegionKind::MatHeaders, bytemuck::cast_slice(&layout.mat_headers)),
        (RegionKind::VecHeaders, bytemuck::cast_slice(&layout.vec_headers)),
    ];
    for (kind, bytes) in tables {
        let r = layout.region(kind);
        mem[base + r.offset..base + r.end()].copy_from_slice(bytes);
    }
}

impl<T: FloatT> std::fmt::Display for OcpQp<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let dim = &self.dim;
        writeln!(f, "OCP QP: N = {}, memsize = {}", dim.N, self.layout.memsize())?;
        for i in 0..=dim.N {
            writeln!(
                f,
                "stage {}: nx = {}, nu = {}, nb = {} ({} + {}), ng = {}, ns = {}",
                i, dim.nx[i], dim.nu[i], dim.nb[i], dim.nbu[i], dim.nbx[i], dim.ng[i], dim.ns[i]
            )?;
            if i < dim.N {
                write!(f, "BAbt = {}", self.BAbt(i))?;
                writeln!(f, "b = {:?}", self.b(i))?;
            }
            write!(f, "RSQrq = {}", self.RSQrq(i))?;
            writeln!(f, "rqz = {:?}", self.rqz(i))?;
            if dim.ng[i] > 0 {
                write!(f, "DCt = {}", self.DCt(i))?;
            }
            writeln!(f, "idxb = {:?}", self.idxb(i))?;
            writeln!(f, "d = {:?}", self.d(i))?;
            writeln!(f, "m = {:?}", self.m(i))?;
            if dim.ns[i] > 0 {
                writeln!(f, "idxs = {:?}", self.idxs(i))?;
                writeln!(f, "Z = {:?}", self.Z(i))?;
            }
        }
        Ok(())
    }
}
