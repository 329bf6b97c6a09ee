//! Sizing plan for the single memory block backing an [`OcpQp`](super::OcpQp).
//!
//! The block is partitioned, relative to a 64 byte aligned base, as
//!
//! 1. index-array headers (`idxb` for every stage, then `idxs`)
//! 2. matrix headers (`BAbt`, `RSQrq`, `DCt`)
//! 3. vector headers (`b`, `rqz`, `d`, `m`, `Z`)
//! 4. integer payload (`idxb` for every stage, then `idxs`)
//! 5. floating point payload, starting on a cache line: per-stage
//!    `BAbt`, `RSQrq`, `DCt` and `Z` blocks, followed by the stacked
//!    `rqz`, `b`, `d` and `m` vectors with stage blocks packed back to back.
//!
//! Headers are plain `#[repr(C)]` descriptors stored inside the block
//! itself, so that a bound QP is fully described by its memory.

use super::dim::OcpQpDim;
use super::error::ArenaError;
use crate::algebra::*;
use bytemuck::{Pod, Zeroable};
use std::mem::size_of;

/// Descriptor of an integer index array.  Offsets are in bytes from the
/// aligned base of the block.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct IdxHeader {
    pub offset: usize,
    pub len: usize,
}

/// Descriptor of a column major matrix payload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct MatHeader {
    pub rows: usize,
    pub cols: usize,
    pub offset: usize,
    pub memsize: usize,
}

/// Descriptor of a vector payload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct VecHeader {
    pub len: usize,
    pub offset: usize,
    pub memsize: usize,
}

/// Regions of the block, in placement order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionKind {
    IdxHeaders,
    MatHeaders,
    VecHeaders,
    Idxb,
    Idxs,
    BAbt,
    RSQrq,
    DCt,
    Z,
    Rqz,
    B,
    D,
    M,
}

impl RegionKind {
    pub const ALL: [RegionKind; 13] = [
        RegionKind::IdxHeaders,
        RegionKind::MatHeaders,
        RegionKind::VecHeaders,
        RegionKind::Idxb,
        RegionKind::Idxs,
        RegionKind::BAbt,
        RegionKind::RSQrq,
        RegionKind::DCt,
        RegionKind::Z,
        RegionKind::Rqz,
        RegionKind::B,
        RegionKind::D,
        RegionKind::M,
    ];

    /// true for regions holding floating point data
    pub fn is_float(&self) -> bool {
        !matches!(
            self,
            RegionKind::IdxHeaders
                | RegionKind::MatHeaders
                | RegionKind::VecHeaders
                | RegionKind::Idxb
                | RegionKind::Idxs
        )
    }
}

/// A contiguous byte range of the block, relative to its aligned base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub offset: usize,
    pub len: usize,
}

impl Region {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

// Sizes that do not fit in `usize` can never be backed by a block.
fn overflow() -> ArenaError {
    ArenaError::CapacityExceeded {
        required: usize::MAX,
        available: isize::MAX as usize,
    }
}

fn add(a: usize, b: usize) -> Result<usize, ArenaError> {
    a.checked_add(b).ok_or_else(overflow)
}

fn mul(a: usize, b: usize) -> Result<usize, ArenaError> {
    a.checked_mul(b).ok_or_else(overflow)
}

fn sum(lens: &[usize]) -> Result<usize, ArenaError> {
    lens.iter().try_fold(0, |acc, &n| add(acc, n))
}

// checked counterpart of `matrix_memsize`
fn mat_bytes<T>(m: usize, n: usize) -> Result<usize, ArenaError> {
    let bytes = mul(mul(m, n)?, size_of::<T>())?;
    add(bytes, CACHE_LINE_SIZE - 1)?;
    Ok(align_up(bytes, CACHE_LINE_SIZE))
}

// checked counterpart of `vector_memsize`
fn vec_bytes<T>(n: usize) -> Result<usize, ArenaError> {
    mat_bytes::<T>(n, 1)
}

// bump cursor over the block
struct Cursor {
    pos: usize,
}

impl Cursor {
    fn take(&mut self, bytes: usize) -> Result<usize, ArenaError> {
        let offset = self.pos;
        self.pos = add(self.pos, bytes)?;
        Ok(offset)
    }
    fn align(&mut self, align: usize) -> Result<(), ArenaError> {
        add(self.pos, align - 1)?;
        self.pos = align_up(self.pos, align);
        Ok(())
    }
}

/// The complete placement plan for one problem: every region and every
/// header value, derived from the dimensions alone.
///
/// The header tables always match the copies stored in the block;
/// [`OcpQp::resize_bounds`](super::OcpQp::resize_bounds) updates both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcpQpLayout {
    regions: [Region; 13],
    pub(crate) idx_headers: Vec<IdxHeader>,
    pub(crate) mat_headers: Vec<MatHeader>,
    pub(crate) vec_headers: Vec<VecHeader>,
    used: usize,
    memsize: usize,
}

impl OcpQpLayout {
    /// Plans the block for `dim`.  Fails with
    /// [`ArenaError::CapacityExceeded`] when the total size overflows
    /// `usize`.
    pub fn new<T: FloatT>(dim: &OcpQpDim) -> Result<Self, ArenaError> {
        let N = dim.N;
        let st = dim.stages();
        let fsz = size_of::<T>();
        let isz = size_of::<usize>();

        // per-stage counts, checked once so that the derived totals on
        // `dim` cannot wrap below
        let mut nux = Vec::with_capacity(st);
        let mut nv = Vec::with_capacity(st);
        let mut nc = Vec::with_capacity(st);
        for i in 0..st {
            // the augmented blocks carry one extra row
            let n = add(dim.nu[i], dim.nx[i])?;
            add(n, 1)?;
            nux.push(n);
            nv.push(add(n, mul(2, dim.ns[i])?)?);
            nc.push(mul(2, add(add(dim.nb[i], dim.ng[i])?, dim.ns[i])?)?);
        }
        let ne: Vec<usize> = (0..N).map(|i| dim.nx[i + 1]).collect();

        let mut regions = RegionKind::ALL.map(|kind| Region {
            kind,
            offset: 0,
            len: 0,
        });
        let mut cursor = Cursor { pos: 0 };
        let mut place = |kind: RegionKind, len: usize, cursor: &mut Cursor| -> Result<usize, ArenaError> {
            let offset = cursor.take(len)?;
            regions[kind as usize] = Region { kind, offset, len };
            Ok(offset)
        };

        // headers
        place(RegionKind::IdxHeaders, mul(2 * st, size_of::<IdxHeader>())?, &mut cursor)?;
        place(RegionKind::MatHeaders, mul(N + 2 * st, size_of::<MatHeader>())?, &mut cursor)?;
        place(RegionKind::VecHeaders, mul(N + 4 * st, size_of::<VecHeader>())?, &mut cursor)?;

        // integer payload
        let mut idx_headers = Vec::with_capacity(2 * st);
        let idxb0 = place(RegionKind::Idxb, mul(sum(&dim.nb)?, isz)?, &mut cursor)?;
        let idxs0 = place(RegionKind::Idxs, mul(sum(&dim.ns)?, isz)?, &mut cursor)?;
        idx_headers.extend(packed_idx(idxb0, &dim.nb));
        idx_headers.extend(packed_idx(idxs0, &dim.ns));

        cursor.align(CACHE_LINE_SIZE)?;

        // per-stage matrix payloads
        let mut mat_headers = Vec::with_capacity(N + 2 * st);
        let mut mat_region =
            |kind: RegionKind, shapes: Vec<(usize, usize)>, cursor: &mut Cursor| -> Result<(), ArenaError> {
                let sizes = shapes
                    .iter()
                    .map(|&(m, n)| mat_bytes::<T>(m, n))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut offset = place(kind, sum(&sizes)?, cursor)?;
                for ((rows, cols), memsize) in shapes.into_iter().zip(sizes) {
                    mat_headers.push(MatHeader {
                        rows,
                        cols,
                        offset,
                        memsize,
                    });
                    offset += memsize;
                }
                Ok(())
            };
        let babt: Vec<_> = (0..N).map(|i| (nux[i] + 1, ne[i])).collect();
        let rsqrq: Vec<_> = (0..st).map(|i| (nux[i] + 1, nux[i])).collect();
        let dct: Vec<_> = (0..st).map(|i| (nux[i], dim.ng[i])).collect();
        mat_region(RegionKind::BAbt, babt, &mut cursor)?;
        mat_region(RegionKind::RSQrq, rsqrq, &mut cursor)?;
        mat_region(RegionKind::DCt, dct, &mut cursor)?;

        // slack weights, one cache aligned vector per stage
        let zsizes = (0..st)
            .map(|i| vec_bytes::<T>(mul(2, dim.ns[i])?))
            .collect::<Result<Vec<_>, _>>()?;
        let mut offset = place(RegionKind::Z, sum(&zsizes)?, &mut cursor)?;
        let mut z_headers = Vec::with_capacity(st);
        for (i, &memsize) in zsizes.iter().enumerate() {
            z_headers.push(VecHeader {
                len: 2 * dim.ns[i],
                offset,
                memsize,
            });
            offset += memsize;
        }

        // stacked vectors
        let rqz0 = place(RegionKind::Rqz, vec_bytes::<T>(sum(&nv)?)?, &mut cursor)?;
        let b0 = place(RegionKind::B, vec_bytes::<T>(sum(&ne)?)?, &mut cursor)?;
        let d0 = place(RegionKind::D, vec_bytes::<T>(sum(&nc)?)?, &mut cursor)?;
        let m0 = place(RegionKind::M, vec_bytes::<T>(sum(&nc)?)?, &mut cursor)?;

        let mut vec_headers = Vec::with_capacity(N + 4 * st);
        vec_headers.extend(packed_vec::<T>(b0, &ne));
        vec_headers.extend(packed_vec::<T>(rqz0, &nv));
        vec_headers.extend(packed_vec::<T>(d0, &nc));
        vec_headers.extend(packed_vec::<T>(m0, &nc));
        vec_headers.extend(z_headers);

        debug_assert!(cursor.pos % CACHE_LINE_SIZE == 0);
        debug_assert!(regions.iter().all(|r| !r.kind.is_float() || r.offset % fsz == 0));

        let used = cursor.pos;
        Ok(Self {
            regions,
            idx_headers,
            mat_headers,
            vec_headers,
            used,
            memsize: add(used, CACHE_LINE_SIZE)?,
        })
    }

    /// Bytes required for the block, including slack for aligning the base.
    pub fn memsize(&self) -> usize {
        self.memsize
    }

    /// Bytes actually covered by the plan, measured from the aligned base.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn region(&self, kind: RegionKind) -> Region {
        self.regions[kind as usize]
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Byte range holding floating point data.
    pub fn float_span(&self) -> (usize, usize) {
        (self.region(RegionKind::BAbt).offset, self.used)
    }
}

/// Bytes required to bind an [`OcpQp`](super::OcpQp) with the given
/// dimensions and float type.  Saturates at `usize::MAX` when the layout
/// does not fit in the address space.
pub fn memsize<T: FloatT>(dim: &OcpQpDim) -> usize {
    OcpQpLayout::new::<T>(dim).map_or(usize::MAX, |layout| layout.memsize())
}

// index arrays packed back to back from `start`
pub(crate) fn packed_idx(start: usize, lens: &[usize]) -> Vec<IdxHeader> {
    let mut offset = start;
    lens.iter()
        .map(|&len| {
            let h = IdxHeader { offset, len };
            offset += len * size_of::<usize>();
            h
        })
        .collect()
}

// vectors packed back to back from `start`, sharing one storage vector
pub(crate) fn packed_vec<T>(start: usize, lens: &[usize]) -> Vec<VecHeader> {
    let mut offset = start;
    lens.iter()
        .map(|&len| {
            let memsize = len * size_of::<T>();
            let h = VecHeader {
                len,
                offset,
                memsize,
            };
            offset += memsize;
            h
        })
        .collect()
}
