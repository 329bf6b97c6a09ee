#![allow(non_snake_case)]

use ocpqp::algebra::*;
use ocpqp::ocp_qp::*;
use proptest::prelude::*;
use std::mem::size_of;

fn stage_dims() -> impl Strategy<Value = (usize, usize, usize, usize, usize, usize)> {
    (0usize..5, 0usize..4, 0usize..3, 0usize..3)
        .prop_flat_map(|(nx, nu, ng, ns)| (Just(nx), Just(nu), 0..=nu, 0..=nx, Just(ng), Just(ns)))
}

fn ocp_dims() -> impl Strategy<Value = OcpQpDim> {
    proptest::collection::vec(stage_dims(), 1..5).prop_map(|stages| {
        let col = |k: usize| -> Vec<usize> {
            stages
                .iter()
                .map(|s| [s.0, s.1, s.2, s.3, s.4, s.5][k])
                .collect()
        };
        OcpQpDim::new(&col(0), &col(1), &col(2), &col(3), &col(4), &col(5)).unwrap()
    })
}

// memsize rebuilt from the storage primitives, stage by stage
fn reference_memsize(dim: &OcpQpDim) -> usize {
    let N = dim.N;
    let st = N + 1;

    let headers = 2 * st * size_of::<IdxHeader>()
        + (N + 2 * st) * size_of::<MatHeader>()
        + (N + 4 * st) * size_of::<VecHeader>();
    let ints = (dim.nbt() + dim.nst()) * size_of::<usize>();

    let mut floats = 0;
    for i in 0..N {
        floats += matrix_memsize::<f64>(dim.nux(i) + 1, dim.nx[i + 1]);
    }
    for i in 0..st {
        floats += matrix_memsize::<f64>(dim.nux(i) + 1, dim.nux(i));
        floats += matrix_memsize::<f64>(dim.nux(i), dim.ng[i]);
        floats += vector_memsize::<f64>(2 * dim.ns[i]);
    }
    floats += vector_memsize::<f64>(dim.nvt());
    floats += vector_memsize::<f64>(dim.net());
    floats += 2 * vector_memsize::<f64>(dim.nct());

    align_up(headers + ints, CACHE_LINE_SIZE) + floats + CACHE_LINE_SIZE
}

// every float and index payload of a stage, RSQrq optional
fn stage_snapshot(qp: &OcpQp<f64>, i: usize, with_rsqrq: bool) -> Vec<f64> {
    let mut out = Vec::new();
    if i < qp.dim().N {
        out.extend_from_slice(qp.BAbt(i).data);
        out.extend_from_slice(qp.b(i));
    }
    if with_rsqrq {
        out.extend_from_slice(qp.RSQrq(i).data);
    }
    out.extend_from_slice(qp.DCt(i).data);
    out.extend_from_slice(qp.rqz(i));
    out.extend_from_slice(qp.d(i));
    out.extend_from_slice(qp.m(i));
    out.extend_from_slice(qp.Z(i));
    out.extend(qp.idxb(i).iter().map(|&k| k as f64));
    out.extend(qp.idxs(i).iter().map(|&k| k as f64));
    out
}

fn fill_stage(qp: &mut OcpQp<f64>, i: usize, seed: f64) {
    if i < qp.dim().N {
        qp.BAbt_mut(i).data.iter_mut().for_each(|v| *v = seed + 0.1);
        qp.b_mut(i).set(seed + 0.2);
    }
    qp.RSQrq_mut(i).data.iter_mut().for_each(|v| *v = seed + 0.3);
    qp.DCt_mut(i).data.iter_mut().for_each(|v| *v = seed + 0.4);
    qp.rqz_mut(i).set(seed + 0.5);
    qp.d_mut(i).set(seed + 0.6);
    qp.m_mut(i).set(seed + 0.7);
    qp.Z_mut(i).set(seed + 0.8);
    let nux = qp.dim().nux(i);
    for (j, k) in qp.idxb_mut(i).iter_mut().enumerate() {
        *k = j % nux.max(1);
    }
    qp.idxs_mut(i).iter_mut().for_each(|k| *k = 0);
}

#[test]
fn test_memsize_matches_reference() {
    let dim = OcpQpDim::new(&[4, 4, 4], &[2, 2, 0], &[2, 1, 0], &[0, 2, 4], &[1, 0, 3], &[1, 0, 2]).unwrap();
    assert_eq!(memsize::<f64>(&dim), reference_memsize(&dim));
    assert_eq!(OcpQp::<f64>::memsize(&dim), reference_memsize(&dim));

    // a smaller float type never needs more room
    assert!(memsize::<f32>(&dim) <= memsize::<f64>(&dim));
}

#[test]
fn test_out_of_memory() {
    let dim = OcpQpDim::uniform(3, 2, 1, 1, 1, 0, 0).unwrap();
    let need = memsize::<f64>(&dim);

    let err = OcpQp::<f64>::from_memory(&dim, vec![0u8; need / 2]).err();
    assert_eq!(
        err,
        Some(ArenaError::CapacityExceeded {
            required: need,
            available: need / 2
        })
    );
    assert!(OcpQp::<f64>::from_memory(&dim, vec![0u8; need]).is_ok());
}

#[test]
fn test_memory_reuse() {
    let dim = OcpQpDim::uniform(2, 3, 1, 1, 0, 1, 0).unwrap();
    let mut qp = OcpQp::<f64>::new(&dim).unwrap();
    fill_stage(&mut qp, 1, 7.0);

    // rebinding the same block zeroes it again
    let mem = qp.into_memory();
    let qp = OcpQp::<f64>::from_memory(&dim, mem).unwrap();
    assert!(qp.BAbt(1).data.iter().all(|&v| v == 0.0));
    assert!(qp.RSQrq(1).data.iter().all(|&v| v == 0.0));
    assert!(qp.d(1).iter().all(|&v| v == 0.0));
    assert!(qp.Z(1).iter().all(|&v| v == 0.0));
}

#[test]
fn test_stage_disjointness() {
    let dim = OcpQpDim::new(
        &[3, 2, 4, 2],
        &[2, 1, 1, 0],
        &[1, 1, 0, 0],
        &[2, 1, 3, 2],
        &[1, 2, 0, 1],
        &[1, 0, 2, 1],
    )
    .unwrap();
    let mut qp = OcpQp::<f64>::new(&dim).unwrap();
    for i in 0..=dim.N {
        fill_stage(&mut qp, i, 10.0 * i as f64);
    }

    for i in 0..=dim.N {
        let before: Vec<Vec<f64>> = (0..=dim.N)
            .map(|j| stage_snapshot(&qp, j, j != i))
            .collect();

        qp.RSQrq_mut(i).data.iter_mut().for_each(|v| *v = -1.0);

        for j in 0..=dim.N {
            assert_eq!(before[j], stage_snapshot(&qp, j, j != i), "stage {j} touched by RSQrq({i})");
        }
        assert!(qp.RSQrq(i).data.iter().all(|&v| v == -1.0));
    }
}

#[test]
fn test_display() {
    let dim = OcpQpDim::uniform(1, 2, 1, 1, 0, 0, 0).unwrap();
    let qp = OcpQp::<f64>::new(&dim).unwrap();
    let text = qp.to_string();
    assert!(text.starts_with("OCP QP: N = 1"));
    assert!(text.contains("stage 1: nx = 2, nu = 0"));
}

proptest! {
    #[test]
    fn bind_stays_within_memsize(dim in ocp_dims(), extra in 0usize..80) {
        let need = memsize::<f64>(&dim);
        prop_assert_eq!(need, reference_memsize(&dim));
        prop_assert_eq!(need % CACHE_LINE_SIZE, 0);

        let qp = OcpQp::<f64>::from_memory(&dim, vec![0u8; need + extra]).unwrap();
        let layout = qp.layout();
        prop_assert!(layout.used() + CACHE_LINE_SIZE <= need);
        for pair in layout.regions().windows(2) {
            prop_assert!(pair[0].end() <= pair[1].offset);
        }
        for r in layout.regions() {
            prop_assert!(r.end() <= layout.used());
        }
    }

    #[test]
    fn memsize_is_monotone(dim in ocp_dims(), stage in 0usize..5, grow in 1usize..4) {
        let i = stage % (dim.N + 1);
        let mut ng = dim.ng.clone();
        let mut ns = dim.ns.clone();
        ng[i] += grow;
        ns[i] += grow;
        let bigger = OcpQpDim::new(&dim.nx, &dim.nu, &dim.nbu, &dim.nbx, &ng, &ns).unwrap();
        prop_assert!(memsize::<f64>(&bigger) >= memsize::<f64>(&dim));
    }

    #[test]
    fn bind_zeroes_dirty_memory(dim in ocp_dims()) {
        let mem = vec![0xabu8; memsize::<f64>(&dim)];
        let qp = OcpQp::<f64>::from_memory(&dim, mem).unwrap();
        for i in 0..=dim.N {
            if i < dim.N {
                prop_assert!(qp.BAbt(i).data.iter().all(|&v| v == 0.0));
                prop_assert!(qp.b(i).iter().all(|&v| v == 0.0));
            }
            prop_assert!(qp.RSQrq(i).data.iter().all(|&v| v == 0.0));
            prop_assert!(qp.DCt(i).data.iter().all(|&v| v == 0.0));
            prop_assert!(qp.rqz(i).iter().all(|&v| v == 0.0));
            prop_assert!(qp.d(i).iter().all(|&v| v == 0.0));
            prop_assert!(qp.m(i).iter().all(|&v| v == 0.0));
            prop_assert!(qp.Z(i).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn resize_is_idempotent(dim in ocp_dims(), seed in 0u64..1000) {
        prop_assume!((0..=dim.N).all(|i| dim.ns[i] == 0 || dim.nb[i] + dim.ng[i] > 0));
        let mut qp = OcpQp::<f64>::new(&dim).unwrap();

        // shrink every stage to a pseudo random split within the original counts
        let st = dim.N + 1;
        let mut nbu: Vec<usize> = (0..st)
            .map(|i| (seed as usize + i) % (dim.nbu[i] + 1))
            .collect();
        let mut nbx: Vec<usize> = (0..st)
            .map(|i| (seed as usize * 7 + i) % (dim.nbx[i] + 1))
            .collect();

        // zeroed idxs still soften row 0, so keep one row where slacks exist
        for i in 0..st {
            if dim.ns[i] > 0 && dim.ng[i] == 0 && nbu[i] + nbx[i] == 0 {
                nbu[i] = dim.nbu[i];
                nbx[i] = dim.nbx[i];
            }
        }

        qp.resize_bounds(&nbu, &nbx).unwrap();
        for i in 0..st {
            fill_stage(&mut qp, i, i as f64);
        }
        let dim_once = qp.dim().clone();
        let idx_once = qp.idx_headers().to_vec();
        let vec_once = qp.vec_headers().to_vec();
        let data_once: Vec<Vec<f64>> = (0..st).map(|i| stage_snapshot(&qp, i, true)).collect();

        qp.resize_bounds(&nbu, &nbx).unwrap();
        prop_assert_eq!(qp.dim(), &dim_once);
        prop_assert_eq!(qp.idx_headers(), &idx_once[..]);
        prop_assert_eq!(qp.vec_headers(), &vec_once[..]);
        let data_twice: Vec<Vec<f64>> = (0..st).map(|i| stage_snapshot(&qp, i, true)).collect();
        prop_assert_eq!(data_once, data_twice);
    }
}
