#![allow(non_snake_case)]

use ocpqp::algebra::*;
use ocpqp::dense_qp::*;
use ocpqp::ocp_qp::*;
use ocpqp::residuals::*;
use proptest::collection::vec;
use proptest::prelude::*;

const TOL: f64 = 1e-12;

fn assert_close(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    assert!(a.norm_inf_diff(b) < TOL, "{:?} != {:?}", a, b);
}

fn prefix(lens: &[usize]) -> Vec<usize> {
    lens.iter()
        .scan(0, |acc, &n| {
            let start = *acc;
            *acc += n;
            Some(start)
        })
        .collect()
}

fn hard_dim() -> OcpQpDim {
    OcpQpDim::new(&[2, 3, 2], &[2, 1, 0], &[1, 1, 0], &[1, 2, 2], &[1, 0, 2], &[0, 0, 0]).unwrap()
}

const DYNAMICS_FIELDS: [OcpQpField; 3] = [OcpQpField::A, OcpQpField::B, OcpQpField::BVec];

const STAGE_FIELDS: [OcpQpField; 11] = [
    OcpQpField::Q,
    OcpQpField::R,
    OcpQpField::S,
    OcpQpField::QVec,
    OcpQpField::RVec,
    OcpQpField::C,
    OcpQpField::D,
    OcpQpField::Lb,
    OcpQpField::Ub,
    OcpQpField::Lg,
    OcpQpField::Ug,
];

// number of floats consumed by `random_qp`
fn qp_data_len(dim: &OcpQpDim) -> usize {
    let qp = OcpQp::<f64>::new(dim).unwrap();
    let mut n = 0;
    for i in 0..dim.N {
        for field in DYNAMICS_FIELDS {
            n += qp.field_len(field, i).unwrap();
        }
    }
    for i in 0..=dim.N {
        for field in STAGE_FIELDS {
            n += qp.field_len(field, i).unwrap();
        }
        n += dim.nc(i);
    }
    n
}

fn take(data: &mut impl Iterator<Item = f64>, n: usize) -> Vec<f64> {
    data.take(n).collect()
}

fn random_qp(dim: &OcpQpDim, data: &[f64]) -> OcpQp<f64> {
    let mut qp = OcpQp::<f64>::new(dim).unwrap();
    let mut data = data.iter().copied();

    for i in 0..dim.N {
        for field in DYNAMICS_FIELDS {
            let n = qp.field_len(field, i).unwrap();
            qp.set(field.name(), i, &take(&mut data, n)).unwrap();
        }
    }
    for i in 0..=dim.N {
        for field in STAGE_FIELDS {
            let n = qp.field_len(field, i).unwrap();
            qp.set(field.name(), i, &take(&mut data, n)).unwrap();
        }

        // input bounds then state bounds, listed in reverse
        let (nu, nbu, nbx) = (dim.nu[i], dim.nbu[i], dim.nbx[i]);
        let mut idxb: Vec<usize> = (0..nbu).chain(nu..nu + nbx).collect();
        idxb.reverse();
        qp.set_index(OcpQpField::Idxb, i, &idxb).unwrap();

        let m = take(&mut data, dim.nc(i));
        qp.m_mut(i).copy_from(&m);
    }
    qp
}

// problem data, then ux, pi, lam and t
type FlattenCase = (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>);

fn flatten_case(dim: OcpQpDim) -> impl Strategy<Value = FlattenCase> {
    (
        vec(-1.0f64..1.0, qp_data_len(&dim)),
        vec(-1.0f64..1.0, dim.nvt()),
        vec(-1.0f64..1.0, dim.net()),
        vec(0.5f64..2.5, dim.nct()),
        vec(0.5f64..2.5, dim.nct()),
    )
}

// the same problem as one dense QP over v = [u0; x0; u1; x1; ...], and the
// map from dense inequality rows to structured ones
fn flatten(ocp: &OcpQp<f64>) -> (DenseQp<f64>, Vec<usize>) {
    let dim = ocp.dim();
    let N = dim.N;
    let st = dim.stages();

    let nux: Vec<usize> = (0..st).map(|i| dim.nux(i)).collect();
    let ne: Vec<usize> = (0..N).map(|i| dim.ne(i)).collect();
    let nc: Vec<usize> = (0..st).map(|i| dim.nc(i)).collect();
    let vo = prefix(&nux);
    let eo = prefix(&ne);
    let bo = prefix(&dim.nb);
    let go = prefix(&dim.ng);
    let co = prefix(&nc);

    let ddim = DenseQpDim::new(
        nux.iter().sum(),
        ne.iter().sum(),
        dim.nbt(),
        dim.ng.iter().sum(),
    );
    let mut qp = DenseQp::<f64>::new(ddim);

    for i in 0..st {
        let RSQ = ocp.RSQrq(i);
        let DCt = ocp.DCt(i);
        for r in 0..nux[i] {
            for c in 0..nux[i] {
                qp.H[(vo[i] + r, vo[i] + c)] = RSQ[(r, c)];
            }
            for c in 0..dim.ng[i] {
                qp.Ct[(vo[i] + r, go[i] + c)] = DCt[(r, c)];
            }
            qp.g[vo[i] + r] = ocp.rqz(i)[r];
        }
        for (k, &j) in ocp.idxb(i).iter().enumerate() {
            qp.idxb[bo[i] + k] = vo[i] + j;
        }
    }

    // x_{i+1} - B u - A x = b
    for i in 0..N {
        let BAbt = ocp.BAbt(i);
        for j in 0..ne[i] {
            for r in 0..nux[i] {
                qp.A[(eo[i] + j, vo[i] + r)] = -BAbt[(r, j)];
            }
            qp.A[(eo[i] + j, vo[i + 1] + dim.nu[i + 1] + j)] = 1.0;
            qp.b[eo[i] + j] = ocp.b(i)[j];
        }
    }

    // dense rows are [all lb; all lg; all ub; all ug]
    let mut perm = Vec::with_capacity(ddim.nc());
    for kind in 0..4 {
        for i in 0..st {
            let (nb, ng) = (dim.nb[i], dim.ng[i]);
            let (start, len) = match kind {
                0 => (0, nb),
                1 => (nb, ng),
                2 => (nb + ng, nb),
                _ => (2 * nb + ng, ng),
            };
            perm.extend((start..start + len).map(|k| co[i] + k));
        }
    }

    let d: Vec<f64> = (0..st).flat_map(|i| ocp.d(i).to_vec()).collect();
    let m: Vec<f64> = (0..st).flat_map(|i| ocp.m(i).to_vec()).collect();
    for (p, &q) in perm.iter().enumerate() {
        qp.d[p] = d[q];
        qp.m[p] = m[q];
    }

    (qp, perm)
}

#[test]
fn test_dynamics_residual() {
    let dim = OcpQpDim::new(&[2, 2], &[1, 0], &[0, 0], &[0, 0], &[0, 0], &[0, 0]).unwrap();
    let mut qp = OcpQp::<f64>::new(&dim).unwrap();

    // A = [1 0.1; 0 1], B = [0; 0.1]
    qp.set("A", 0, &[1., 0., 0.1, 1.]).unwrap();
    qp.set("B", 0, &[0., 0.1]).unwrap();
    qp.set("b", 0, &[0.5, -0.5]).unwrap();

    let ux = [3., 1., 2., 4., 5.];
    let pi = [1., 1.];
    let it = OcpQpIterate {
        ux: &ux,
        pi: &pi,
        lam: &[],
        t: &[],
    };
    let mut res = OcpQpResiduals::new(&dim);
    compute_ocp_residuals(&qp, &it, &mut res).unwrap();

    assert_close(&res.res_b, &[4. - 1.2 - 0.5, 5. - 0.3 - 2. + 0.5]);
    // [B'pi; A'pi] at stage 0, -pi at stage 1
    assert_close(&res.res_g, &[0.1, 1., 1.1, -1., -1.]);
    assert_eq!(res.mu, 0.);
}

#[test]
fn test_soft_bound() {
    // one state bound softened by a single slack pair
    let dim = OcpQpDim::new(&[2], &[0], &[0], &[1], &[0], &[1]).unwrap();
    let mut qp = OcpQp::<f64>::new(&dim).unwrap();
    qp.set("Q", 0, &[1., 0., 0., 1.]).unwrap();
    qp.set_index(OcpQpField::Idxb, 0, &[0]).unwrap();
    qp.set_index(OcpQpField::Idxs, 0, &[0]).unwrap();
    qp.set("lb", 0, &[-1.]).unwrap();
    qp.set("ub", 0, &[1.]).unwrap();
    qp.set("Zl", 0, &[2.]).unwrap();
    qp.set("Zu", 0, &[3.]).unwrap();
    qp.set("zl", 0, &[0.5]).unwrap();
    qp.set("zu", 0, &[0.25]).unwrap();

    // [x0, x1, sl, su]
    let ux = [0.5, 0., 0.1, 0.2];
    // [lb, ub, ls, us]
    let lam = [0.4, 0.1, 0.3, 0.2];
    let t = [1., 1., 1., 1.];
    let it = OcpQpIterate {
        ux: &ux,
        pi: &[],
        lam: &lam,
        t: &t,
    };
    let mut res = OcpQpResiduals::new(&dim);
    res.update(&qp, &it).unwrap();

    assert_close(
        &res.res_g,
        &[
            0.5 + 0.4 - 0.1,
            0.,
            2. * 0.1 + 0.5 + 0.4 + 0.3,
            3. * 0.2 + 0.25 + 0.1 + 0.2,
        ],
    );
    assert_close(
        &res.res_d,
        &[
            -(0.5 + 0.1) - 1. + 1.,
            -(0.5 - 0.2) + 1. - 1.,
            -0.1 + 0. + 1.,
            -0.2 + 0. + 1.,
        ],
    );
    assert_close(&res.res_m, &lam);
    assert!((res.mu - 0.25).abs() < TOL);

    let norms = res.norms();
    assert!((norms.res_g - 1.4).abs() < TOL);
    assert!(!norms.converged(&ResidualTolerances::default()));
}

#[test]
fn test_general_constraint_rows() {
    // single stage, -1 <= x0 + 2 x1 <= 1
    let dim = OcpQpDim::new(&[2], &[0], &[0], &[0], &[1], &[0]).unwrap();
    let mut qp = OcpQp::<f64>::new(&dim).unwrap();
    qp.set("C", 0, &[1., 2.]).unwrap();
    qp.set("lg", 0, &[-1.]).unwrap();
    qp.set("ug", 0, &[1.]).unwrap();

    let ux = [0.5, 0.25];
    let lam = [0.5, 2.0];
    let t = [0.1, 0.2];
    let it = OcpQpIterate {
        ux: &ux,
        pi: &[],
        lam: &lam,
        t: &t,
    };
    let mut res = OcpQpResiduals::new(&dim);
    res.update(&qp, &it).unwrap();

    // C'(lam_lg - lam_ug) = [-1.5, -3]
    assert_close(&res.res_g, &[-1.5, -3.]);
    assert_close(&res.res_d, &[-1. - 1. + 0.1, -1. + 1. - 0.2]);
    assert!((res.mu - 0.225).abs() < TOL);
}

#[test]
fn test_exact_slacks_soft_bound() {
    let dim = OcpQpDim::new(&[2], &[0], &[0], &[1], &[0], &[1]).unwrap();
    let mut qp = OcpQp::<f64>::new(&dim).unwrap();
    qp.set_index(OcpQpField::Idxb, 0, &[0]).unwrap();
    qp.set_index(OcpQpField::Idxs, 0, &[0]).unwrap();
    qp.set("lb", 0, &[-1.]).unwrap();
    qp.set("ub", 0, &[1.]).unwrap();

    // x0 = 0.5 softened by sl = 0.1 below and su = 0.2 above
    let ux = [0.5, 0., 0.1, 0.2];
    let t = [0.5 + 0.1 + 1., 1. - (0.5 - 0.2), 0.1, 0.2];
    let it = OcpQpIterate {
        ux: &ux,
        pi: &[],
        lam: &[0.; 4],
        t: &t,
    };
    let mut res = OcpQpResiduals::new(&dim);
    res.update(&qp, &it).unwrap();

    assert_close(&res.res_d, &[0.; 4]);
    assert!(res.norms().res_d < TOL);
}

#[test]
fn test_resize_split_keeps_workspace() {
    let dim = OcpQpDim::new(&[1, 1], &[1, 0], &[1, 0], &[0, 1], &[0, 0], &[0, 0]).unwrap();
    let mut qp = OcpQp::<f64>::new(&dim).unwrap();
    let mut res = OcpQpResiduals::new(&dim);

    // move the stage 0 bound from the input to the state, nb unchanged
    qp.resize_bounds(&[0, 0], &[1, 1]).unwrap();
    qp.set_index(OcpQpField::Idxb, 0, &[1]).unwrap();
    qp.set_index(OcpQpField::Idxb, 1, &[0]).unwrap();
    for i in 0..2 {
        qp.set("lb", i, &[-1.]).unwrap();
        qp.set("ub", i, &[1.]).unwrap();
    }

    // [u0, x0, x1]
    let ux = [0.25, 0.5, -0.5];
    let t = [1.5, 0.5, 0.5, 1.5];
    let it = OcpQpIterate {
        ux: &ux,
        pi: &[0.],
        lam: &[0.; 4],
        t: &t,
    };
    res.update(&qp, &it).unwrap();

    assert_close(&res.res_d, &[0.; 4]);
    assert_close(&res.res_b, &[-0.5]);
}

#[test]
fn test_resize_rejects_dangling_slack() {
    let dim = OcpQpDim::new(&[2], &[0], &[0], &[2], &[0], &[1]).unwrap();
    let mut qp = OcpQp::<f64>::new(&dim).unwrap();
    qp.set_index(OcpQpField::Idxb, 0, &[0, 1]).unwrap();
    qp.set_index(OcpQpField::Idxs, 0, &[1]).unwrap();

    // the softened row would no longer exist
    assert_eq!(
        qp.resize_bounds(&[0], &[1]),
        Err(QpError::IndexOutOfRange { index: 1, limit: 1 })
    );
    assert_eq!(qp.dim().nb, vec![2]);
    assert_eq!(qp.d(0).len(), 6);

    qp.set_index(OcpQpField::Idxs, 0, &[0]).unwrap();
    qp.resize_bounds(&[0], &[1]).unwrap();
    qp.set_index(OcpQpField::Idxb, 0, &[1]).unwrap();

    let mut res = OcpQpResiduals::new(qp.dim());
    let it = OcpQpIterate {
        ux: &[0.; 4],
        pi: &[],
        lam: &[1.; 4],
        t: &[1.; 4],
    };
    res.update(&qp, &it).unwrap();
    assert_eq!(res.mu, 1.);
}

#[test]
fn test_unset_index_array_is_an_error() {
    // index arrays of a dirty block keep their garbage after bind
    let dim = OcpQpDim::new(&[2], &[0], &[0], &[1], &[0], &[0]).unwrap();
    let mem = vec![0xffu8; memsize::<f64>(&dim)];
    let qp = OcpQp::<f64>::from_memory(&dim, mem).unwrap();

    let it = OcpQpIterate {
        ux: &[0.; 2],
        pi: &[],
        lam: &[0.; 2],
        t: &[0.; 2],
    };
    let mut res = OcpQpResiduals::new(&dim);
    assert_eq!(
        res.update(&qp, &it),
        Err(QpError::IndexOutOfRange {
            index: usize::MAX,
            limit: 2
        })
    );
}

proptest! {
    #[test]
    fn matches_flattened_dense_qp(case in flatten_case(hard_dim())) {
        let (data, ux, pi, lam, t) = case;
        let dim = hard_dim();
        let ocp = random_qp(&dim, &data);
        let (dense, perm) = flatten(&ocp);

        let mut ocp_res = OcpQpResiduals::new(&dim);
        let it = OcpQpIterate { ux: &ux, pi: &pi, lam: &lam, t: &t };
        compute_ocp_residuals(&ocp, &it, &mut ocp_res).unwrap();

        let dlam: Vec<f64> = perm.iter().map(|&q| lam[q]).collect();
        let dt: Vec<f64> = perm.iter().map(|&q| t[q]).collect();
        let mut dense_res = DenseQpResiduals::new(dense.dim);
        let dit = DenseQpIterate { v: &ux, pi: &pi, lam: &dlam, t: &dt };
        compute_dense_residuals(&dense, &dit, &mut dense_res).unwrap();

        prop_assert!(ocp_res.res_g.norm_inf_diff(&dense_res.res_g) < 1e-10);
        prop_assert!(ocp_res.res_b.norm_inf_diff(&dense_res.res_b) < 1e-10);

        let res_d: Vec<f64> = perm.iter().map(|&q| ocp_res.res_d[q]).collect();
        let res_m: Vec<f64> = perm.iter().map(|&q| ocp_res.res_m[q]).collect();
        prop_assert!(res_d.norm_inf_diff(&dense_res.res_d) < 1e-10);
        prop_assert!(res_m.norm_inf_diff(&dense_res.res_m) < 1e-10);
        prop_assert!((ocp_res.mu - dense_res.mu).abs() < 1e-10);
    }
}
