//! 6x6 pose/twist covariance handling.
//!
//! Pose and twist covariances are handled as four 3x3 blocks:
//! ```text
//! | Pxx  Pxy |   rows/cols 0-2: translational (or linear) block
//! | Pyx  Pyy |   rows/cols 3-5: rotational (or angular) block
//! ```
use itertools::iproduct;
use nalgebra::{Matrix3, Matrix6};

/// Number of entries in a packed 6x6 lower-diagonal covariance
pub const PACKED_COVARIANCE_LEN: usize = 21;

const WIDTH: usize = 6;

/// Lower-diagonal, row-major packed symmetric 6x6 matrix, as received from the sensor:
/// entry (i, j) with i >= j is stored at index `(i * i + i) / 2 + j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedCovariance6(pub [f32; PACKED_COVARIANCE_LEN]);

impl Default for PackedCovariance6 {
    fn default() -> Self {
        Self([0.0; PACKED_COVARIANCE_LEN])
    }
}

impl From<[f32; PACKED_COVARIANCE_LEN]> for PackedCovariance6 {
    fn from(values: [f32; PACKED_COVARIANCE_LEN]) -> Self {
        Self(values)
    }
}

/// Unpacks a [PackedCovariance6] into a full symmetric matrix.
pub fn unpack_lower_diagonal(packed: &PackedCovariance6) -> Matrix6<f64> {
    let mut full = Matrix6::zeros();
    for (i, j) in iproduct!(0..WIDTH, 0..WIDTH) {
        let (row, col) = if i >= j { (i, j) } else { (j, i) };
        full[(i, j)] = packed.0[(row * row + row) / 2 + col] as f64;
    }
    full
}

/// Re-expresses a 6x6 covariance after a change of coordinates where
/// the first three coordinates are rotated by `r1` and the last three by `r2`:
/// ```text
/// |R1  0 | |Pxx  Pyx'| |R1' 0  |   |R1 Pxx R1'  R1 Pyx' R2'|
/// |0   R2| |Pyx  Pyy | |0   R2'| = |R2 Pyx R1'  R2 Pyy R2' |
/// ```
/// Only the lower-left off diagonal block of `p_in` is read.
/// The output upper triangle mirrors its lower triangle: the result is exactly symmetric.
pub fn transform_6x6(p_in: &Matrix6<f64>, r1: &Matrix3<f64>, r2: &Matrix3<f64>) -> Matrix6<f64> {
    let pxx = p_in.fixed_view::<3, 3>(0, 0).into_owned();
    let pyx = p_in.fixed_view::<3, 3>(3, 0).into_owned();
    let pyy = p_in.fixed_view::<3, 3>(3, 3).into_owned();

    let pxx_out = r1 * pxx * r1.transpose();
    let pyx_out = r2 * pyx * r1.transpose();
    let pyy_out = r2 * pyy * r2.transpose();

    let mut p_out = Matrix6::zeros();
    p_out.fixed_view_mut::<3, 3>(0, 0).copy_from(&pxx_out);
    p_out.fixed_view_mut::<3, 3>(3, 0).copy_from(&pyx_out);
    p_out.fixed_view_mut::<3, 3>(3, 3).copy_from(&pyy_out);
    p_out.fill_upper_triangle_with_lower_triangle();
    p_out
}

/// Pose covariance as expected downstream, from the sensor packed pose covariance.
///
/// The sensor orders pose states as [attitude, position], downstream expects
/// [position, attitude]:
/// ```text
/// |A  C'|    |B  C |
/// |C  B | => |C' A |
/// ```
pub fn pose_covariance_from_sensor(packed: &PackedCovariance6) -> Matrix6<f64> {
    let p_in = unpack_lower_diagonal(packed);
    let mut p_out = Matrix6::zeros();
    p_out
        .fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&p_in.fixed_view::<3, 3>(3, 3));
    p_out
        .fixed_view_mut::<3, 3>(3, 3)
        .copy_from(&p_in.fixed_view::<3, 3>(0, 0));
    p_out
        .fixed_view_mut::<3, 3>(0, 3)
        .copy_from(&p_in.fixed_view::<3, 3>(3, 0));
    p_out
        .fixed_view_mut::<3, 3>(3, 0)
        .copy_from(&p_in.fixed_view::<3, 3>(0, 3));
    p_out
}

/// Twist covariance from the sensor packed twist covariance.
/// [linear velocity, angular rate] order already matches.
pub fn twist_covariance_from_sensor(packed: &PackedCovariance6) -> Matrix6<f64> {
    unpack_lower_diagonal(packed)
}

/// Row-major flattening, as published in pose/twist messages.
pub fn to_row_major(p: &Matrix6<f64>) -> [f64; WIDTH * WIDTH] {
    let mut out = [0.0; WIDTH * WIDTH];
    for (i, j) in iproduct!(0..WIDTH, 0..WIDTH) {
        out[i * WIDTH + j] = p[(i, j)];
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::quaternion_to_rotation_matrix;
    use nalgebra::Quaternion;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    fn random_packed(rng: &mut SmallRng) -> PackedCovariance6 {
        let mut packed = PackedCovariance6::default();
        for value in packed.0.iter_mut() {
            *value = rng.random_range(-10.0..10.0);
        }
        packed
    }

    fn random_rotation(rng: &mut SmallRng) -> Matrix3<f64> {
        let q = Quaternion::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        quaternion_to_rotation_matrix(&(q / q.norm()))
    }

    fn is_symmetric(p: &Matrix6<f64>) -> bool {
        iproduct!(0..6, 0..6).all(|(i, j)| p[(i, j)] == p[(j, i)])
    }

    #[test]
    fn unpack_layout() {
        let mut packed = PackedCovariance6::default();
        for (k, value) in packed.0.iter_mut().enumerate() {
            *value = k as f32;
        }
        let full = unpack_lower_diagonal(&packed);

        // first rows by hand
        assert_eq!(full[(0, 0)], 0.0);
        assert_eq!(full[(1, 0)], 1.0);
        assert_eq!(full[(1, 1)], 2.0);
        assert_eq!(full[(2, 0)], 3.0);
        assert_eq!(full[(2, 2)], 5.0);
        assert_eq!(full[(5, 0)], 15.0);
        assert_eq!(full[(5, 5)], 20.0);
        assert_eq!(full[(0, 5)], 15.0);
        assert!(is_symmetric(&full));
    }

    #[test]
    fn unpack_is_always_symmetric() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..1000 {
            let full = unpack_lower_diagonal(&random_packed(&mut rng));
            assert!(is_symmetric(&full));
        }
    }

    #[test]
    fn identity_transform() {
        let mut rng = SmallRng::seed_from_u64(2);
        let identity = Matrix3::identity();
        for _ in 0..100 {
            let p = unpack_lower_diagonal(&random_packed(&mut rng));
            assert_eq!(transform_6x6(&p, &identity, &identity), p);
        }
    }

    #[test]
    fn transform_is_block_diagonal_congruence() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            let p = unpack_lower_diagonal(&random_packed(&mut rng));
            let (r1, r2) = (random_rotation(&mut rng), random_rotation(&mut rng));

            let mut t = Matrix6::zeros();
            t.fixed_view_mut::<3, 3>(0, 0).copy_from(&r1);
            t.fixed_view_mut::<3, 3>(3, 3).copy_from(&r2);
            let expected = t * p * t.transpose();

            let p_out = transform_6x6(&p, &r1, &r2);
            assert!((p_out - expected).abs().max() < 1.0E-9);
            assert!(is_symmetric(&p_out));
        }
    }

    #[test]
    fn published_covariance_is_exactly_symmetric() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = unpack_lower_diagonal(&random_packed(&mut rng));
            let r = random_rotation(&mut rng);
            let flat = to_row_major(&transform_6x6(&p, &r, &r));
            for (i, j) in iproduct!(0..WIDTH, 0..WIDTH) {
                assert_eq!(flat[i * WIDTH + j], flat[j * WIDTH + i]);
            }
        }
    }

    #[test]
    fn transform_preserves_variance_positivity() {
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..100 {
            let mut packed = PackedCovariance6::default();
            for i in 0..6 {
                packed.0[(i * i + i) / 2 + i] = rng.random_range(0.0..5.0);
            }
            let p = unpack_lower_diagonal(&packed);
            let p_out = transform_6x6(&p, &random_rotation(&mut rng), &random_rotation(&mut rng));
            for i in 0..6 {
                assert!(p_out[(i, i)] >= -1.0E-12);
            }
            // rotations preserve each block trace
            let trace_in = p.fixed_view::<3, 3>(0, 0).trace();
            let trace_out = p_out.fixed_view::<3, 3>(0, 0).trace();
            assert!((trace_in - trace_out).abs() < 1.0E-9);
        }
    }

    #[test]
    fn pose_block_swap_permutation() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..1000 {
            let packed = random_packed(&mut rng);
            let p_in = unpack_lower_diagonal(&packed);
            let p_out = pose_covariance_from_sensor(&packed);

            for (i, j) in iproduct!(0..6, 0..6) {
                assert_eq!(p_out[(i, j)], p_in[((i + 3) % 6, (j + 3) % 6)]);
            }
            assert!(is_symmetric(&p_out));

            // upper-right block is the transpose of the lower-left block
            let upper_right = p_out.fixed_view::<3, 3>(0, 3).into_owned();
            let lower_left = p_out.fixed_view::<3, 3>(3, 0).into_owned();
            assert_eq!(upper_right, lower_left.transpose());
        }
    }

    #[test]
    fn pose_block_swap_known_values() {
        // attitude variances 1,2,3; position variances 10,20,30;
        // cov(pos_x, att_y) = 0.5
        let mut packed = PackedCovariance6::default();
        packed.0[0] = 1.0;
        packed.0[2] = 2.0;
        packed.0[5] = 3.0;
        packed.0[9] = 10.0;
        packed.0[14] = 20.0;
        packed.0[20] = 30.0;
        // (row 3 = pos_x, col 1 = att_y)
        packed.0[(3 * 3 + 3) / 2 + 1] = 0.5;

        let p = pose_covariance_from_sensor(&packed);
        assert_eq!(p.diagonal().as_slice(), &[10.0, 20.0, 30.0, 1.0, 2.0, 3.0]);
        // now (pos_x, att_y) = (0, 4)
        assert_eq!(p[(0, 4)], 0.5);
        assert_eq!(p[(4, 0)], 0.5);
    }

    #[test]
    fn twist_order_is_unchanged() {
        let mut rng = SmallRng::seed_from_u64(6);
        let packed = random_packed(&mut rng);
        assert_eq!(
            twist_covariance_from_sensor(&packed),
            unpack_lower_diagonal(&packed)
        );
    }

    #[test]
    fn row_major_flattening() {
        let mut p = Matrix6::zeros();
        p[(1, 4)] = 3.0;
        p[(4, 1)] = 7.0;
        let flat = to_row_major(&p);
        assert_eq!(flat[6 + 4], 3.0);
        assert_eq!(flat[4 * 6 + 1], 7.0);
    }

    #[test]
    fn nan_propagates() {
        let mut packed = PackedCovariance6::default();
        packed.0[0] = f32::NAN;
        let p = unpack_lower_diagonal(&packed);
        let r = random_rotation(&mut SmallRng::seed_from_u64(8));
        let p_out = transform_6x6(&p, &r, &r);
        assert!(p_out.fixed_view::<3, 3>(0, 0).iter().any(|v| v.is_nan()));

        let p_out = transform_6x6(&Matrix6::identity(), &Matrix3::from_element(f64::NAN), &r);
        assert!(p_out[(0, 0)].is_nan());
    }
}
