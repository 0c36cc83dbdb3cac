use log::debug;
use nalgebra::{Matrix3, Quaternion, Vector3};

use crate::{
    cfg::FrameSelection,
    constants::ECEF_TO_LLA_ITERATIONS,
    covariance::transform_6x6,
    frame::{FrameKind, FrameOutputs, FrameResult, NavContext, NavSample, ReferenceOrigin},
    math::{
        conjugate_rotate_vector, ecef_to_lla, lla_deg_to_rad, lla_to_ned, ned_to_enu,
        quaternion_compose, quaternion_conjugate, quaternion_ecef_to_ned, quaternion_ned_to_enu,
        quaternion_to_rotation_matrix, rotate_vector, rotation_ned_to_enu,
    },
    prelude::Epoch,
};

/// Quantities shared by all frames, computed once per [NavSample].
struct SampleGeometry {
    /// Body to ECEF rotation
    r_b2e: Matrix3<f64>,
    /// Geodetic position (rad, rad, m)
    lla_rad: Vector3<f64>,
    /// ECEF to NED attitude at current position
    q_e2n: Quaternion<f64>,
}

impl SampleGeometry {
    fn new(sample: &NavSample) -> Self {
        let lla_rad = ecef_to_lla(&sample.ecef_m, ECEF_TO_LLA_ITERATIONS);
        Self {
            r_b2e: quaternion_to_rotation_matrix(&sample.q_e2b),
            q_e2n: quaternion_ecef_to_ned(lla_rad[0], lla_rad[1]),
            lla_rad,
        }
    }
}

/// [FrameConverter] re-expresses [NavSample]s in the selected frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameConverter {
    selection: FrameSelection,
}

impl FrameConverter {
    pub fn new(selection: FrameSelection) -> Self {
        Self { selection }
    }

    /// Converts one [NavSample].
    /// ## Inputs
    /// - sample: [NavSample] to convert
    /// - origin: [ReferenceOrigin] snapshot; NED and ENU are not
    ///   produced while it is unknown
    /// - ctx: latest covariances and body rate, see [NavContext]
    /// - timestamp: attached to every produced [FrameResult]
    pub fn convert(
        &self,
        sample: &NavSample,
        origin: ReferenceOrigin,
        ctx: &NavContext,
        timestamp: Epoch,
    ) -> FrameOutputs {
        let geometry = SampleGeometry::new(sample);

        let ecef = if self.selection.ecef {
            Some(Self::ecef(sample, ctx, &geometry, timestamp))
        } else {
            None
        };

        if !self.selection.ned && !self.selection.enu {
            return FrameOutputs {
                ecef,
                ned: None,
                enu: None,
            };
        }

        if !origin.known {
            debug!(
                "{}:{:.3} - reference LLA not received yet: NED/ENU unavailable",
                sample.week, sample.time_of_week_s
            );
            return FrameOutputs {
                ecef,
                ned: None,
                enu: None,
            };
        }

        let ned = Self::ned(sample, origin, ctx, &geometry, timestamp);
        let enu = Self::enu_from_ned(&ned);

        FrameOutputs {
            ecef,
            ned: if self.selection.ned { Some(ned) } else { None },
            enu: if self.selection.enu { Some(enu) } else { None },
        }
    }

    fn ecef(
        sample: &NavSample,
        ctx: &NavContext,
        geometry: &SampleGeometry,
        timestamp: Epoch,
    ) -> FrameResult {
        let identity = Matrix3::identity();
        FrameResult {
            frame: FrameKind::Ecef,
            // Z is published negated
            position_m: Vector3::new(sample.ecef_m.x, sample.ecef_m.y, -sample.ecef_m.z),
            orientation: sample.q_e2b,
            linear_velocity_m_s: sample.ecef_velocity_m_s,
            angular_velocity_rad_s: rotate_vector(&sample.q_e2b, &sample.body_angular_rate_rad_s),
            pose_covariance: transform_6x6(&ctx.pose_covariance, &identity, &geometry.r_b2e),
            twist_covariance: transform_6x6(&ctx.twist_covariance, &identity, &geometry.r_b2e),
            timestamp,
        }
    }

    fn ned(
        sample: &NavSample,
        origin: ReferenceOrigin,
        ctx: &NavContext,
        geometry: &SampleGeometry,
        timestamp: Epoch,
    ) -> FrameResult {
        // NED to body attitude: R(q_n2b) = R_e2n . R_b2e
        let q_n2b = quaternion_compose(&quaternion_conjugate(&geometry.q_e2n), &sample.q_e2b);

        let r_b2n = quaternion_to_rotation_matrix(&q_n2b);
        let r_e2n = quaternion_to_rotation_matrix(&geometry.q_e2n).transpose();

        let ref_lla_rad = lla_deg_to_rad(&origin.lla_deg_deg_m);

        FrameResult {
            frame: FrameKind::Ned,
            position_m: lla_to_ned(&ref_lla_rad, &geometry.lla_rad),
            orientation: q_n2b,
            linear_velocity_m_s: conjugate_rotate_vector(
                &geometry.q_e2n,
                &sample.ecef_velocity_m_s,
            ),
            angular_velocity_rad_s: rotate_vector(&q_n2b, &sample.body_angular_rate_rad_s),
            pose_covariance: transform_6x6(&ctx.pose_covariance, &r_e2n, &r_b2n),
            twist_covariance: transform_6x6(&ctx.twist_covariance, &r_e2n, &r_b2n),
            timestamp,
        }
    }

    /// ENU is a fixed permutation of NED, so both stay consistent bit for bit.
    fn enu_from_ned(ned: &FrameResult) -> FrameResult {
        let r_n2enu = rotation_ned_to_enu();
        FrameResult {
            frame: FrameKind::Enu,
            position_m: ned_to_enu(&ned.position_m),
            orientation: quaternion_compose(&quaternion_ned_to_enu(), &ned.orientation),
            linear_velocity_m_s: ned_to_enu(&ned.linear_velocity_m_s),
            angular_velocity_rad_s: ned_to_enu(&ned.angular_velocity_rad_s),
            pose_covariance: transform_6x6(&ned.pose_covariance, &r_n2enu, &r_n2enu),
            twist_covariance: transform_6x6(&ned.twist_covariance, &r_n2enu, &r_n2enu),
            timestamp: ned.timestamp,
        }
    }
}
