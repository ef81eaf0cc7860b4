//! Rigid(+scale) 3D transforms
//!
//! A [`Pose`] is a 4x4 homogeneous transform in the column-vector convention:
//! translation lives in the fourth column and `world = matrix * local`.
//! The 3x3 block stays a per-axis-scaled rotation after every mutation;
//! incremental rotations are applied in the body frame.

use std::str::FromStr;

use glam::{DMat3, DMat4, DQuat, DVec3, DVec4, EulerRot};
use serde::{Deserialize, Serialize};

use crate::constants::{ANGLE_EPSILON, DET_EPSILON, LENGTH_EPSILON, POSE_EPSILON};

/// An angle with explicit units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Angle {
    Degrees(f64),
    Radians(f64),
}

impl Angle {
    /// Value in radians
    pub fn radians(self) -> f64 {
        match self {
            Angle::Degrees(d) => d.to_radians(),
            Angle::Radians(r) => r,
        }
    }

    /// Value in degrees
    pub fn degrees(self) -> f64 {
        match self {
            Angle::Degrees(d) => d,
            Angle::Radians(r) => r.to_degrees(),
        }
    }
}

/// Frame a translation delta is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// Delta is rotated (and scaled) by the pose's orientation first
    Local,
    /// Delta is added directly in the parent frame
    Parent,
}

/// A rotation axis, always unit length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis(DVec3);

impl Axis {
    pub const X: Axis = Axis(DVec3::X);
    pub const Y: Axis = Axis(DVec3::Y);
    pub const Z: Axis = Axis(DVec3::Z);

    /// Build an axis from an arbitrary vector, normalizing it
    pub fn from_vector(v: DVec3) -> Result<Axis, PoseError> {
        if !v.is_finite() {
            return Err(PoseError::InvalidShape(format!(
                "axis vector is not finite: {v}"
            )));
        }
        let length = v.length();
        if length < LENGTH_EPSILON {
            return Err(PoseError::InvalidShape(
                "axis vector has zero length".into(),
            ));
        }
        Ok(Axis(v / length))
    }

    /// Unit vector of this axis
    pub fn vector(&self) -> DVec3 {
        self.0
    }
}

impl FromStr for Axis {
    type Err = PoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            "z" | "Z" => Ok(Axis::Z),
            _ => Err(PoseError::InvalidShape(format!("unknown axis '{s}'"))),
        }
    }
}

/// Position and orientation (plus per-axis scale) as a homogeneous transform
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pose {
    matrix: DMat4,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Zero translation, zero rotation, unit scale
    pub const IDENTITY: Pose = Pose {
        matrix: DMat4::IDENTITY,
    };

    /// Pose at a position with no rotation
    pub fn from_position(position: DVec3) -> Self {
        Self {
            matrix: DMat4::from_translation(position),
        }
    }

    /// Pose at (x, y, z) with no rotation
    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self::from_position(DVec3::new(x, y, z))
    }

    /// Pose at the origin with the given orientation
    pub fn from_rotation(rotation: DQuat) -> Self {
        Self {
            matrix: DMat4::from_quat(rotation),
        }
    }

    /// Pose from explicit position, rotation and per-axis scale
    pub fn from_parts(position: DVec3, rotation: DQuat, scale: DVec3) -> Self {
        Self {
            matrix: DMat4::from_scale_rotation_translation(scale, rotation, position),
        }
    }

    /// Pose from a raw homogeneous matrix
    ///
    /// The matrix must be finite and affine (bottom row `0 0 0 1`).
    pub fn from_matrix(matrix: DMat4) -> Result<Self, PoseError> {
        if !matrix.is_finite() {
            return Err(PoseError::InvalidShape(
                "matrix contains non-finite entries".into(),
            ));
        }
        if !matrix.row(3).abs_diff_eq(DVec4::W, POSE_EPSILON) {
            return Err(PoseError::InvalidShape(format!(
                "bottom row must be [0 0 0 1], got {}",
                matrix.row(3)
            )));
        }
        Ok(Self { matrix })
    }

    /// The underlying homogeneous matrix
    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    /// Translation component
    pub fn position(&self) -> DVec3 {
        self.matrix.w_axis.truncate()
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.matrix.w_axis = position.extend(1.0);
    }

    pub fn x(&self) -> f64 {
        self.matrix.w_axis.x
    }

    pub fn y(&self) -> f64 {
        self.matrix.w_axis.y
    }

    pub fn z(&self) -> f64 {
        self.matrix.w_axis.z
    }

    /// Orientation with scale factored out
    pub fn rotation(&self) -> DQuat {
        let (_, rotation, _) = self.matrix.to_scale_rotation_translation();
        rotation
    }

    /// Orientation as intrinsic ZXY Euler angles, in radians
    pub fn rotation_euler(&self) -> (f64, f64, f64) {
        self.rotation().to_euler(EulerRot::ZXY)
    }

    /// Orientation as a 3x3 rotation matrix, scale factored out
    pub fn rotation_matrix(&self) -> DMat3 {
        DMat3::from_quat(self.rotation())
    }

    /// Per-axis scale, as the norm of each basis column
    pub fn scale(&self) -> DVec3 {
        DVec3::new(
            self.matrix.x_axis.truncate().length(),
            self.matrix.y_axis.truncate().length(),
            self.matrix.z_axis.truncate().length(),
        )
    }

    /// Express `child` (given in this pose's frame) in this pose's parent frame
    ///
    /// Associative, not commutative.
    pub fn compose(&self, child: &Pose) -> Pose {
        Pose {
            matrix: self.matrix * child.matrix,
        }
    }

    /// The unique pose that composes with this one to identity
    pub fn inverse(&self) -> Result<Pose, PoseError> {
        let det = self.matrix.determinant();
        if det.abs() < DET_EPSILON {
            return Err(PoseError::SingularTransform(format!(
                "matrix is not invertible (determinant {det:e})"
            )));
        }
        Ok(Pose {
            matrix: self.matrix.inverse(),
        })
    }

    /// Map a point from this pose's frame to its parent frame
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.matrix.transform_point3(point)
    }

    /// Map a direction from this pose's frame to its parent frame
    pub fn transform_vector(&self, vector: DVec3) -> DVec3 {
        self.matrix.transform_vector3(vector)
    }

    /// Move the pose by `delta`, expressed in the given frame
    pub fn translate(&mut self, delta: DVec3, frame: Frame) -> &mut Self {
        let step = match frame {
            Frame::Local => self.matrix.transform_vector3(delta),
            Frame::Parent => delta,
        };
        self.matrix.w_axis += step.extend(0.0);
        self
    }

    /// Value-returning variant of [`translate`](Self::translate)
    pub fn translated(&self, delta: DVec3, frame: Frame) -> Pose {
        let mut pose = *self;
        pose.translate(delta, frame);
        pose
    }

    /// Rotate the orientation in the body frame
    pub fn rotate(&mut self, axis: Axis, angle: Angle) -> &mut Self {
        let (scale, rotation, translation) = self.matrix.to_scale_rotation_translation();
        let step = DQuat::from_axis_angle(axis.vector(), angle.radians());
        self.matrix = DMat4::from_scale_rotation_translation(scale, rotation * step, translation);
        self
    }

    /// Value-returning variant of [`rotate`](Self::rotate)
    pub fn rotated(&self, axis: Axis, angle: Angle) -> Pose {
        let mut pose = *self;
        pose.rotate(axis, angle);
        pose
    }

    /// Move along a circular arc.
    ///
    /// `delta` is the arc length vector in the local frame and `angle` the
    /// subtended angle about `axis`; the signed radius is `|delta| / angle`.
    /// A zero angle degenerates to straight-line motion and a zero `delta`
    /// to a pure rotation. `delta` parallel to `axis` leaves the arc plane
    /// undefined and is an error.
    pub fn arc_move(
        &mut self,
        angle: Angle,
        delta: DVec3,
        axis: Axis,
    ) -> Result<&mut Self, PoseError> {
        let theta = angle.radians();
        if theta.abs() < ANGLE_EPSILON {
            return Ok(self.translate(delta, Frame::Local));
        }
        let length = delta.length();
        if length < LENGTH_EPSILON {
            return Ok(self.rotate(axis, angle));
        }
        let tangent = delta / length;
        let normal = axis.vector().cross(tangent);
        if normal.length() < LENGTH_EPSILON {
            return Err(PoseError::SingularTransform(format!(
                "arc direction {delta} is parallel to the rotation axis"
            )));
        }
        let radius = length / theta;
        let chord =
            tangent * (radius * theta.sin()) + normal * (radius * (1.0 - theta.cos()));
        self.translate(chord, Frame::Local);
        self.rotate(axis, angle);
        Ok(self)
    }

    /// Reorient so the given body axis points at `target` (in the parent frame)
    ///
    /// Applies the minimal rotation; position and scale are preserved.
    /// Errors if `target` coincides with the current position.
    pub fn look_at(&mut self, target: DVec3, axis: Axis) -> Result<&mut Self, PoseError> {
        let offset = target - self.position();
        let distance = offset.length();
        if distance < LENGTH_EPSILON {
            return Err(PoseError::SingularTransform(
                "look-at target coincides with the pose position".into(),
            ));
        }
        let (scale, rotation, translation) = self.matrix.to_scale_rotation_translation();
        let current = rotation * axis.vector();
        let turn = DQuat::from_rotation_arc(current, offset / distance);
        self.matrix = DMat4::from_scale_rotation_translation(scale, turn * rotation, translation);
        Ok(self)
    }

    /// Element-wise matrix comparison within `tolerance`
    pub fn approx_eq(&self, other: &Pose, tolerance: f64) -> bool {
        self.matrix.abs_diff_eq(other.matrix, tolerance)
    }

    /// True if this pose is the identity within [`POSE_EPSILON`]
    pub fn is_identity(&self) -> bool {
        self.matrix.abs_diff_eq(DMat4::IDENTITY, POSE_EPSILON)
    }
}

/// Pose-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum PoseError {
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("singular transform: {0}")]
    SingularTransform(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_identity() {
        let pose = Pose::IDENTITY;
        assert_eq!(pose.position(), DVec3::ZERO);
        assert!(pose.scale().abs_diff_eq(DVec3::ONE, TOL));
        assert!(pose.is_identity());
    }

    #[test]
    fn test_compose_inverse_is_identity() {
        let pose = Pose::from_parts(
            DVec3::new(1.0, -2.0, 3.0),
            DQuat::from_axis_angle(DVec3::new(1.0, 1.0, 0.0).normalize(), 0.7),
            DVec3::new(2.0, 1.0, 0.5),
        );
        let inv = pose.inverse().unwrap();
        assert!(pose.compose(&inv).is_identity());
        assert!(inv.compose(&pose).is_identity());
    }

    #[test]
    fn test_compose_associative() {
        let a = Pose::from_parts(
            DVec3::new(1.0, 0.0, 0.0),
            DQuat::from_axis_angle(DVec3::Z, 0.3),
            DVec3::ONE,
        );
        let b = Pose::from_parts(
            DVec3::new(0.0, 2.0, 0.0),
            DQuat::from_axis_angle(DVec3::X, -1.1),
            DVec3::ONE,
        );
        let c = Pose::from_parts(
            DVec3::new(0.0, 0.0, -3.0),
            DQuat::from_axis_angle(DVec3::Y, 2.4),
            DVec3::ONE,
        );
        let left = a.compose(&b).compose(&c);
        let right = a.compose(&b.compose(&c));
        assert!(left.approx_eq(&right, TOL));
    }

    #[test]
    fn test_singular_inverse_rejected() {
        let flat = Pose::from_parts(DVec3::ZERO, DQuat::IDENTITY, DVec3::new(1.0, 0.0, 1.0));
        assert!(matches!(
            flat.inverse(),
            Err(PoseError::SingularTransform(_))
        ));
    }

    #[test]
    fn test_rotate_then_local_translate() {
        // 90 degrees about z, then 1 unit along the rotated local x-axis
        let mut pose = Pose::IDENTITY;
        pose.rotate(Axis::Z, Angle::Degrees(90.0))
            .translate(DVec3::X, Frame::Local);
        assert!(pose.position().abs_diff_eq(DVec3::new(0.0, 1.0, 0.0), TOL));
    }

    #[test]
    fn test_parent_frame_translate_ignores_rotation() {
        let mut pose = Pose::IDENTITY;
        pose.rotate(Axis::Z, Angle::Degrees(90.0))
            .translate(DVec3::X, Frame::Parent);
        assert!(pose.position().abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), TOL));
    }

    #[test]
    fn test_arc_move_matches_circle() {
        // Quarter turn: radius r = s / theta, endpoint at (r*sin, r*(1-cos))
        let mut pose = Pose::IDENTITY;
        pose.arc_move(Angle::Degrees(90.0), DVec3::new(3.0, 0.0, 0.0), Axis::Z)
            .unwrap();
        let radius = 3.0 / std::f64::consts::FRAC_PI_2;
        assert!(pose
            .position()
            .abs_diff_eq(DVec3::new(radius, radius, 0.0), TOL));
        let (yaw, _, _) = pose.rotation_euler();
        assert!((yaw - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_arc_move_round_trip() {
        let mut pose = Pose::from_xyz(0.5, -1.0, 2.0);
        pose.rotate(Axis::Y, Angle::Degrees(30.0));
        let start = pose;
        pose.arc_move(Angle::Degrees(45.0), DVec3::new(1.5, 0.0, 0.0), Axis::Z)
            .unwrap();
        pose.arc_move(Angle::Degrees(-45.0), DVec3::new(-1.5, 0.0, 0.0), Axis::Z)
            .unwrap();
        assert!(pose.approx_eq(&start, 1e-6));
    }

    #[test]
    fn test_arc_move_subdivision() {
        let mut whole = Pose::IDENTITY;
        whole
            .arc_move(Angle::Degrees(-90.0), DVec3::new(3.0, 0.0, 0.0), Axis::Z)
            .unwrap();

        let steps = 20;
        let mut split = Pose::IDENTITY;
        for _ in 0..steps {
            split
                .arc_move(
                    Angle::Degrees(-90.0 / steps as f64),
                    DVec3::new(3.0 / steps as f64, 0.0, 0.0),
                    Axis::Z,
                )
                .unwrap();
        }
        assert!(split.approx_eq(&whole, 1e-6));
    }

    #[test]
    fn test_arc_move_zero_angle_is_straight() {
        let mut pose = Pose::IDENTITY;
        pose.arc_move(Angle::Radians(0.0), DVec3::new(2.0, 0.0, 0.0), Axis::Z)
            .unwrap();
        assert!(pose.position().abs_diff_eq(DVec3::new(2.0, 0.0, 0.0), TOL));
        assert!(pose.rotation().abs_diff_eq(DQuat::IDENTITY, TOL));
    }

    #[test]
    fn test_arc_move_axis_parallel_rejected() {
        let mut pose = Pose::IDENTITY;
        let result = pose.arc_move(Angle::Degrees(10.0), DVec3::new(0.0, 0.0, 1.0), Axis::Z);
        assert!(matches!(result, Err(PoseError::SingularTransform(_))));
    }

    #[test]
    fn test_look_at() {
        let mut pose = Pose::IDENTITY;
        pose.look_at(DVec3::new(0.0, 0.0, 5.0), Axis::X).unwrap();
        pose.translate(DVec3::X, Frame::Local);
        assert!(pose.position().abs_diff_eq(DVec3::new(0.0, 0.0, 1.0), TOL));
    }

    #[test]
    fn test_look_at_degenerate_target() {
        let mut pose = Pose::from_xyz(1.0, 2.0, 3.0);
        let result = pose.look_at(DVec3::new(1.0, 2.0, 3.0), Axis::X);
        assert!(matches!(result, Err(PoseError::SingularTransform(_))));
    }

    #[test]
    fn test_from_matrix_rejects_bad_bottom_row() {
        let mut matrix = DMat4::IDENTITY;
        matrix.x_axis.w = 0.5;
        assert!(matches!(
            Pose::from_matrix(matrix),
            Err(PoseError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_from_matrix_rejects_nan() {
        let mut matrix = DMat4::IDENTITY;
        matrix.y_axis.y = f64::NAN;
        assert!(matches!(
            Pose::from_matrix(matrix),
            Err(PoseError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_scale_accessor() {
        let pose = Pose::from_parts(DVec3::ZERO, DQuat::from_axis_angle(DVec3::Z, 0.4), DVec3::new(2.0, 3.0, 0.5));
        assert!(pose.scale().abs_diff_eq(DVec3::new(2.0, 3.0, 0.5), TOL));
    }

    #[test]
    fn test_axis_parsing_and_vectors() {
        assert_eq!("x".parse::<Axis>().unwrap().vector(), DVec3::X);
        assert_eq!("Z".parse::<Axis>().unwrap().vector(), DVec3::Z);
        assert!("w".parse::<Axis>().is_err());
        let diagonal = Axis::from_vector(DVec3::new(3.0, 0.0, 4.0)).unwrap();
        assert!((diagonal.vector().length() - 1.0).abs() < TOL);
        assert!(Axis::from_vector(DVec3::ZERO).is_err());
    }

    #[test]
    fn test_angle_units() {
        assert!((Angle::Degrees(180.0).radians() - std::f64::consts::PI).abs() < TOL);
        assert!((Angle::Radians(std::f64::consts::PI).degrees() - 180.0).abs() < TOL);
    }

    #[test]
    fn test_full_turn_stability() {
        let mut pose = Pose::IDENTITY;
        pose.rotate(Axis::Z, Angle::Degrees(360.0));
        assert!(pose.approx_eq(&Pose::IDENTITY, 1e-9));
    }
}
