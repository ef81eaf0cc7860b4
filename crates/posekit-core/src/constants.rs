//! Numeric tolerances shared across the crate

/// Tolerance for pose equality and identity checks
pub const POSE_EPSILON: f64 = 1e-9;

/// Determinant magnitude below which a transform is treated as singular
pub const DET_EPSILON: f64 = 1e-12;

/// Angle magnitude (radians) below which an arc degenerates to a straight line
pub const ANGLE_EPSILON: f64 = 1e-12;

/// Vector length below which a direction is undefined
pub const LENGTH_EPSILON: f64 = 1e-12;
