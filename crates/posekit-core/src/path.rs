//! Path construction from move/turn/line/arc directives
//!
//! A [`Path`] drives a cursor pose through a sequence of directives, emitting
//! [`Segment`]s anchored at explicit start and end poses. Every directive is
//! also recorded as a [`PathCommand`] for replay or editing. Arcs use the
//! same arc-length/angle parameterization as [`Pose::arc_move`].

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::constants::LENGTH_EPSILON;
use crate::part::Part;
use crate::pose::{Angle, Axis, Frame, Pose, PoseError};

/// A recorded path directive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PathCommand {
    /// Reposition the cursor without emitting a segment
    Move { pose: Pose },
    /// Rotate the cursor in place
    Turn { axis: Axis, angle: Angle },
    /// Straight segment to an absolute point, reorienting the tangent
    LineTo { point: DVec3 },
    /// Straight segment by a local-frame delta
    LineBy { delta: DVec3 },
    /// Circular arc by subtended angle and local arc-length vector
    Arc {
        angle: Angle,
        delta: DVec3,
        axis: Axis,
    },
    /// Circular arc by explicit radius and arc length
    ArcRadius {
        radius: f64,
        length: f64,
        axis: Axis,
    },
}

/// A concrete path segment anchored at start and end poses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Segment {
    Line {
        start: Pose,
        end: Pose,
    },
    Arc {
        start: Pose,
        end: Pose,
        angle: Angle,
        delta: DVec3,
        axis: Axis,
    },
}

impl Segment {
    pub fn start(&self) -> &Pose {
        match self {
            Segment::Line { start, .. } | Segment::Arc { start, .. } => start,
        }
    }

    pub fn end(&self) -> &Pose {
        match self {
            Segment::Line { end, .. } | Segment::Arc { end, .. } => end,
        }
    }

    /// Sample the segment into `steps + 1` points
    ///
    /// Lines interpolate linearly; arcs are replayed as `steps` incremental
    /// arc moves.
    pub fn to_polyline(&self, steps: usize) -> Result<Vec<DVec3>, PathError> {
        let steps = steps.max(1);
        match self {
            Segment::Line { start, end } => {
                let (a, b) = (start.position(), end.position());
                Ok((0..=steps)
                    .map(|i| a.lerp(b, i as f64 / steps as f64))
                    .collect())
            }
            Segment::Arc {
                start,
                angle,
                delta,
                axis,
                ..
            } => {
                let step_angle = Angle::Radians(angle.radians() / steps as f64);
                let step_delta = *delta / steps as f64;
                let mut cursor = *start;
                let mut points = vec![cursor.position()];
                for _ in 0..steps {
                    cursor.arc_move(step_angle, step_delta, *axis)?;
                    points.push(cursor.position());
                }
                Ok(points)
            }
        }
    }
}

/// Incremental path builder over a cursor pose
#[derive(Debug, Clone, Default)]
pub struct Path {
    cursor: Pose,
    segments: Vec<Segment>,
    commands: Vec<PathCommand>,
}

impl Path {
    /// Start a path at the identity pose
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a path at the given pose
    pub fn from_pose(pose: Pose) -> Self {
        Self {
            cursor: pose,
            segments: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Current cursor pose
    pub fn end_pose(&self) -> Pose {
        self.cursor
    }

    /// Segments emitted so far
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Directives recorded so far
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Reposition the cursor without emitting a segment
    pub fn move_to(&mut self, pose: Pose) -> &mut Self {
        self.cursor = pose;
        self.commands.push(PathCommand::Move { pose });
        self
    }

    /// Rotate the cursor in place
    pub fn turn(&mut self, axis: Axis, angle: Angle) -> &mut Self {
        self.cursor.rotate(axis, angle);
        self.commands.push(PathCommand::Turn { axis, angle });
        self
    }

    /// Straight segment to an absolute point, pointing the local x-axis
    /// along the segment
    pub fn line_to(&mut self, point: DVec3) -> Result<&mut Self, PathError> {
        let start = self.cursor;
        self.cursor.look_at(point, Axis::X)?;
        self.cursor.set_position(point);
        self.segments.push(Segment::Line {
            start,
            end: self.cursor,
        });
        self.commands.push(PathCommand::LineTo { point });
        Ok(self)
    }

    /// Straight segment by a delta in the cursor's local frame
    pub fn line_by(&mut self, delta: DVec3) -> &mut Self {
        let start = self.cursor;
        self.cursor.translate(delta, Frame::Local);
        self.segments.push(Segment::Line {
            start,
            end: self.cursor,
        });
        self.commands.push(PathCommand::LineBy { delta });
        self
    }

    /// Arc by subtended angle and local arc-length vector
    pub fn arc(
        &mut self,
        angle: Angle,
        delta: DVec3,
        axis: Axis,
    ) -> Result<&mut Self, PathError> {
        let start = self.cursor;
        self.cursor.arc_move(angle, delta, axis)?;
        self.segments.push(Segment::Arc {
            start,
            end: self.cursor,
            angle,
            delta,
            axis,
        });
        self.commands.push(PathCommand::Arc { angle, delta, axis });
        Ok(self)
    }

    /// Arc by explicit radius and arc length, along the cursor's forward
    /// direction
    pub fn arc_with_radius(
        &mut self,
        radius: f64,
        length: f64,
        axis: Axis,
    ) -> Result<&mut Self, PathError> {
        if radius.abs() < LENGTH_EPSILON {
            return Err(PathError::Pose(PoseError::SingularTransform(
                "arc radius must be non-zero".into(),
            )));
        }
        let angle = Angle::Radians(length / radius);
        let delta = DVec3::X * length;
        let start = self.cursor;
        self.cursor.arc_move(angle, delta, axis)?;
        self.segments.push(Segment::Arc {
            start,
            end: self.cursor,
            angle,
            delta,
            axis,
        });
        self.commands.push(PathCommand::ArcRadius {
            radius,
            length,
            axis,
        });
        Ok(self)
    }

    /// Sample the whole path into a single point sequence
    ///
    /// Each segment contributes `steps` intervals; shared joints between
    /// consecutive segments are emitted once.
    pub fn to_polyline(&self, steps: usize) -> Result<Vec<DVec3>, PathError> {
        if self.segments.is_empty() {
            return Err(PathError::EmptyPath);
        }
        let mut points = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            let sampled = segment.to_polyline(steps)?;
            let skip = if i == 0 { 0 } else { 1 };
            points.extend(sampled.into_iter().skip(skip));
        }
        Ok(points)
    }

    /// Convert the sampled path into a drawable polyline part
    pub fn into_part(self, steps: usize) -> Result<Part, PathError> {
        Ok(Part::polyline(self.to_polyline(steps)?))
    }
}

/// Path-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum PathError {
    #[error("path has no segments")]
    EmptyPath,
    #[error(transparent)]
    Pose(#[from] PoseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_line_by_follows_cursor_frame() {
        let mut path = Path::new();
        path.turn(Axis::Z, Angle::Degrees(90.0))
            .line_by(DVec3::new(2.0, 0.0, 0.0));
        assert!(path
            .end_pose()
            .position()
            .abs_diff_eq(DVec3::new(0.0, 2.0, 0.0), TOL));
        assert_eq!(path.segments().len(), 1);
        assert_eq!(path.commands().len(), 2);
    }

    #[test]
    fn test_line_to_reorients_tangent() {
        let mut path = Path::new();
        path.line_to(DVec3::new(0.0, 3.0, 0.0)).unwrap();
        let end = path.end_pose();
        assert!(end.position().abs_diff_eq(DVec3::new(0.0, 3.0, 0.0), TOL));
        // forward axis now points along the segment
        let forward = end.transform_vector(DVec3::X);
        assert!(forward.abs_diff_eq(DVec3::new(0.0, 1.0, 0.0), TOL));
    }

    #[test]
    fn test_line_to_current_position_rejected() {
        let mut path = Path::from_pose(Pose::from_xyz(1.0, 1.0, 0.0));
        assert!(path.line_to(DVec3::new(1.0, 1.0, 0.0)).is_err());
        assert!(path.segments().is_empty());
    }

    #[test]
    fn test_arc_matches_arc_with_radius() {
        let length = 1.5;
        let radius = 2.0;

        let mut by_angle = Path::new();
        by_angle
            .arc(
                Angle::Radians(length / radius),
                DVec3::new(length, 0.0, 0.0),
                Axis::Z,
            )
            .unwrap();

        let mut by_radius = Path::new();
        by_radius.arc_with_radius(radius, length, Axis::Z).unwrap();

        assert!(by_angle
            .end_pose()
            .approx_eq(&by_radius.end_pose(), 1e-9));
    }

    #[test]
    fn test_arc_with_zero_radius_rejected() {
        let mut path = Path::new();
        assert!(matches!(
            path.arc_with_radius(0.0, 1.0, Axis::Z),
            Err(PathError::Pose(PoseError::SingularTransform(_)))
        ));
    }

    #[test]
    fn test_polyline_endpoints_and_joints() {
        let mut path = Path::new();
        path.line_by(DVec3::new(2.0, 0.0, 0.0));
        path.arc(Angle::Degrees(-90.0), DVec3::new(1.5, 0.0, 0.0), Axis::Z)
            .unwrap();
        let expected_end = path.end_pose().position();

        let points = path.to_polyline(8).unwrap();
        // 8 intervals per segment, joint shared once
        assert_eq!(points.len(), 17);
        assert!(points[0].abs_diff_eq(DVec3::ZERO, TOL));
        assert!(points[8].abs_diff_eq(DVec3::new(2.0, 0.0, 0.0), TOL));
        assert!(points.last().unwrap().abs_diff_eq(expected_end, 1e-9));
    }

    #[test]
    fn test_arc_sampling_stays_on_circle() {
        // quarter arc: every sample is at distance |r| from the center
        let mut path = Path::new();
        let s = 3.0;
        path.arc(Angle::Degrees(90.0), DVec3::new(s, 0.0, 0.0), Axis::Z)
            .unwrap();
        let radius = s / std::f64::consts::FRAC_PI_2;
        let center = DVec3::new(0.0, radius, 0.0);
        for point in path.to_polyline(16).unwrap() {
            assert!(((point - center).length() - radius).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_path_has_no_polyline() {
        let path = Path::new();
        assert!(matches!(path.to_polyline(4), Err(PathError::EmptyPath)));
    }

    #[test]
    fn test_into_part() {
        let mut path = Path::new();
        path.line_by(DVec3::new(1.0, 0.0, 0.0));
        let part = path.into_part(2).unwrap();
        assert_eq!(part.class_name(), "PolyLine");
    }

    #[test]
    fn test_chicane_layout() {
        // two opposing dipole pairs cancel the net bend
        let mut path = Path::new();
        path.line_by(DVec3::new(2.0, 0.0, 0.0));
        path.arc(Angle::Degrees(-45.0), DVec3::new(1.5, 0.0, 0.0), Axis::Z)
            .unwrap();
        path.arc(Angle::Degrees(45.0), DVec3::new(1.5, 0.0, 0.0), Axis::Z)
            .unwrap();
        let end = path.end_pose();
        let forward = end.transform_vector(DVec3::X);
        assert!(forward.abs_diff_eq(DVec3::X, 1e-9));
        assert!(end.position().y < 0.0);
    }
}
