//! Part nodes for the assembly tree

use std::collections::HashMap;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::partmap::PartMap;
use crate::pose::{Angle, Axis, Pose};
use crate::style::Style;

/// Identifier of a part inside an [`Assembly`](crate::assembly::Assembly)
pub type PartId = Uuid;

/// What a part is: an interior grouping node or a drawable leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartKind {
    /// Interior node; drawn only via its sub-parts (or its pose marker)
    Group,
    /// A bare located point
    Point,
    /// Straight segment between two local endpoints
    Line { a: DVec3, b: DVec3 },
    /// Ordered point sequence in the local frame
    PolyLine { points: Vec<DVec3> },
    /// Circular arc centered on the local origin, swept from the local
    /// x-axis about `axis`
    Arc {
        radius: f64,
        angle: Angle,
        axis: Axis,
    },
    /// Text anchored at the local origin
    Text { text: String },
    /// Axis-aligned rectangle centered on the local origin
    Rectangle { width: f64, height: f64 },
}

impl PartKind {
    /// Class name used by `.`-selectors
    pub fn class_name(&self) -> &'static str {
        match self {
            PartKind::Group => "Part",
            PartKind::Point => "Point",
            PartKind::Line { .. } => "Line",
            PartKind::PolyLine { .. } => "PolyLine",
            PartKind::Arc { .. } => "Arc",
            PartKind::Text { .. } => "Text",
            PartKind::Rectangle { .. } => "Rectangle",
        }
    }

    /// True for drawable leaf kinds
    pub fn is_primitive(&self) -> bool {
        !matches!(self, PartKind::Group)
    }

    /// Outline vertices in the local frame
    pub fn outline_points(&self) -> Vec<DVec3> {
        match self {
            PartKind::Group | PartKind::Point | PartKind::Text { .. } => vec![DVec3::ZERO],
            PartKind::Line { a, b } => vec![*a, *b],
            PartKind::PolyLine { points } => points.clone(),
            PartKind::Arc {
                radius,
                angle,
                axis,
            } => {
                let steps = 16;
                let start = DVec3::X * *radius;
                (0..=steps)
                    .map(|i| {
                        let t = angle.radians() * i as f64 / steps as f64;
                        DQuat::from_axis_angle(axis.vector(), t) * start
                    })
                    .collect()
            }
            PartKind::Rectangle { width, height } => {
                let (w, h) = (width / 2.0, height / 2.0);
                vec![
                    DVec3::new(-w, h, 0.0),
                    DVec3::new(w, h, 0.0),
                    DVec3::new(w, -h, 0.0),
                    DVec3::new(-w, -h, 0.0),
                ]
            }
        }
    }
}

/// A named node in the assembly tree
///
/// `template` and `container` are non-owning ids into the arena; the
/// container is only ever used to compute world poses. `cached` holds child
/// views already materialized for this exact container.
#[derive(Debug, Clone)]
pub struct Part {
    pub id: PartId,
    pub name: Option<String>,
    pub local_pose: Pose,
    pub kind: PartKind,
    pub parts: PartMap,
    pub template: Option<PartId>,
    pub container: Option<PartId>,
    pub style: Option<Style>,
    pub(crate) cached: HashMap<String, PartId>,
}

impl Part {
    /// Create a part of the given kind at the identity pose
    pub fn new(kind: PartKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            local_pose: Pose::IDENTITY,
            kind,
            parts: PartMap::new(),
            template: None,
            container: None,
            style: None,
            cached: HashMap::new(),
        }
    }

    /// An interior grouping node
    pub fn group() -> Self {
        Self::new(PartKind::Group)
    }

    pub fn point() -> Self {
        Self::new(PartKind::Point)
    }

    pub fn line(a: DVec3, b: DVec3) -> Self {
        Self::new(PartKind::Line { a, b })
    }

    pub fn polyline(points: Vec<DVec3>) -> Self {
        Self::new(PartKind::PolyLine { points })
    }

    pub fn arc(radius: f64, angle: Angle, axis: Axis) -> Self {
        Self::new(PartKind::Arc {
            radius,
            angle,
            axis,
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(PartKind::Text { text: text.into() })
    }

    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(PartKind::Rectangle { width, height })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.local_pose = pose;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    /// Class name used by `.`-selectors
    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }
}
