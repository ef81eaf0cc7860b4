//! posekit core data structures
//!
//! This crate contains the core of the layout model:
//! - Pose: rigid(+scale) 3D transform with composition and arc motion
//! - Part/Assembly: template/clone part tree with lazy world poses
//! - Style: selector-based style resolution for drawable output
//! - Path: move/turn/line/arc directives turned into segments

pub mod assembly;
pub mod constants;
pub mod part;
pub mod partmap;
pub mod path;
pub mod pose;
pub mod style;

pub use assembly::*;
pub use constants::*;
pub use part::*;
pub use partmap::*;
pub use path::*;
pub use pose::*;
pub use style::*;
