//! Structural validation of segment streams.
//!
//! Structural validation checks segment order and cardinality against a
//! message kind's [`BlueprintSpec`]. Element-level checks live on
//! [`Segment::validate`](crate::model::Segment::validate) and are run
//! separately.

pub mod blueprint;
pub mod spec;

pub use blueprint::Blueprint;
pub use spec::{BlueprintNode, BlueprintSpec};
