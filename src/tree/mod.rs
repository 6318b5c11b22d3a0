//! Bookmark Trees
//!
//! Native nodes (owned by a backend) and desired nodes (parsed from an edited
//! snapshot), plus the structural key used to pair them.

pub mod node;

pub use node::{DesiredNode, MatchKey, NativeNode};
