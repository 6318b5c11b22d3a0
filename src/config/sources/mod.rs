//! Configuration sources, applied lowest precedence first.

pub mod environment;
pub mod global_file;
pub mod workspace_file;
