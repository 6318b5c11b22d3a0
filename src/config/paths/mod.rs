//! Filesystem locations used by configuration defaults.

pub mod platform;
