//! Configuration sources that live outside the workspace, lowest precedence first.

pub mod environment;
pub mod global_file;
