//! CLI commands

pub mod list;
pub mod lock;
pub mod status;
pub mod template;
pub mod up;

mod render;
