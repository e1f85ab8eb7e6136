//! Bow Stack - Multi-component deployments from a declarative stack file
//!
//! A stack file names an ordered list of chart components with values.
//! Overlay files and --set overrides refine the base definition, and
//! components reference each other with `${component.field}` syntax
//! before anything is rendered.

pub mod engine;
pub mod error;
pub mod merger;
pub mod parser;
pub mod refs;

pub use engine::render_stack;
pub use error::{Result, StackError};
pub use merger::merge_stack_files;
pub use parser::{parse_stack_file, parse_stack_value, ComponentSpec, StackSpec};
pub use refs::resolve_refs;
