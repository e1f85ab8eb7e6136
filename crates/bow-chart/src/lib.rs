//! Bow Chart - Chart abstraction and dependency resolver
//!
//! A chart is a named, versioned unit exposing `render(ctx, values)`;
//! charts declare dependencies on other charts with conditional
//! activation and default value injection. Charts resolve by name
//! through a [`ChartRegistry`]; the builtin set ships PostgreSQL, Redis
//! and Redmine.

pub mod builtin;
pub mod chart;
pub mod dependency;
pub mod error;
pub mod registry;

pub use chart::{render_dependencies, template, Chart};
pub use dependency::{dependency_values, resolve_condition, ChartDependency};
pub use error::{ChartError, Result};
pub use registry::ChartRegistry;
