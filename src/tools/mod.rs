//! Extensible tool system.
//!
//! Tools are the operations a plan can invoke. Each is registered
//! under a unique name in a [`ToolRegistry`], optionally carries a
//! parameter schema validated before dispatch, and accumulates
//! usage/timing/error metrics across the process lifetime. New tools
//! can be composed from existing ones with [`ToolRegistry::compose`].

pub mod builtin;

mod compose;
mod metrics;
mod registry;
mod schema;
mod tool;

pub use compose::{ComposedTool, ParameterMap, SequenceStep};
pub use metrics::{LastError, LastExecution, RegistryMetrics, ToolMetrics};
pub use registry::ToolRegistry;
pub use schema::{PropertyKind, PropertySchema, ToolSchema};
pub use tool::{EchoTool, FnTool, Tool};
