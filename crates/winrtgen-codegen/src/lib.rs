//! Code generation for the WinRT projection
//!
//! The emission pipeline: per-namespace four-phase header emission collects
//! dependency sets through the writer, the planner partitions the resulting
//! namespace graph into strongly-connected components, and the module unit
//! writers emit a deterministic, acyclic set of module interface units.

pub mod collector;
pub mod emitter;
pub mod error;
pub mod module_units;
pub mod planner;
pub mod printers;
pub mod strings;
pub mod writer;

pub use collector::namespace_module_imports;
pub use emitter::{NamespaceEmitter, GENERATOR_VERSION};
pub use error::CodegenError;
pub use planner::{plan, Component, ModulePlan};
pub use writer::Writer;
