//! Command-line surface and top-level driver for winrtgen

pub mod component;
pub mod config;
pub mod driver;
pub mod task_group;

pub use driver::{run, Args};
