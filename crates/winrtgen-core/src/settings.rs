//! Generator settings
//!
//! Computed once during argument processing and then shared immutably across
//! emission workers.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::filter::ProjectionFilter;

#[derive(Debug, Default)]
pub struct Settings {
    /// Metadata databases to project.
    pub input: Vec<PathBuf>,
    /// Metadata available for resolution but not projected.
    pub reference: Vec<PathBuf>,

    /// Output root; `winrt/` and `winrt/impl/` live under it.
    pub output_folder: PathBuf,

    pub include: BTreeSet<String>,
    pub exclude: BTreeSet<String>,
    /// The filter actually applied to projection, derived from the prefix
    /// sets and, when references are present, from the input databases.
    pub projection_filter: ProjectionFilter,

    /// Emit the runtime library header unconditionally.
    pub base: bool,
    /// Emit namespace module interface units; disables the aggregate winrt.ixx.
    pub modules: bool,
    /// Enable the fast-ABI printer path.
    pub fastabi: bool,
    pub verbose: bool,
    /// Run emission on a single thread.
    pub synchronous: bool,

    /// Component scaffolding output folder, when requested.
    pub component_folder: Option<PathBuf>,
    /// Overwrite existing component scaffolding files.
    pub component_overwrite: bool,

    /// Default-interface full name to owning-class full name, built when
    /// fast-ABI support is enabled.
    pub fastabi_cache: BTreeMap<String, String>,
}
