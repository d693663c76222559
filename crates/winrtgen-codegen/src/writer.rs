//! Emission writer
//!
//! One writer per worker. It accumulates header text and records which
//! foreign namespaces the emitted text referenced; that record is the sole
//! input to dependency collection and, transitively, to the module planner.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use winrtgen_core::TypeName;

use crate::error::CodegenError;

#[derive(Debug, Default)]
pub struct Writer {
    buffer: String,
    tail: String,
    /// Namespace currently being emitted; references into it are not
    /// dependencies.
    pub type_namespace: String,
    /// Referenced namespace to referenced type names, both sorted.
    pub depends: BTreeMap<String, BTreeSet<String>>,
}

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(namespace: &str) -> Self {
        Self {
            type_namespace: namespace.to_string(),
            ..Self::default()
        }
    }

    /// Record a reference to a foreign type. Idempotent; references into the
    /// writer's own namespace are ignored.
    pub fn add_depends(&mut self, type_name: &TypeName) {
        if type_name.namespace == self.type_namespace {
            return;
        }

        self.depends
            .entry(type_name.namespace.clone())
            .or_default()
            .insert(type_name.name.clone());
    }

    /// Move the accumulated text aside and reset the buffer, so the prologue
    /// can be written once `depends` is fully known. The moved text is
    /// appended after the buffer on flush.
    pub fn swap(&mut self) {
        debug_assert!(self.tail.is_empty());
        self.tail = std::mem::take(&mut self.buffer);
    }

    /// Include directive for a dependency's phase-level header.
    pub fn write_depends(&mut self, namespace: &str, phase: char) {
        self.buffer
            .push_str(&format!("#include \"winrt/impl/{}.{}.h\"\n", namespace, phase));
    }

    /// The complete output: prologue buffer followed by the swapped-out body.
    pub fn contents(&self) -> String {
        let mut text = String::with_capacity(self.buffer.len() + self.tail.len());
        text.push_str(&self.buffer);
        text.push_str(&self.tail);
        text
    }

    /// Write the buffered output in a single filesystem operation. Unchanged
    /// files are left untouched, which makes re-runs content-level no-ops.
    pub fn flush_to_file(&self, path: &Path) -> Result<(), CodegenError> {
        let text = self.contents();

        if let Ok(existing) = std::fs::read(path) {
            if existing == text.as_bytes() {
                return Ok(());
            }
        }

        std::fs::write(path, text)?;
        Ok(())
    }
}
