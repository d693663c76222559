//! Component implementation scaffolding
//!
//! Opt-in skeletons for consumers implementing WinRT classes. These files
//! belong to the consumer once generated: existing files are left alone
//! unless overwrite is requested. Scaffolding never contributes to the
//! namespace dependency graph.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use winrtgen_codegen::printers::cpp_namespace;
use winrtgen_codegen::Writer;
use winrtgen_core::{MetadataCache, Settings};

pub fn write_component_scaffolding(settings: &Settings, cache: &MetadataCache) -> Result<()> {
    let Some(folder) = &settings.component_folder else {
        return Ok(());
    };

    std::fs::create_dir_all(folder)
        .with_context(|| format!("creating component folder '{}'", folder.display()))?;

    for (ns, members) in cache.namespaces() {
        for class in &members.classes {
            if !settings
                .projection_filter
                .includes(&format!("{}.{}", ns, class.name))
            {
                continue;
            }

            let header_path = folder.join(format!("{}.h", class.name));
            if settings.component_overwrite || !header_path.exists() {
                let mut w = Writer::new();
                writeln!(
                    w,
                    "#pragma once\n#include \"{0}.g.h\"\n\nnamespace winrt::{1}::implementation\n{{\n    struct {0} : {0}T<{0}>\n    {{\n        {0}() = default;\n    }};\n}}",
                    class.name,
                    cpp_namespace(ns)
                )?;
                w.flush_to_file(&header_path)?;
            }

            let source_path = folder.join(format!("{}.cpp", class.name));
            if settings.component_overwrite || !source_path.exists() {
                let mut w = Writer::new();
                writeln!(
                    w,
                    "#include \"pch.h\"\n#include \"{0}.h\"\n\nnamespace winrt::{1}::implementation\n{{\n}}",
                    class.name,
                    cpp_namespace(ns)
                )?;
                w.flush_to_file(&source_path)?;
            }
        }
    }

    Ok(())
}
