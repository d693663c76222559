//! Module interface unit writers
//!
//! Emits the five unit shapes: the runtime-library module, the isolated
//! numerics module, per-namespace singleton units, SCC owner units, and
//! re-export stubs for non-owner cycle members. Also assembles `base.h`,
//! `module.h`, and the non-module aggregate `winrt.ixx`.

use std::fmt::Write as _;
use std::path::PathBuf;

use winrtgen_core::{MetadataCache, ProjectionFilter, Settings};

use crate::emitter::{
    write_close_file_guard, write_export_macro_pop, write_export_macro_push,
    write_module_includes_end, write_module_includes_start, write_open_file_guard, write_preamble,
    GENERATOR_VERSION,
};
use crate::error::CodegenError;
use crate::planner::Component;
use crate::printers::{write_forward, write_type_namespace};
use crate::strings;
use crate::writer::Writer;

type Result<T = ()> = std::result::Result<T, CodegenError>;

fn winrt_path(settings: &Settings, file: &str) -> PathBuf {
    settings.output_folder.join("winrt").join(file)
}

/// The common global module fragment: defines WINRT_MODULE so generated
/// headers suppress their dependent includes and export their declarations,
/// and supplies the macros that imports cannot carry.
fn write_module_global_fragment(w: &mut Writer) -> Result {
    writeln!(
        w,
        "module;\n\n#define WINRT_MODULE\n#include <cstddef>\n#include <version>\n#include \"winrt/module.h\"\n"
    )?;
    Ok(())
}

fn write_module_dependency_comment(w: &mut Writer, imports: &[String]) -> Result {
    writeln!(w, "// Module dependencies:")?;
    writeln!(w, "//   - std")?;
    writeln!(w, "//   - winrt.base (re-exported)")?;
    if imports.is_empty() {
        writeln!(w, "//   - (no additional namespace imports)")?;
    } else {
        for import in imports {
            writeln!(w, "//   - {}", import)?;
        }
    }
    Ok(())
}

pub fn write_base_h(settings: &Settings) -> Result {
    let mut w = Writer::new();
    write_preamble(&mut w)?;
    w.write_str(&strings::BASE_VERSION_ODR.replace("{}", GENERATOR_VERSION))?;
    write_open_file_guard(&mut w, "WINRT_BASE_H")?;

    if settings.modules {
        write_export_macro_push(&mut w)?;
        write_module_includes_start(&mut w)?;
        w.write_str(strings::BASE_INCLUDES)?;
        write_module_includes_end(&mut w)?;
    } else {
        writeln!(w, "#ifndef WINRT_EXPORT\n#define WINRT_EXPORT\n#endif")?;
        w.write_str(strings::BASE_INCLUDES)?;
    }

    for section in [
        strings::BASE_MACROS,
        strings::BASE_TYPES,
        strings::BASE_STRING,
        strings::BASE_ERROR,
        strings::BASE_EVENTS,
        strings::BASE_ACTIVATION,
        strings::BASE_FOUNDATION,
        strings::BASE_STD_HASH,
        strings::BASE_VERSION,
    ] {
        w.write_str(section)?;
    }

    if settings.modules {
        write_export_macro_pop(&mut w)?;
    }
    write_close_file_guard(&mut w)?;
    w.flush_to_file(&winrt_path(settings, "base.h"))
}

/// Macros are not shared through module imports; every module interface unit
/// includes this header in its global fragment instead.
pub fn write_module_h(settings: &Settings) -> Result {
    let mut w = Writer::new();
    write_preamble(&mut w)?;
    write_open_file_guard(&mut w, "WINRT_MODULE_H")?;
    w.write_str(strings::BASE_MACROS)?;
    write_close_file_guard(&mut w)?;
    w.flush_to_file(&winrt_path(settings, "module.h"))
}

pub fn write_base_ixx(settings: &Settings) -> Result {
    let mut w = Writer::new();
    write_preamble(&mut w)?;
    write_module_global_fragment(&mut w)?;

    writeln!(
        w,
        "export module winrt.base;\n\n// Module dependencies:\n//   - std\n//   - winrt.numerics (re-exported)\n\nimport std;\nexport import winrt.numerics;\n\n#include \"winrt/base.h\""
    )?;

    w.flush_to_file(&winrt_path(settings, "winrt.base.ixx"))
}

/// Numerics stays isolated in its own module so the large legacy numerics
/// header is never drawn into any other module purview. The module exports
/// nothing when the header is absent from the environment.
pub fn write_numerics_ixx(settings: &Settings) -> Result {
    let mut w = Writer::new();
    write_preamble(&mut w)?;
    write_module_global_fragment(&mut w)?;

    writeln!(
        w,
        "export module winrt.numerics;\n\n// Module dependencies:\n//   - (none)\n\n#if __has_include(<windowsnumerics.impl.h>)\n#define _WINDOWS_NUMERICS_BEGIN_NAMESPACE_ export namespace winrt::Windows::Foundation::Numerics\n#define _WINDOWS_NUMERICS_END_NAMESPACE_\n#include <windowsnumerics.impl.h>\n#undef _WINDOWS_NUMERICS_BEGIN_NAMESPACE_\n#undef _WINDOWS_NUMERICS_END_NAMESPACE_\n#endif"
    )?;

    w.flush_to_file(&winrt_path(settings, "winrt.numerics.ixx"))
}

/// Module interface unit for a namespace that is not part of a cycle.
pub fn write_namespace_ixx(settings: &Settings, ns: &str, imports: &[String]) -> Result {
    let mut w = Writer::new();
    write_preamble(&mut w)?;
    write_module_global_fragment(&mut w)?;

    writeln!(w, "export module {};\n", ns)?;
    write_module_dependency_comment(&mut w, imports)?;

    writeln!(w, "\nimport std;\nexport import winrt.base;")?;
    for import in imports {
        writeln!(w, "import {};", import)?;
    }

    writeln!(w)?;
    for phase in ['0', '1', '2'] {
        writeln!(w, "#include \"winrt/impl/{}.{}.h\"", ns, phase)?;
    }
    writeln!(w, "#include \"winrt/{}.h\"", ns)?;

    w.flush_to_file(&winrt_path(settings, &format!("{}.ixx", ns)))
}

/// Module interface unit owning a multi-namespace component. Forward-declares
/// every projected type of every member before any member header, then pulls
/// the member headers in interleaved phase order so forward declarations
/// always precede definitions regardless of how the cycle winds.
pub fn write_scc_owner_ixx(
    settings: &Settings,
    cache: &MetadataCache,
    filter: &ProjectionFilter,
    component: &Component,
) -> Result {
    let mut w = Writer::new();
    write_preamble(&mut w)?;
    write_module_global_fragment(&mut w)?;

    writeln!(w, "export module {};\n", component.owner)?;
    write_module_dependency_comment(&mut w, &component.external_imports)?;
    writeln!(
        w,
        "//\n// This unit consolidates a dependency cycle; the other members are re-export stubs."
    )?;

    writeln!(w, "\nimport std;\nexport import winrt.base;")?;
    for import in &component.external_imports {
        writeln!(w, "import {};", import)?;
    }

    // The headers define WINRT_EXPORT themselves; the forward declarations
    // below precede them, so the macro is overridden locally around the block.
    writeln!(
        w,
        "\n#pragma push_macro(\"WINRT_EXPORT\")\n#undef WINRT_EXPORT\n#define WINRT_EXPORT export\n"
    )?;

    for member in &component.members {
        let Some(members) = cache.members(member) else {
            continue;
        };
        if !filter.includes_namespace(member, members) {
            continue;
        }

        write_type_namespace(&mut w, member, |w| {
            for def in members
                .enums
                .iter()
                .chain(&members.interfaces)
                .chain(&members.classes)
                .chain(&members.structs)
                .chain(&members.delegates)
                .chain(&members.contracts)
            {
                if filter.includes(&format!("{}.{}", member, def.name)) {
                    write_forward(w, def)?;
                }
            }
            Ok(())
        })?;
    }

    writeln!(w, "#pragma pop_macro(\"WINRT_EXPORT\")\n")?;

    for phase in ['0', '1', '2'] {
        for member in &component.members {
            writeln!(w, "#include \"winrt/impl/{}.{}.h\"", member, phase)?;
        }
    }
    for member in &component.members {
        writeln!(w, "#include \"winrt/{}.h\"", member)?;
    }

    w.flush_to_file(&winrt_path(settings, &format!("{}.ixx", component.owner)))
}

/// Thin wrapper keeping `import <member>;` valid for every member of a
/// consolidated component.
pub fn write_reexport_ixx(settings: &Settings, ns: &str, owner: &str) -> Result {
    let mut w = Writer::new();
    write_preamble(&mut w)?;

    writeln!(
        w,
        "// This module defines no declarations of its own. It re-exports the\n// '{0}' module, which consolidates a namespace dependency cycle.\n//\n// Module dependencies:\n//   - {0} (re-exported)\n\nexport module {1};\nexport import {0};",
        owner, ns
    )?;

    w.flush_to_file(&winrt_path(settings, &format!("{}.ixx", ns)))
}

/// Non-module builds get one aggregate unit textually including every
/// emitted projection header.
pub fn write_aggregate_ixx(settings: &Settings, namespaces: &[String]) -> Result {
    let mut w = Writer::new();
    write_preamble(&mut w)?;
    writeln!(w, "module;\n")?;
    w.write_str(strings::BASE_INCLUDES)?;
    writeln!(w, "\nexport module winrt;\n#define WINRT_EXPORT export\n")?;
    writeln!(w, "#include \"winrt/base.h\"")?;
    for ns in namespaces {
        writeln!(w, "#include \"winrt/{}.h\"", ns)?;
    }

    w.flush_to_file(&winrt_path(settings, "winrt.ixx"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use winrtgen_core::{Database, DatabaseType, TypeKind};

    fn settings(dir: &std::path::Path, modules: bool) -> Settings {
        std::fs::create_dir_all(dir.join("winrt/impl")).unwrap();
        Settings {
            output_folder: dir.to_path_buf(),
            modules,
            ..Settings::default()
        }
    }

    fn cache_with(namespaces: &[&str]) -> MetadataCache {
        let types = namespaces
            .iter()
            .map(|ns| DatabaseType {
                namespace: ns.to_string(),
                name: "Widget".to_string(),
                kind: TypeKind::Class {
                    default_interface: None,
                    interfaces: vec![],
                    fastabi: false,
                },
            })
            .collect();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, serde_json::to_string(&Database { types }).unwrap()).unwrap();
        MetadataCache::from_files([&path], []).unwrap()
    }

    #[test]
    fn test_reexport_stub_shape() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = settings(dir.path(), true);

        write_reexport_ixx(&settings, "Test.B", "Test.A").unwrap();

        let text = std::fs::read_to_string(dir.path().join("winrt/Test.B.ixx")).unwrap();
        assert!(text.contains("export module Test.B;"));
        assert!(text.contains("export import Test.A;"));
        assert!(!text.contains("#include"));
    }

    #[test]
    fn test_namespace_ixx_imports_and_includes() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = settings(dir.path(), true);

        write_namespace_ixx(&settings, "Test.A", &["Test.B".to_string()]).unwrap();

        let text = std::fs::read_to_string(dir.path().join("winrt/Test.A.ixx")).unwrap();
        assert!(text.contains("export module Test.A;"));
        assert!(text.contains("export import winrt.base;"));
        assert!(text.contains("import Test.B;"));

        let p0 = text.find("impl/Test.A.0.h").unwrap();
        let p1 = text.find("impl/Test.A.1.h").unwrap();
        let p2 = text.find("impl/Test.A.2.h").unwrap();
        let top = text.find("\"winrt/Test.A.h\"").unwrap();
        assert!(p0 < p1 && p1 < p2 && p2 < top);
    }

    #[test]
    fn test_owner_unit_interleaves_phases_across_members() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = settings(dir.path(), true);
        let cache = cache_with(&["Test.A", "Test.B"]);
        let filter = ProjectionFilter::default();

        let component = Component {
            owner: "Test.A".to_string(),
            members: vec!["Test.A".to_string(), "Test.B".to_string()],
            external_imports: vec![],
        };
        write_scc_owner_ixx(&settings, &cache, &filter, &component).unwrap();

        let text = std::fs::read_to_string(dir.path().join("winrt/Test.A.ixx")).unwrap();
        assert!(text.contains("export module Test.A;"));
        assert!(text.contains("push_macro(\"WINRT_EXPORT\")"));
        assert!(text.contains("namespace winrt::Test::A"));
        assert!(text.contains("namespace winrt::Test::B"));
        assert!(text.contains("struct Widget;"));

        // All member .0 headers come before any .1 header, and so on.
        let a0 = text.find("impl/Test.A.0.h").unwrap();
        let b0 = text.find("impl/Test.B.0.h").unwrap();
        let a1 = text.find("impl/Test.A.1.h").unwrap();
        let b1 = text.find("impl/Test.B.1.h").unwrap();
        let a2 = text.find("impl/Test.A.2.h").unwrap();
        let b2 = text.find("impl/Test.B.2.h").unwrap();
        assert!(a0 < b0 && b0 < a1 && a1 < b1 && b1 < a2 && a2 < b2);
    }

    #[test]
    fn test_owner_unit_skips_filtered_types() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = settings(dir.path(), true);
        let cache = cache_with(&["Test.A", "Test.B"]);
        let filter = ProjectionFilter::new(
            Default::default(),
            ["Test.B".to_string()].into_iter().collect(),
        );

        let component = Component {
            owner: "Test.A".to_string(),
            members: vec!["Test.A".to_string(), "Test.B".to_string()],
            external_imports: vec![],
        };
        write_scc_owner_ixx(&settings, &cache, &filter, &component).unwrap();

        let text = std::fs::read_to_string(dir.path().join("winrt/Test.A.ixx")).unwrap();
        assert!(text.contains("namespace winrt::Test::A"));
        assert!(!text.contains("namespace winrt::Test::B"));
    }

    #[test]
    fn test_aggregate_ixx_lists_headers() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = settings(dir.path(), false);

        write_aggregate_ixx(
            &settings,
            &["Test.A".to_string(), "Test.B".to_string()],
        )
        .unwrap();

        let text = std::fs::read_to_string(dir.path().join("winrt/winrt.ixx")).unwrap();
        assert!(text.contains("export module winrt;"));
        assert!(text.contains("#include \"winrt/base.h\""));
        assert!(text.contains("#include \"winrt/Test.A.h\""));
        assert!(text.contains("#include \"winrt/Test.B.h\""));
    }

    #[test]
    fn test_base_h_plain_and_module_aware() {
        let dir = tempfile::TempDir::new().unwrap();
        let plain = settings(dir.path(), false);
        write_base_h(&plain).unwrap();
        let text = std::fs::read_to_string(dir.path().join("winrt/base.h")).unwrap();
        assert!(text.contains("#define WINRT_EXPORT\n#endif"));
        assert!(!text.contains("#define WINRT_EXPORT export"));

        let dir = tempfile::TempDir::new().unwrap();
        let module_aware = settings(dir.path(), true);
        write_base_h(&module_aware).unwrap();
        let text = std::fs::read_to_string(dir.path().join("winrt/base.h")).unwrap();
        assert!(text.contains("#define WINRT_EXPORT export"));
        assert!(text.contains("#ifndef WINRT_MODULE"));
    }

    #[test]
    fn test_base_ixx_reexports_numerics() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = settings(dir.path(), true);
        write_base_ixx(&settings).unwrap();
        write_numerics_ixx(&settings).unwrap();

        let base = std::fs::read_to_string(dir.path().join("winrt/winrt.base.ixx")).unwrap();
        assert!(base.contains("export module winrt.base;"));
        assert!(base.contains("export import winrt.numerics;"));
        assert!(base.contains("#include \"winrt/base.h\""));

        let numerics =
            std::fs::read_to_string(dir.path().join("winrt/winrt.numerics.ixx")).unwrap();
        assert!(numerics.contains("export module winrt.numerics;"));
        assert!(numerics.contains("__has_include"));
    }
}
