//! Four-phase namespace emission
//!
//! Every namespace produces `impl/<ns>.0.h`, `impl/<ns>.1.h`, `impl/<ns>.2.h`
//! and `<ns>.h`, in that order. Each phase emits its body first so the
//! writer's `depends` is complete, snapshots the phase import set, then swaps
//! and writes the prologue: preamble, file guard, and either forward
//! declarations (`.0`) or phase-level includes of the dependencies.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use tracing::debug;
use winrtgen_core::{MetadataCache, NamespaceMembers, Settings, TypeDef};

use crate::collector::namespace_module_imports;
use crate::error::CodegenError;
use crate::printers::*;
use crate::strings;
use crate::writer::Writer;

type Result<T = ()> = std::result::Result<T, CodegenError>;

pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn write_preamble(w: &mut Writer) -> Result {
    writeln!(w, "{}{}\n", strings::PREAMBLE, GENERATOR_VERSION)?;
    Ok(())
}

pub fn file_guard_symbol(namespace: &str, phase: Option<char>) -> String {
    let flat = namespace.replace('.', "_");
    match phase {
        Some(phase) => format!("WINRT_{}_{}_H", flat, phase),
        None => format!("WINRT_{}_H", flat),
    }
}

pub fn write_open_file_guard(w: &mut Writer, symbol: &str) -> Result {
    writeln!(w, "#ifndef {0}\n#define {0}", symbol)?;
    Ok(())
}

pub fn write_close_file_guard(w: &mut Writer) -> Result {
    writeln!(w, "#endif")?;
    Ok(())
}

/// `WINRT_EXPORT` expands to `export` inside a module purview and to nothing
/// in a plain header build.
pub fn write_export_macro_push(w: &mut Writer) -> Result {
    writeln!(
        w,
        "#ifdef WINRT_MODULE\n#define WINRT_EXPORT export\n#else\n#define WINRT_EXPORT\n#endif"
    )?;
    Ok(())
}

pub fn write_export_macro_pop(w: &mut Writer) -> Result {
    writeln!(w, "#undef WINRT_EXPORT")?;
    Ok(())
}

/// Textual dependent includes are suppressed inside a module purview; the
/// module import graph carries the dependency instead.
pub fn write_module_includes_start(w: &mut Writer) -> Result {
    writeln!(w, "#ifndef WINRT_MODULE")?;
    Ok(())
}

pub fn write_module_includes_end(w: &mut Writer) -> Result {
    writeln!(w, "#endif")?;
    Ok(())
}

/// Immediate ancestors of a dotted namespace, shallowest first.
pub fn parent_namespaces(namespace: &str) -> Vec<String> {
    let mut parents = Vec::new();
    let mut current = namespace;
    while let Some((parent, _)) = current.rsplit_once('.') {
        parents.push(parent.to_string());
        current = parent;
    }
    parents.reverse();
    parents
}

pub struct NamespaceEmitter<'a> {
    cache: &'a MetadataCache,
    settings: &'a Settings,
}

impl<'a> NamespaceEmitter<'a> {
    pub fn new(cache: &'a MetadataCache, settings: &'a Settings) -> Self {
        Self { cache, settings }
    }

    /// Emit all four phase files for one namespace. Returns the union of the
    /// per-phase module import sets, sorted.
    pub fn emit_namespace(&self, ns: &str, members: &NamespaceMembers) -> Result<Vec<String>> {
        let mut combined = BTreeSet::new();
        combined.extend(self.write_namespace_0(ns, members)?);
        combined.extend(self.write_namespace_1(ns, members)?);
        combined.extend(self.write_namespace_2(ns, members)?);
        combined.extend(self.write_namespace_top(ns, members)?);

        debug!(namespace = ns, imports = combined.len(), "namespace emitted");
        Ok(combined.into_iter().collect())
    }

    fn impl_path(&self, ns: &str, phase: char) -> PathBuf {
        self.settings
            .output_folder
            .join("winrt")
            .join("impl")
            .join(format!("{}.{}.h", ns, phase))
    }

    fn header_path(&self, ns: &str) -> PathBuf {
        self.settings
            .output_folder
            .join("winrt")
            .join(format!("{}.h", ns))
    }

    fn find_type(&self, ns: &str, name: &str) -> Option<&TypeDef> {
        self.cache
            .members(ns)
            .and_then(|members| members.all_types().find(|t| t.name == name))
    }

    fn collect(&self, ns: &str, w: &Writer) -> Vec<String> {
        namespace_module_imports(self.cache, &self.settings.projection_filter, ns, w)
    }

    /// Close the body, swap, and write the shared prologue head. The caller
    /// continues with the phase-specific dependency block.
    fn begin_prologue(&self, w: &mut Writer, ns: &str, phase: Option<char>) -> Result {
        if self.settings.modules {
            write_export_macro_pop(w)?;
        }
        write_close_file_guard(w)?;
        w.swap();
        write_preamble(w)?;
        write_open_file_guard(w, &file_guard_symbol(ns, phase))?;
        Ok(())
    }

    fn write_namespace_0(&self, ns: &str, members: &NamespaceMembers) -> Result<Vec<String>> {
        let mut w = Writer::with_namespace(ns);

        write_type_namespace(&mut w, ns, |w| {
            for def in &members.enums {
                write_enum(w, def)?;
            }
            for def in members
                .interfaces
                .iter()
                .chain(&members.classes)
                .chain(&members.structs)
                .chain(&members.delegates)
                .chain(&members.contracts)
            {
                write_forward(w, def)?;
            }
            Ok(())
        })?;

        write_impl_namespace(&mut w, |w| {
            for def in &members.interfaces {
                write_category(w, ns, def, "interface_category")?;
            }
            for def in &members.classes {
                write_category(w, ns, def, "class_category")?;
            }
            for def in &members.enums {
                write_category(w, ns, def, "enum_category")?;
            }
            for def in &members.structs {
                write_struct_category(w, ns, def)?;
            }
            for def in &members.delegates {
                write_category(w, ns, def, "delegate_category")?;
            }

            for def in members
                .classes
                .iter()
                .chain(&members.enums)
                .chain(&members.structs)
                .chain(&members.interfaces)
                .chain(&members.delegates)
                .chain(&members.contracts)
            {
                write_name(w, ns, def)?;
            }

            for def in members.interfaces.iter().chain(&members.delegates) {
                write_guid(w, ns, def)?;
            }
            for def in &members.classes {
                write_default_interface(w, ns, def)?;
            }
            for def in &members.interfaces {
                write_interface_abi(w, ns, def, self.settings)?;
            }
            for def in &members.delegates {
                write_delegate_abi(w, ns, def)?;
            }
            for def in &members.interfaces {
                write_consume(w, ns, def)?;
            }
            for def in &members.structs {
                write_struct_abi(w, ns, def)?;
            }
            Ok(())
        })?;

        let imports = self.collect(ns, &w);
        self.begin_prologue(&mut w, ns, Some('0'))?;

        if self.settings.modules {
            write_export_macro_push(&mut w)?;
            write_module_includes_start(&mut w)?;
        }

        // Phase 0 resolves dependencies with forward declarations, never
        // includes.
        let depends = w.depends.clone();
        for (dep_ns, type_names) in &depends {
            write_type_namespace(&mut w, dep_ns, |w| {
                for name in type_names {
                    match self.find_type(dep_ns, name) {
                        Some(def) => write_forward(w, def)?,
                        None => writeln!(w, "    struct {};", name)?,
                    }
                }
                Ok(())
            })?;
        }

        if self.settings.modules {
            write_module_includes_end(&mut w)?;
        }

        w.flush_to_file(&self.impl_path(ns, '0'))?;
        Ok(imports)
    }

    fn write_namespace_1(&self, ns: &str, members: &NamespaceMembers) -> Result<Vec<String>> {
        let mut w = Writer::with_namespace(ns);

        write_type_namespace(&mut w, ns, |w| {
            for def in &members.interfaces {
                write_interface(w, def)?;
            }
            Ok(())
        })?;

        let imports = self.collect(ns, &w);
        self.begin_prologue(&mut w, ns, Some('1'))?;

        if self.settings.modules {
            write_export_macro_push(&mut w)?;
            write_module_includes_start(&mut w)?;
        }

        let depends: Vec<String> = w.depends.keys().cloned().collect();
        for dep in &depends {
            w.write_depends(dep, '0');
        }
        let own = w.type_namespace.clone();
        w.write_depends(&own, '0');

        if self.settings.modules {
            write_module_includes_end(&mut w)?;
        }

        w.flush_to_file(&self.impl_path(ns, '1'))?;
        Ok(imports)
    }

    fn write_namespace_2(&self, ns: &str, members: &NamespaceMembers) -> Result<Vec<String>> {
        let mut w = Writer::with_namespace(ns);

        let mut promote = false;
        write_type_namespace(&mut w, ns, |w| {
            for def in &members.delegates {
                write_delegate(w, def)?;
            }
            promote = write_structs(w, ns, &members.structs)?;
            for def in &members.classes {
                write_class(w, def)?;
            }
            for def in &members.classes {
                write_interface_override(w, ns, def)?;
            }
            Ok(())
        })?;

        let imports = self.collect(ns, &w);
        self.begin_prologue(&mut w, ns, Some('2'))?;

        // Structs embedding foreign types by value need those definitions
        // complete; everything else gets by with interface-level layering.
        let phase = if promote { '2' } else { '1' };

        if self.settings.modules {
            write_export_macro_push(&mut w)?;
            write_module_includes_start(&mut w)?;
        }

        let depends: Vec<String> = w.depends.keys().cloned().collect();
        for dep in &depends {
            w.write_depends(dep, phase);
        }
        let own = w.type_namespace.clone();
        w.write_depends(&own, '1');

        if self.settings.modules {
            write_module_includes_end(&mut w)?;
        }

        w.flush_to_file(&self.impl_path(ns, '2'))?;
        Ok(imports)
    }

    fn write_namespace_top(&self, ns: &str, members: &NamespaceMembers) -> Result<Vec<String>> {
        let mut w = Writer::with_namespace(ns);

        write_impl_namespace(&mut w, |w| {
            for def in &members.interfaces {
                write_consume_definitions(w, ns, def)?;
            }
            for def in &members.delegates {
                write_delegate_implementation(w, ns, def)?;
            }
            for def in &members.interfaces {
                write_produce(w, ns, def)?;
            }
            Ok(())
        })?;

        write_type_namespace(&mut w, ns, |w| {
            for def in &members.enums {
                write_enum_operators(w, def)?;
            }
            for def in &members.classes {
                write_class_definitions(w, ns, def)?;
            }
            for def in &members.classes {
                write_fast_class_base(w, ns, def, self.settings)?;
            }
            for def in &members.classes {
                write_interface_override_methods(w, ns, def)?;
            }
            Ok(())
        })?;

        write_std_namespace(&mut w, |w| {
            for def in members.interfaces.iter().chain(&members.classes) {
                write_std_hash(w, ns, def)?;
            }
            for def in members.interfaces.iter().chain(&members.classes) {
                write_std_formatter(w, ns, def)?;
            }
            Ok(())
        })?;

        let imports = self.collect(ns, &w);
        self.begin_prologue(&mut w, ns, None)?;

        writeln!(
            w,
            "static_assert(winrt::check_version(\"{0}\", \"{0}\"), \"Mismatched winrt header versions.\");",
            GENERATOR_VERSION
        )?;

        if self.settings.modules {
            write_export_macro_push(&mut w)?;
            write_module_includes_start(&mut w)?;
        }

        for parent in parent_namespaces(ns) {
            if self.cache.is_projected(&parent, &self.settings.projection_filter) {
                writeln!(w, "#include \"winrt/{}.h\"", parent)?;
            }
        }

        let depends: Vec<String> = w.depends.keys().cloned().collect();
        for dep in &depends {
            w.write_depends(dep, '2');
        }
        let own = w.type_namespace.clone();
        w.write_depends(&own, '2');

        if self.settings.modules {
            write_module_includes_end(&mut w)?;
        }

        w.flush_to_file(&self.header_path(ns))?;
        Ok(imports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use winrtgen_core::{
        Database, DatabaseType, Method, Param, ProjectionFilter, StructField, TypeKind, TypeName,
        TypeRef,
    };

    fn widget_types() -> Vec<DatabaseType> {
        vec![
            DatabaseType {
                namespace: "Test.A".to_string(),
                name: "IWidget".to_string(),
                kind: TypeKind::Interface {
                    guid: "11111111-2222-3333-4444-555555555555".to_string(),
                    methods: vec![Method {
                        name: "Fetch".to_string(),
                        params: vec![Param {
                            name: "input".to_string(),
                            ty: TypeRef::Named(TypeName::new("Test.B", "Options")),
                        }],
                        return_type: None,
                    }],
                    requires: vec![TypeName::new("Test.B", "IOptions")],
                },
            },
            DatabaseType {
                namespace: "Test.A".to_string(),
                name: "Bounds".to_string(),
                kind: TypeKind::Struct {
                    fields: vec![StructField {
                        name: "options".to_string(),
                        ty: TypeRef::Named(TypeName::new("Test.B", "Options")),
                    }],
                },
            },
            DatabaseType {
                namespace: "Test.B".to_string(),
                name: "Options".to_string(),
                kind: TypeKind::Struct {
                    fields: vec![StructField {
                        name: "value".to_string(),
                        ty: TypeRef::Primitive("Int32".to_string()),
                    }],
                },
            },
            DatabaseType {
                namespace: "Test.B".to_string(),
                name: "IOptions".to_string(),
                kind: TypeKind::Interface {
                    guid: "99999999-8888-7777-6666-555555555555".to_string(),
                    methods: vec![],
                    requires: vec![],
                },
            },
        ]
    }

    fn setup(dir: &Path, modules: bool) -> (MetadataCache, Settings) {
        let db = dir.join("db.json");
        std::fs::write(
            &db,
            serde_json::to_string(&Database {
                types: widget_types(),
            })
            .unwrap(),
        )
        .unwrap();
        std::fs::create_dir_all(dir.join("out/winrt/impl")).unwrap();

        let cache = MetadataCache::from_files([&db], []).unwrap();
        let settings = Settings {
            output_folder: dir.join("out"),
            modules,
            projection_filter: ProjectionFilter::default(),
            ..Settings::default()
        };
        (cache, settings)
    }

    #[test]
    fn test_four_phase_files_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let (cache, settings) = setup(dir.path(), false);
        let emitter = NamespaceEmitter::new(&cache, &settings);

        let members = cache.members("Test.A").unwrap();
        let imports = emitter.emit_namespace("Test.A", members).unwrap();

        for file in ["winrt/impl/Test.A.0.h", "winrt/impl/Test.A.1.h", "winrt/impl/Test.A.2.h", "winrt/Test.A.h"] {
            assert!(dir.path().join("out").join(file).exists(), "missing {}", file);
        }
        assert_eq!(imports, vec!["Test.B".to_string()]);
    }

    #[test]
    fn test_phase_layering() {
        let dir = tempfile::TempDir::new().unwrap();
        let (cache, settings) = setup(dir.path(), false);
        let emitter = NamespaceEmitter::new(&cache, &settings);

        let members = cache.members("Test.A").unwrap();
        emitter.emit_namespace("Test.A", members).unwrap();

        let phase0 =
            std::fs::read_to_string(dir.path().join("out/winrt/impl/Test.A.0.h")).unwrap();
        assert!(phase0.contains("namespace winrt::Test::B"));
        assert!(phase0.contains("struct Options;"));
        assert!(!phase0.contains("#include \"winrt/impl/Test.B"));

        let phase1 =
            std::fs::read_to_string(dir.path().join("out/winrt/impl/Test.A.1.h")).unwrap();
        assert!(phase1.contains("#include \"winrt/impl/Test.B.0.h\""));
        assert!(phase1.contains("#include \"winrt/impl/Test.A.0.h\""));

        // Test.A's struct embeds Test.B's struct by value: promote.
        let phase2 =
            std::fs::read_to_string(dir.path().join("out/winrt/impl/Test.A.2.h")).unwrap();
        assert!(phase2.contains("#include \"winrt/impl/Test.B.2.h\""));
        assert!(phase2.contains("#include \"winrt/impl/Test.A.1.h\""));

        let top = std::fs::read_to_string(dir.path().join("out/winrt/Test.A.h")).unwrap();
        assert!(top.contains("#include \"winrt/impl/Test.B.2.h\""));
        assert!(top.contains("#include \"winrt/impl/Test.A.2.h\""));
        assert!(top.contains("static_assert(winrt::check_version"));
    }

    #[test]
    fn test_no_promote_uses_phase_1() {
        let dir = tempfile::TempDir::new().unwrap();
        let (cache, settings) = setup(dir.path(), false);
        let emitter = NamespaceEmitter::new(&cache, &settings);

        // Test.B has only a primitive struct, so its .2 depends on nothing
        // foreign and self at .1.
        let members = cache.members("Test.B").unwrap();
        emitter.emit_namespace("Test.B", members).unwrap();

        let phase2 =
            std::fs::read_to_string(dir.path().join("out/winrt/impl/Test.B.2.h")).unwrap();
        assert!(phase2.contains("#include \"winrt/impl/Test.B.1.h\""));
        assert!(!phase2.contains("Test.A"));
    }

    #[test]
    fn test_module_mode_guards() {
        let dir = tempfile::TempDir::new().unwrap();
        let (cache, settings) = setup(dir.path(), true);
        let emitter = NamespaceEmitter::new(&cache, &settings);

        let members = cache.members("Test.A").unwrap();
        emitter.emit_namespace("Test.A", members).unwrap();

        let phase1 =
            std::fs::read_to_string(dir.path().join("out/winrt/impl/Test.A.1.h")).unwrap();
        assert!(phase1.contains("#ifndef WINRT_MODULE"));
        assert!(phase1.contains("#define WINRT_EXPORT export"));
        assert!(phase1.contains("#undef WINRT_EXPORT"));
    }

    #[test]
    fn test_parent_namespaces() {
        assert_eq!(
            parent_namespaces("Windows.Foundation.Collections"),
            vec!["Windows".to_string(), "Windows.Foundation".to_string()]
        );
        assert!(parent_namespaces("Windows").is_empty());
    }

    #[test]
    fn test_reemission_is_byte_identical() {
        let dir = tempfile::TempDir::new().unwrap();
        let (cache, settings) = setup(dir.path(), false);
        let emitter = NamespaceEmitter::new(&cache, &settings);
        let members = cache.members("Test.A").unwrap();

        emitter.emit_namespace("Test.A", members).unwrap();
        let first = std::fs::read(dir.path().join("out/winrt/Test.A.h")).unwrap();
        emitter.emit_namespace("Test.A", members).unwrap();
        let second = std::fs::read(dir.path().join("out/winrt/Test.A.h")).unwrap();
        assert_eq!(first, second);
    }
}
