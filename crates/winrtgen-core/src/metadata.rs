//! Metadata model and cache
//!
//! Metadata databases are JSON documents listing WinRT type definitions. The
//! cache merges every loaded database into a sorted namespace map; all
//! emission and planning reads go through it. The cache is immutable once the
//! driver has finished hiding the hand-projected foundation types.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::CoreError;
use crate::filter::ProjectionFilter;

/// Fully-qualified type identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeName {
    pub namespace: String,
    pub name: String,
}

impl TypeName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// A type reference appearing in a signature or field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    /// An ABI primitive: Int32, UInt64, Single, Double, Boolean, String, Guid, Object.
    Primitive(String),
    /// A reference to another metadata type.
    Named(TypeName),
}

impl TypeRef {
    pub fn named(&self) -> Option<&TypeName> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::Primitive(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
}

/// A struct field. Named references embed the complete target type by value,
/// which is what forces definition-level dependencies between namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Enum {
        #[serde(default)]
        flags: bool,
        variants: Vec<EnumVariant>,
    },
    Interface {
        guid: String,
        #[serde(default)]
        methods: Vec<Method>,
        /// Interfaces this interface requires; referenced at definition level.
        #[serde(default)]
        requires: Vec<TypeName>,
    },
    Class {
        #[serde(default)]
        default_interface: Option<TypeName>,
        #[serde(default)]
        interfaces: Vec<TypeName>,
        #[serde(default)]
        fastabi: bool,
    },
    Struct {
        fields: Vec<StructField>,
    },
    Delegate {
        guid: String,
        method: Method,
    },
    Contract {
        version: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
}

/// One type entry as it appears in a database document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseType {
    pub namespace: String,
    pub name: String,
    pub kind: TypeKind,
}

/// An on-disk metadata database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub types: Vec<DatabaseType>,
}

impl Database {
    /// Whether a path looks like a metadata database file.
    pub fn is_database(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "json")
    }

    pub fn read_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CoreError::Database {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// The member bundle of a single namespace. Each list is sorted by type name.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMembers {
    pub enums: Vec<TypeDef>,
    pub interfaces: Vec<TypeDef>,
    pub classes: Vec<TypeDef>,
    pub structs: Vec<TypeDef>,
    pub delegates: Vec<TypeDef>,
    pub contracts: Vec<TypeDef>,
}

impl NamespaceMembers {
    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
            && self.interfaces.is_empty()
            && self.classes.is_empty()
            && self.structs.is_empty()
            && self.delegates.is_empty()
            && self.contracts.is_empty()
    }

    /// Iterate all member types across the six kinds.
    pub fn all_types(&self) -> impl Iterator<Item = &TypeDef> {
        self.enums
            .iter()
            .chain(&self.interfaces)
            .chain(&self.classes)
            .chain(&self.structs)
            .chain(&self.delegates)
            .chain(&self.contracts)
    }

    fn insert(&mut self, def: TypeDef) {
        let list = match def.kind {
            TypeKind::Enum { .. } => &mut self.enums,
            TypeKind::Interface { .. } => &mut self.interfaces,
            TypeKind::Class { .. } => &mut self.classes,
            TypeKind::Struct { .. } => &mut self.structs,
            TypeKind::Delegate { .. } => &mut self.delegates,
            TypeKind::Contract { .. } => &mut self.contracts,
        };
        match list.binary_search_by(|t| t.name.cmp(&def.name)) {
            Ok(existing) => list[existing] = def,
            Err(at) => list.insert(at, def),
        }
    }

    fn remove(&mut self, name: &str) {
        for list in [
            &mut self.enums,
            &mut self.interfaces,
            &mut self.classes,
            &mut self.structs,
            &mut self.delegates,
            &mut self.contracts,
        ] {
            list.retain(|t| t.name != name);
        }
    }
}

/// An input database that was loaded, with the full names it defines.
/// Used to derive the projection filter when references are present.
#[derive(Debug, Clone)]
pub struct LoadedDatabase {
    pub path: PathBuf,
    pub full_names: Vec<String>,
}

/// Merged view over every loaded metadata database.
#[derive(Debug, Default)]
pub struct MetadataCache {
    namespaces: BTreeMap<String, NamespaceMembers>,
    databases: Vec<LoadedDatabase>,
}

impl MetadataCache {
    /// Load and merge the given input and reference databases. Reference types
    /// participate in resolution exactly like input types; what distinguishes
    /// them is the filter the driver derives from the input databases.
    pub fn from_files<'a>(
        inputs: impl IntoIterator<Item = &'a PathBuf>,
        references: impl IntoIterator<Item = &'a PathBuf>,
    ) -> Result<Self, CoreError> {
        let mut cache = Self::default();

        for path in inputs {
            let db = Database::read_from(path)?;
            let full_names = db
                .types
                .iter()
                .map(|t| format!("{}.{}", t.namespace, t.name))
                .collect();
            cache.merge(db);
            cache.databases.push(LoadedDatabase {
                path: path.clone(),
                full_names,
            });
        }

        for path in references {
            let db = Database::read_from(path)?;
            cache.merge(db);
        }

        Ok(cache)
    }

    fn merge(&mut self, db: Database) {
        for entry in db.types {
            self.namespaces.entry(entry.namespace).or_default().insert(TypeDef {
                name: entry.name,
                kind: entry.kind,
            });
        }
    }

    /// Sorted namespace map.
    pub fn namespaces(&self) -> &BTreeMap<String, NamespaceMembers> {
        &self.namespaces
    }

    pub fn members(&self, namespace: &str) -> Option<&NamespaceMembers> {
        self.namespaces.get(namespace)
    }

    /// Input databases, in load order.
    pub fn databases(&self) -> &[LoadedDatabase] {
        &self.databases
    }

    /// Hide a type from projection. Drops the namespace once empty so it can
    /// no longer appear as a dependency-graph node.
    pub fn remove_type(&mut self, namespace: &str, name: &str) {
        if let Some(members) = self.namespaces.get_mut(namespace) {
            members.remove(name);
            if members.is_empty() {
                self.namespaces.remove(namespace);
            }
        }
    }

    /// Whether a namespace has at least one type surviving the filter.
    pub fn is_projected(&self, namespace: &str, filter: &ProjectionFilter) -> bool {
        self.namespaces
            .get(namespace)
            .is_some_and(|members| filter.includes_namespace(namespace, members))
    }
}

/// Expand input specs into database file paths: files are taken as-is,
/// directories are scanned recursively.
pub fn expand_database_paths(specs: &[PathBuf]) -> Result<Vec<PathBuf>, CoreError> {
    let mut paths = Vec::new();

    for spec in specs {
        if spec.is_dir() {
            for entry in WalkDir::new(spec).sort_by_file_name() {
                let entry = entry.map_err(|e| CoreError::Metadata(e.to_string()))?;
                if entry.file_type().is_file() && Database::is_database(entry.path()) {
                    paths.push(entry.path().to_path_buf());
                }
            }
        } else if Database::is_database(spec) {
            paths.push(spec.clone());
        } else {
            return Err(CoreError::Metadata(format!(
                "'{}' is not a metadata database",
                spec.display()
            )));
        }
    }

    paths.dedup();
    Ok(paths)
}

/// The runtime library hand-projects these types; they are hidden from the
/// cache before any emission so the generator never re-emits them.
pub fn remove_foundation_types(cache: &mut MetadataCache) {
    for name in [
        "DateTime",
        "EventRegistrationToken",
        "HResult",
        "Point",
        "Rect",
        "Size",
        "TimeSpan",
    ] {
        cache.remove_type("Windows.Foundation", name);
    }

    for name in [
        "Matrix3x2",
        "Matrix4x4",
        "Plane",
        "Quaternion",
        "Vector2",
        "Vector3",
        "Vector4",
    ] {
        cache.remove_type("Windows.Foundation.Numerics", name);
    }
}
