//! Core metadata model, projection filter, and settings for winrtgen

pub mod error;
pub mod filter;
pub mod metadata;
pub mod settings;

pub use error::CoreError;
pub use filter::ProjectionFilter;
pub use metadata::{
    remove_foundation_types, Database, DatabaseType, EnumVariant, MetadataCache, Method,
    NamespaceMembers, Param, StructField, TypeDef, TypeKind, TypeName, TypeRef,
};
pub use settings::Settings;
