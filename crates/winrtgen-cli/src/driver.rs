//! Top-level driver
//!
//! Linear sequence: load and fix up the metadata cache, derive the filter,
//! fan per-namespace emission out to the task group, then (in module mode)
//! run the planner over the collected dependency map and emit the module
//! interface units in sorted-owner order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use winrtgen_codegen::module_units::{
    write_aggregate_ixx, write_base_h, write_base_ixx, write_module_h, write_namespace_ixx,
    write_numerics_ixx, write_reexport_ixx, write_scc_owner_ixx,
};
use winrtgen_codegen::{plan, NamespaceEmitter};
use winrtgen_core::metadata::expand_database_paths;
use winrtgen_core::{
    remove_foundation_types, MetadataCache, ProjectionFilter, Settings, TypeKind,
};

use crate::component;
use crate::config;
use crate::task_group::TaskGroup;

#[derive(Parser, Debug)]
#[command(name = "winrtgen")]
#[command(about = "Projects Windows Runtime metadata into headers and module interface units", long_about = None)]
pub struct Args {
    /// Metadata database or folder to include in the projection
    #[arg(long, value_name = "SPEC")]
    pub input: Vec<PathBuf>,

    /// Metadata database or folder to reference from the projection
    #[arg(long, value_name = "SPEC")]
    pub reference: Vec<PathBuf>,

    /// Location of the generated projection
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub output: PathBuf,

    /// One or more prefixes to include in the projection
    #[arg(long, value_name = "PREFIX")]
    pub include: Vec<String>,

    /// One or more prefixes to exclude from the projection
    #[arg(long, value_name = "PREFIX")]
    pub exclude: Vec<String>,

    /// Read include/exclude prefixes from a config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Generate the runtime library header unconditionally
    #[arg(long)]
    pub base: bool,

    /// Generate namespace modules; disables the aggregate winrt.ixx
    #[arg(long)]
    pub modules: bool,

    /// Enable support for the fast ABI
    #[arg(long)]
    pub fastabi: bool,

    /// Generate component implementation scaffolding
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = ".")]
    pub component: Option<PathBuf>,

    /// Overwrite existing component scaffolding files
    #[arg(long)]
    pub overwrite: bool,

    /// Run on a single thread to avoid file system issues in batch builds
    #[arg(long)]
    pub synchronous: bool,

    /// Show detailed progress information
    #[arg(long, short)]
    pub verbose: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            input: Vec::new(),
            reference: Vec::new(),
            output: PathBuf::from("."),
            include: Vec::new(),
            exclude: Vec::new(),
            config: None,
            base: false,
            modules: false,
            fastabi: false,
            component: None,
            overwrite: false,
            synchronous: false,
            verbose: false,
        }
    }
}

fn build_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings {
        input: args.input.clone(),
        reference: args.reference.clone(),
        output_folder: args.output.clone(),
        include: args.include.iter().cloned().collect(),
        exclude: args.exclude.iter().cloned().collect(),
        base: args.base,
        modules: args.modules,
        fastabi: args.fastabi,
        verbose: args.verbose,
        synchronous: args.synchronous,
        component_folder: args.component.clone(),
        component_overwrite: args.overwrite,
        ..Settings::default()
    };

    std::fs::create_dir_all(settings.output_folder.join("winrt").join("impl"))
        .with_context(|| format!("creating output folder '{}'", settings.output_folder.display()))?;

    if let Some(config_path) = &args.config {
        let (include, exclude) = config::read_config_file(config_path)?;
        settings.include.extend(include);
        settings.exclude.extend(exclude);
    }

    Ok(settings)
}

/// When references are present, only types defined in the input databases are
/// projected: the prefix sets narrow that set down, and the result becomes an
/// exact include list. Without references the prefix sets are the filter.
fn build_filters(settings: &mut Settings, cache: &MetadataCache) {
    if settings.reference.is_empty() {
        if settings.include.is_empty() && settings.exclude.is_empty() {
            return;
        }
        settings.projection_filter =
            ProjectionFilter::new(settings.include.clone(), settings.exclude.clone());
        return;
    }

    let prefix_filter = ProjectionFilter::new(settings.include.clone(), settings.exclude.clone());
    let mut filtered = BTreeSet::new();
    for database in cache.databases() {
        for full_name in &database.full_names {
            if prefix_filter.includes(full_name) {
                filtered.insert(full_name.clone());
            }
        }
    }

    settings.projection_filter = ProjectionFilter::new(filtered, BTreeSet::new());
}

fn build_fastabi_cache(settings: &mut Settings, cache: &MetadataCache) {
    if !settings.fastabi {
        return;
    }

    for (ns, members) in cache.namespaces() {
        for class in &members.classes {
            if let TypeKind::Class {
                fastabi: true,
                default_interface: Some(default_interface),
                ..
            } = &class.kind
            {
                settings.fastabi_cache.insert(
                    default_interface.full_name(),
                    format!("{}.{}", ns, class.name),
                );
            }
        }
    }
}

pub fn run(args: &Args) -> Result<()> {
    let start = Instant::now();
    let mut settings = build_settings(args)?;

    let inputs = expand_database_paths(&settings.input)?;
    let references = expand_database_paths(&settings.reference)?;
    let mut cache = MetadataCache::from_files(&inputs, &references)?;

    remove_foundation_types(&mut cache);
    build_filters(&mut settings, &cache);
    settings.base = settings.base || settings.reference.is_empty() || settings.modules;
    build_fastabi_cache(&mut settings, &cache);

    if settings.verbose {
        info!("ver:  {}", winrtgen_codegen::GENERATOR_VERSION);
        for file in &inputs {
            info!("in:   {}", file.display());
        }
        for file in &references {
            info!("ref:  {}", file.display());
        }
        info!("out:  {}", settings.output_folder.display());
    }

    if settings.modules {
        write_numerics_ixx(&settings)?;
        write_base_ixx(&settings)?;
    }

    let emitter = NamespaceEmitter::new(&cache, &settings);
    let module_imports: Mutex<BTreeMap<String, Vec<String>>> = Mutex::new(BTreeMap::new());
    let mut aggregate = Vec::new();
    let mut group = TaskGroup::new(settings.synchronous);

    for (ns, members) in cache.namespaces() {
        if members.is_empty() || !settings.projection_filter.includes_namespace(ns, members) {
            continue;
        }

        if !settings.modules {
            aggregate.push(ns.clone());
        }

        let emitter = &emitter;
        let module_imports = &module_imports;
        let modules = settings.modules;
        group.add(move || {
            let imports = emitter
                .emit_namespace(ns, members)
                .with_context(|| format!("emitting namespace '{}'", ns))?;
            if modules {
                module_imports.lock().unwrap().insert(ns.clone(), imports);
            }
            Ok(())
        });
    }

    if settings.base {
        if settings.modules {
            write_module_h(&settings)?;
        }
        write_base_h(&settings)?;
        if !settings.modules {
            write_aggregate_ixx(&settings, &aggregate)?;
        }
    }

    component::write_component_scaffolding(&settings, &cache)?;

    group.get()?;

    if settings.modules {
        let dependencies = module_imports.into_inner().unwrap();
        let module_plan = plan(&dependencies)?;

        for component in &module_plan.components {
            if component.is_singleton() {
                write_namespace_ixx(&settings, &component.owner, &component.external_imports)?;
                continue;
            }

            write_scc_owner_ixx(&settings, &cache, &settings.projection_filter, component)?;
            for member in &component.members {
                if member != &component.owner {
                    write_reexport_ixx(&settings, member, &component.owner)?;
                }
            }
        }
    }

    if settings.verbose {
        info!("time: {}ms", start.elapsed().as_millis());
    }
    Ok(())
}
