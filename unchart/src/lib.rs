pub mod datasource;
pub mod emit;
pub mod load;
pub mod manifest;
pub mod resmap;
pub mod resource;
pub mod transform;
pub mod util;

use crate::{
    datasource::SourceFiles,
    manifest::{Overlay, Str},
    resmap::{ResourceMap, Resources},
    transform::Transformer,
};

/// Caller-supplied configuration for a conversion run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Label keys stripped unconditionally before factoring.
    pub label_denylist: Vec<Str>,
    /// Annotation keys stripped unconditionally.
    pub annotation_denylist: Vec<Str>,
    /// A detected name prefix equal to this value is never recorded.
    pub ignored_prefix: Str,
    /// Path prefix applied uniformly to generated resource filenames.
    pub resource_prefix: Str,
    /// Names of passes to leave out of the pipeline.
    pub skip: Vec<Str>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            label_denylist: vec!["chart".into(), "release".into(), "heritage".into()],
            annotation_denylist: vec![
                "helm.sh/hook".into(),
                "helm.sh/hook-weight".into(),
                "helm.sh/hook-delete-policy".into(),
            ],
            ignored_prefix: Str::default(),
            resource_prefix: "resources".into(),
            skip: Vec::new(),
        }
    }
}

impl Config {
    pub fn skips(&self, name: &str) -> bool {
        self.skip.iter().any(|skip| skip.eq_ignore_ascii_case(name))
    }
}

/// Everything a conversion run produces: the reduced document collection,
/// the overlay descriptor, and the extracted auxiliary files.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub resources: ResourceMap,
    pub overlay: Overlay,
    pub source_files: SourceFiles,
}

/// Parses rendered (name, text) pairs and runs the full pipeline over them.
pub fn convert<'a>(
    docs: impl IntoIterator<Item = (&'a str, &'a str)>,
    config: &Config,
) -> anyhow::Result<Conversion> {
    let map = load::load_rendered(docs)?;
    run_pipeline(map, config)
}

/// Runs the configured pipeline over an already-loaded collection.
pub fn run_pipeline(map: ResourceMap, config: &Config) -> anyhow::Result<Conversion> {
    let mut overlay = Overlay::default();
    let mut resources = Resources {
        map,
        source_files: SourceFiles::default(),
    };

    transform::default_pipeline(config).transform(&mut overlay, &mut resources)?;

    Ok(Conversion {
        resources: resources.map,
        overlay,
        source_files: resources.source_files,
    })
}
