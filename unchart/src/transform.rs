mod annotation;
mod configmap;
mod empty;
mod image;
mod label;
mod nameprefix;
mod namespace;
mod resources;
mod secret;

pub use self::annotation::AnnotationTransformer;
pub use self::configmap::ConfigMapTransformer;
pub use self::empty::EmptyTransformer;
pub use self::image::ImageTransformer;
pub use self::label::LabelTransformer;
pub use self::nameprefix::NamePrefixTransformer;
pub use self::namespace::NamespaceTransformer;
pub use self::resources::ResourcesTransformer;
pub use self::secret::SecretTransformer;

use anyhow::bail;
use indexmap::IndexMap;
use serde_yaml::Value;

use crate::{
    Config,
    manifest::{Overlay, Str},
    resmap::Resources,
    resource::Resource,
};

/// One sequential step of the pipeline. A pass reads and mutates the shared
/// resource collection and records what it factored out into the overlay
/// descriptor.
pub trait Transformer {
    /// Stable name used to skip the pass from configuration.
    fn name(&self) -> &'static str;

    fn transform(&mut self, overlay: &mut Overlay, resources: &mut Resources)
    -> anyhow::Result<()>;
}

/// Runs passes in order over the same shared state, aborting on the first
/// error. There is no rollback; a failed run leaves the collection partially
/// mutated and must be treated as fatal by the caller.
pub struct MultiTransformer {
    transformers: Vec<Box<dyn Transformer>>,
}

impl MultiTransformer {
    pub fn new(transformers: Vec<Box<dyn Transformer>>) -> Self {
        Self { transformers }
    }
}

impl Transformer for MultiTransformer {
    fn name(&self) -> &'static str {
        "multi"
    }

    fn transform(
        &mut self,
        overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        for transformer in &mut self.transformers {
            tracing::debug!("running transformer `{}`", transformer.name());
            transformer.transform(overlay, resources)?;
        }
        Ok(())
    }
}

/// The default pass order. The listing pass must stay last: it records the
/// filename of every document still present after extraction and pruning.
pub fn default_pipeline(config: &Config) -> MultiTransformer {
    let all: Vec<Box<dyn Transformer>> = vec![
        Box::new(LabelTransformer::new(config.label_denylist.clone())),
        Box::new(AnnotationTransformer::new(
            config.annotation_denylist.clone(),
        )),
        Box::new(NamespaceTransformer::default()),
        Box::new(ImageTransformer::default()),
        Box::new(ConfigMapTransformer::default()),
        Box::new(SecretTransformer::default()),
        Box::new(NamePrefixTransformer::new(config.ignored_prefix.clone())),
        Box::new(EmptyTransformer::default()),
        Box::new(ResourcesTransformer::new(config.resource_prefix.clone())),
    ];

    MultiTransformer::new(
        all.into_iter()
            .filter(|transformer| !config.skips(transformer.name()))
            .collect(),
    )
}

/// Reads a document's flat `data` payload, tolerating an absent or null
/// field. Any other non-mapping shape, and any non-string key or value, is a
/// structural error.
fn data_map(resource: &Resource) -> anyhow::Result<IndexMap<Str, Str>> {
    let data = match resource.root().get("data") {
        None | Some(Value::Null) => return Ok(IndexMap::new()),
        Some(Value::Mapping(data)) => data,
        Some(_) => bail!("`data` of `{}` is not a mapping", resource.id()),
    };

    let mut map = IndexMap::with_capacity(data.len());
    for (key, value) in data {
        let (Some(key), Some(value)) = (key.as_str(), value.as_str()) else {
            bail!(
                "`data` of `{}` contains a non-string entry at key `{key:?}`",
                resource.id()
            );
        };
        map.insert(Str::from(key), Str::from(value));
    }

    Ok(map)
}
