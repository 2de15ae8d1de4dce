use anyhow::{Context, ensure};

use crate::{
    datasource::transform_data_source,
    manifest::{Generator, Overlay, Str},
    resmap::Resources,
};

use super::Transformer;

/// Replaces every ConfigMap document with a generator entry in the overlay
/// descriptor, classifying its data payload into literal, file and env
/// sources. Extracted documents leave the collection for good.
#[derive(Default)]
pub struct ConfigMapTransformer(());

impl Transformer for ConfigMapTransformer {
    fn name(&self) -> &'static str {
        "configmap"
    }

    #[tracing::instrument(skip_all, name = "configmap_transform")]
    fn transform(
        &mut self,
        overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        for id in resources.map.ids() {
            if id.kind != "ConfigMap" {
                continue;
            }

            let Some(resource) = resources.map.get(&id) else {
                continue;
            };

            let name = resource
                .metadata_name()
                .map(Str::from)
                .with_context(|| format!("config map `{id}` has no `metadata.name`"))?;

            let data = super::data_map(resource)?;
            let sources =
                transform_data_source("configmaps", &name, &data, &mut resources.source_files);

            ensure!(
                !overlay
                    .config_map_generators
                    .iter()
                    .any(|generator| generator.name == name),
                "duplicate config map generator `{name}`"
            );

            tracing::debug!("extracted config map `{name}`");
            overlay.config_map_generators.push(Generator { name, sources });
            resources.map.remove(&id);
        }

        overlay
            .config_map_generators
            .sort_by(|a, b| a.name.cmp(&b.name));

        Ok(())
    }
}
