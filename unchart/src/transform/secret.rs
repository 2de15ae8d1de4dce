use anyhow::{Context, ensure};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde_yaml::Value;

use crate::{
    datasource::transform_data_source,
    manifest::{Overlay, SecretGenerator, Str},
    resmap::Resources,
};

use super::Transformer;

/// Replaces every Secret document with a generator entry, decoding the
/// base64 data payload first. A value that fails to decode is fatal to the
/// run and the error names the resource, the key and the raw value.
#[derive(Default)]
pub struct SecretTransformer(());

impl Transformer for SecretTransformer {
    fn name(&self) -> &'static str {
        "secret"
    }

    #[tracing::instrument(skip_all, name = "secret_transform")]
    fn transform(
        &mut self,
        overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        for id in resources.map.ids() {
            if id.kind != "Secret" {
                continue;
            }

            let Some(resource) = resources.map.get(&id) else {
                continue;
            };

            let name = resource
                .metadata_name()
                .map(Str::from)
                .with_context(|| format!("secret `{id}` has no `metadata.name`"))?;

            let ty = resource
                .root()
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("Opaque")
                .into();

            let encoded = super::data_map(resource)?;
            let mut data = IndexMap::with_capacity(encoded.len());
            for (key, value) in encoded {
                let bytes = STANDARD.decode(value.as_bytes()).with_context(|| {
                    format!(
                        "couldn't base64 decode the secret key `{key}` with value `{value}` of `{id}`"
                    )
                })?;
                let decoded = String::from_utf8(bytes).with_context(|| {
                    format!("decoded value of secret key `{key}` of `{id}` is not valid UTF-8")
                })?;
                data.insert(key, Str::from(decoded));
            }

            let sources =
                transform_data_source("secrets", &name, &data, &mut resources.source_files);

            ensure!(
                !overlay
                    .secret_generators
                    .iter()
                    .any(|generator| generator.name == name),
                "duplicate secret generator `{name}`"
            );

            tracing::debug!("extracted secret `{name}`");
            overlay.secret_generators.push(SecretGenerator {
                name,
                ty,
                sources,
            });
            resources.map.remove(&id);
        }

        overlay.secret_generators.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(())
    }
}
