use crate::{
    manifest::{Overlay, Str},
    resmap::Resources,
    util,
};

use super::Transformer;

/// Infers the longest literal prefix shared by every resource name and
/// records it in the overlay descriptor. Purely descriptive; no document is
/// mutated. A prefix equal to `ignored_prefix` (typically the release name)
/// is not recorded.
pub struct NamePrefixTransformer {
    ignored_prefix: Str,
}

impl NamePrefixTransformer {
    pub fn new(ignored_prefix: Str) -> Self {
        Self { ignored_prefix }
    }
}

impl Transformer for NamePrefixTransformer {
    fn name(&self) -> &'static str {
        "nameprefix"
    }

    #[tracing::instrument(skip_all, name = "nameprefix_transform")]
    fn transform(
        &mut self,
        overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        let names: Vec<Str> = resources
            .map
            .iter()
            .filter_map(|resource| resource.metadata_name().map(Str::from))
            .collect();

        let prefix = util::common_prefix(&names);
        if !prefix.is_empty() && prefix != self.ignored_prefix {
            tracing::debug!("detected name prefix `{prefix}`");
            overlay.name_prefix = prefix;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resmap::ResourceMap;

    fn resources(names: &[&str]) -> Resources {
        let mut map = ResourceMap::default();
        for name in names {
            map.insert(
                serde_yaml::from_str(&format!("kind: ConfigMap\nmetadata: {{name: {name}}}"))
                    .unwrap(),
            )
            .unwrap();
        }
        Resources {
            map,
            ..Default::default()
        }
    }

    fn run(ignored: &str, resources: &mut Resources) -> Overlay {
        let mut overlay = Overlay::default();
        NamePrefixTransformer::new(ignored.into())
            .transform(&mut overlay, resources)
            .unwrap();
        overlay
    }

    #[test]
    fn records_the_shared_prefix() {
        let mut resources = resources(&["prefix-cm1", "prefix-deploy1", "prefix-service1"]);
        let overlay = run("", &mut resources);
        assert_eq!(overlay.name_prefix, "prefix-");
    }

    #[test]
    fn one_outlier_means_no_prefix() {
        let mut resources = resources(&["prefix-cm1", "deploy1", "prefix-service1"]);
        let overlay = run("", &mut resources);
        assert!(overlay.name_prefix.is_empty());
    }

    #[test]
    fn ignored_prefix_is_not_recorded() {
        let mut resources = resources(&["mychart-cm1", "mychart-"]);
        let overlay = run("mychart-", &mut resources);
        assert!(overlay.name_prefix.is_empty());
    }

    #[test]
    fn empty_collection_records_nothing() {
        let mut resources = Resources::default();
        let overlay = run("", &mut resources);
        assert!(overlay.name_prefix.is_empty());
    }
}
