use crate::{
    manifest::{Overlay, Str},
    resmap::Resources,
    util,
};

use super::Transformer;

/// Records the output filename of every document still present. Must run
/// last, after the extracting and pruning passes have settled the collection.
pub struct ResourcesTransformer {
    path_prefix: Str,
}

impl ResourcesTransformer {
    pub fn new(path_prefix: Str) -> Self {
        Self { path_prefix }
    }
}

impl Transformer for ResourcesTransformer {
    fn name(&self) -> &'static str {
        "resources"
    }

    #[tracing::instrument(skip_all, name = "resources_transform")]
    fn transform(
        &mut self,
        overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        for resource in resources.map.iter() {
            overlay.resources.push(util::resource_file_name(
                &self.path_prefix,
                resource.name(),
                resource.kind(),
            ));
        }

        overlay.resources.sort();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resmap::ResourceMap;

    #[test]
    fn lists_every_remaining_document_sorted() {
        let mut map = ResourceMap::default();
        for doc in [
            "kind: Service\nmetadata: {name: app-web}",
            "kind: Deployment\napiVersion: apps/v1\nmetadata: {name: app-web}",
            "kind: CronTab\napiVersion: example.com/v1\nmetadata: {name: tab}",
        ] {
            map.insert(serde_yaml::from_str(doc).unwrap()).unwrap();
        }
        let mut resources = Resources {
            map,
            ..Default::default()
        };

        let mut overlay = Overlay::default();
        ResourcesTransformer::new("resources".into())
            .transform(&mut overlay, &mut resources)
            .unwrap();

        assert_eq!(
            overlay.resources,
            vec![
                "resources/app-web-deploy.yaml",
                "resources/app-web-svc.yaml",
                "resources/tab-crontab.yaml",
            ]
        );
    }

    #[test]
    fn honors_the_configured_path_prefix() {
        let mut map = ResourceMap::default();
        map.insert(
            serde_yaml::from_str("kind: ConfigMap\nmetadata: {name: cm}").unwrap(),
        )
        .unwrap();
        let mut resources = Resources {
            map,
            ..Default::default()
        };

        let mut overlay = Overlay::default();
        ResourcesTransformer::new("manifests/base".into())
            .transform(&mut overlay, &mut resources)
            .unwrap();

        assert_eq!(overlay.resources, vec!["manifests/base/cm-cm.yaml"]);
    }
}
