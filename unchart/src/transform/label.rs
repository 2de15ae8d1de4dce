use anyhow::bail;
use indexmap::IndexMap;
use serde_yaml::Value;

use crate::{
    manifest::{Overlay, Str},
    resmap::Resources,
    util,
};

use super::Transformer;

/// Strips denylisted label keys, then lifts label pairs shared identically
/// by every labelled document into the overlay descriptor.
pub struct LabelTransformer {
    keys: Vec<Str>,
}

impl LabelTransformer {
    pub fn new(keys: Vec<Str>) -> Self {
        Self { keys }
    }
}

impl Transformer for LabelTransformer {
    fn name(&self) -> &'static str {
        "labels"
    }

    #[tracing::instrument(skip_all, name = "labels_transform")]
    fn transform(
        &mut self,
        overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        self.remove_denied(resources);
        self.factor_common(overlay, resources)
    }
}

impl LabelTransformer {
    fn remove_denied(&self, resources: &mut Resources) {
        for resource in resources.map.iter_mut() {
            for parent in ["matchLabels", "labels"] {
                for key in &self.keys {
                    util::remove_key(parent, key, resource.root_mut());
                }
            }
        }
    }

    /// A pair is common iff every document that carries a `labels` mapping
    /// carries it with the identical value; documents without the mapping
    /// neither seed nor invalidate the set. A null label value disables
    /// factoring for the whole run.
    fn factor_common(&self, overlay: &mut Overlay, resources: &mut Resources) -> anyhow::Result<()> {
        let mut common: Option<IndexMap<Str, Str>> = None;

        for resource in resources.map.iter() {
            let Some(labels) = resource.labels() else {
                continue;
            };

            let mut seen = IndexMap::with_capacity(labels.len());
            for (key, value) in labels {
                let Some(key) = key.as_str() else {
                    bail!("non-string label key in `{}`", resource.id());
                };
                match value {
                    Value::Null => return Ok(()),
                    Value::String(value) => seen.insert(Str::from(key), Str::from(value.as_str())),
                    _ => bail!("label `{key}` of `{}` is not a string", resource.id()),
                };
            }

            match &mut common {
                None => common = Some(seen),
                Some(common) => common.retain(|key, value| seen.get(key) == Some(&*value)),
            }
        }

        let Some(mut common) = common else {
            return Ok(());
        };
        if common.is_empty() {
            return Ok(());
        }

        for resource in resources.map.iter_mut() {
            let Some(labels) = resource.labels_mut() else {
                continue;
            };
            for (key, value) in &common {
                if labels.get(key.as_str()).and_then(Value::as_str) == Some(value.as_str()) {
                    labels.remove(key.as_str());
                }
            }
        }

        common.sort_keys();
        tracing::debug!("factored {} common label(s)", common.len());
        overlay.common_labels = common;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resmap::ResourceMap;

    fn resources(docs: &[&str]) -> Resources {
        let mut map = ResourceMap::default();
        for doc in docs {
            map.insert(serde_yaml::from_str(doc).expect("valid test resource"))
                .expect("unique test resource ids");
        }
        Resources {
            map,
            ..Default::default()
        }
    }

    fn run(keys: &[&str], resources: &mut Resources) -> Overlay {
        let mut overlay = Overlay::default();
        LabelTransformer::new(keys.iter().map(|k| Str::from(*k)).collect())
            .transform(&mut overlay, resources)
            .unwrap();
        overlay
    }

    fn labels_of(resources: &Resources, kind: &str) -> Vec<(String, String)> {
        let resource = resources.map.iter().find(|r| r.kind() == kind).unwrap();
        resource
            .labels()
            .map(|labels| {
                labels
                    .iter()
                    .map(|(k, v)| {
                        (
                            k.as_str().unwrap().to_owned(),
                            v.as_str().unwrap().to_owned(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn factors_labels_shared_by_every_document() {
        let mut resources = resources(&[
            "kind: ConfigMap\nmetadata:\n  name: cm1\n  labels: {app: nginx, version: 1.0.0}",
            "kind: Deployment\nmetadata:\n  name: deploy1\n  labels: {app: nginx, version: 1.0.0}",
            "kind: Service\nmetadata:\n  name: service1\n  labels: {app: nginx, version: 2.0.0}",
        ]);

        let overlay = run(&[], &mut resources);

        assert_eq!(
            overlay.common_labels,
            IndexMap::from([(Str::from("app"), Str::from("nginx"))])
        );
        assert_eq!(
            labels_of(&resources, "ConfigMap"),
            vec![("version".to_owned(), "1.0.0".to_owned())]
        );
        assert_eq!(
            labels_of(&resources, "Service"),
            vec![("version".to_owned(), "2.0.0".to_owned())]
        );
    }

    #[test]
    fn mismatch_anywhere_evicts_the_candidate() {
        let mut resources = resources(&[
            "kind: ConfigMap\nmetadata:\n  name: cm1\n  labels: {app: nginx, version: 1.0.0}",
            "kind: Deployment\nmetadata:\n  name: deploy1\n  labels: {app: my-app, version: 1.0.0}",
            "kind: Service\nmetadata:\n  name: service1\n  labels: {app: nginx, version: 2.0.0}",
        ]);

        let overlay = run(&[], &mut resources);

        assert!(overlay.common_labels.is_empty());
        assert_eq!(labels_of(&resources, "ConfigMap").len(), 2);
    }

    #[test]
    fn absence_of_a_key_evicts_it_too() {
        let mut resources = resources(&[
            "kind: ConfigMap\nmetadata:\n  name: cm1\n  labels: {app: nginx, tier: web}",
            "kind: Service\nmetadata:\n  name: svc1\n  labels: {app: nginx}",
        ]);

        let overlay = run(&[], &mut resources);

        assert_eq!(
            overlay.common_labels,
            IndexMap::from([(Str::from("app"), Str::from("nginx"))])
        );
        assert_eq!(
            labels_of(&resources, "ConfigMap"),
            vec![("tier".to_owned(), "web".to_owned())]
        );
    }

    #[test]
    fn unlabelled_documents_are_passed_through() {
        let mut resources = resources(&[
            "kind: ConfigMap\nmetadata:\n  name: cm1\n  labels: {app: nginx}",
            "kind: ServiceAccount\nmetadata:\n  name: sa1",
            "kind: Service\nmetadata:\n  name: svc1\n  labels: {app: nginx}",
        ]);

        let overlay = run(&[], &mut resources);

        assert_eq!(
            overlay.common_labels,
            IndexMap::from([(Str::from("app"), Str::from("nginx"))])
        );
    }

    #[test]
    fn denylisted_keys_are_stripped_before_factoring() {
        let mut resources = resources(&[
            "kind: Deployment\nmetadata:\n  name: d1\n  labels: {chart: c-0.1.0, app: web}\nspec:\n  selector:\n    matchLabels: {chart: c-0.1.0, app: web}",
            "kind: Service\nmetadata:\n  name: s1\n  labels: {chart: c-0.1.0, app: web}",
        ]);

        let overlay = run(&["chart"], &mut resources);

        assert_eq!(
            overlay.common_labels,
            IndexMap::from([(Str::from("app"), Str::from("web"))])
        );
        let deploy = resources.map.iter().find(|r| r.kind() == "Deployment").unwrap();
        let match_labels = deploy
            .root()
            .get("spec")
            .and_then(Value::as_mapping)
            .and_then(|spec| spec.get("selector"))
            .and_then(Value::as_mapping)
            .and_then(|sel| sel.get("matchLabels"))
            .and_then(Value::as_mapping)
            .unwrap();
        assert!(!match_labels.contains_key("chart"));
        assert!(match_labels.contains_key("app"));
    }

    #[test]
    fn no_common_pairs_leaves_documents_untouched() {
        let mut resources = resources(&[
            "kind: ConfigMap\nmetadata:\n  name: cm1\n  labels: {app: one}",
            "kind: Service\nmetadata:\n  name: svc1\n  labels: {app: two}",
        ]);

        let overlay = run(&[], &mut resources);

        assert!(overlay.common_labels.is_empty());
        assert_eq!(labels_of(&resources, "ConfigMap").len(), 1);
    }
}
