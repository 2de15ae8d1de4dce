use crate::{
    manifest::{Overlay, Str},
    resmap::Resources,
    util,
};

use super::Transformer;

/// Strips denylisted annotation keys (typically chart lifecycle hooks)
/// wherever they appear under an `annotations` mapping.
pub struct AnnotationTransformer {
    keys: Vec<Str>,
}

impl AnnotationTransformer {
    pub fn new(keys: Vec<Str>) -> Self {
        Self { keys }
    }
}

impl Transformer for AnnotationTransformer {
    fn name(&self) -> &'static str {
        "annotations"
    }

    #[tracing::instrument(skip_all, name = "annotations_transform")]
    fn transform(
        &mut self,
        _overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        for resource in resources.map.iter_mut() {
            for key in &self.keys {
                util::remove_key("annotations", key, resource.root_mut());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resmap::ResourceMap;
    use serde_yaml::Value;

    #[test]
    fn strips_hook_annotations_everywhere() {
        let mut map = ResourceMap::default();
        map.insert(
            serde_yaml::from_str(
                r#"
kind: Job
metadata:
  name: migrate
  annotations:
    helm.sh/hook: post-install
    keep: this
spec:
  template:
    metadata:
      annotations:
        helm.sh/hook: post-install
"#,
            )
            .unwrap(),
        )
        .unwrap();
        let mut resources = Resources {
            map,
            ..Default::default()
        };

        AnnotationTransformer::new(vec!["helm.sh/hook".into()])
            .transform(&mut Overlay::default(), &mut resources)
            .unwrap();

        let job = resources.map.iter().next().unwrap();
        let annotations = job
            .metadata()
            .and_then(|m| m.get("annotations"))
            .and_then(Value::as_mapping)
            .unwrap();
        assert!(!annotations.contains_key("helm.sh/hook"));
        assert!(annotations.contains_key("keep"));

        let nested = job
            .root()
            .get("spec")
            .and_then(Value::as_mapping)
            .and_then(|spec| spec.get("template"))
            .and_then(Value::as_mapping)
            .and_then(|tpl| tpl.get("metadata"))
            .and_then(Value::as_mapping)
            .and_then(|m| m.get("annotations"))
            .and_then(Value::as_mapping)
            .unwrap();
        assert!(nested.is_empty());
    }
}
