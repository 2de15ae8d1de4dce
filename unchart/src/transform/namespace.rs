use serde_yaml::Value;

use crate::{
    manifest::{Overlay, Str},
    resmap::Resources,
};

use super::Transformer;

/// Factors out `metadata.namespace` when every document that sets one agrees
/// on the same value. Any disagreement leaves all documents untouched.
#[derive(Default)]
pub struct NamespaceTransformer(());

impl Transformer for NamespaceTransformer {
    fn name(&self) -> &'static str {
        "namespace"
    }

    #[tracing::instrument(skip_all, name = "namespace_transform")]
    fn transform(
        &mut self,
        overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        let mut namespace: Option<Str> = None;

        for resource in resources.map.iter() {
            let Some(ns) = resource
                .metadata()
                .and_then(|metadata| metadata.get("namespace"))
                .and_then(Value::as_str)
            else {
                continue;
            };

            match &namespace {
                Some(prev) if prev.as_str() != ns => return Ok(()),
                _ => namespace = Some(Str::from(ns)),
            }
        }

        let Some(namespace) = namespace else {
            return Ok(());
        };

        for resource in resources.map.iter_mut() {
            if let Some(metadata) = resource.metadata_mut() {
                metadata.remove("namespace");
            }
        }

        tracing::debug!("factored namespace `{namespace}`");
        overlay.namespace = Some(namespace);

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

    #[test]
    fn agreeing_namespaces_are_factored() {
        let mut resources = resources(&[
            "kind: ConfigMap\nmetadata: {name: cm, namespace: prod}",
            "kind: Service\nmetadata: {name: svc, namespace: prod}",
            "kind: ClusterRole\nmetadata: {name: role}",
        ]);

        let mut overlay = Overlay::default();
        NamespaceTransformer::default()
            .transform(&mut overlay, &mut resources)
            .unwrap();

        assert_eq!(overlay.namespace.as_deref(), Some("prod"));
        for resource in resources.map.iter() {
            assert!(resource.metadata().unwrap().get("namespace").is_none());
        }
    }

    #[test]
    fn disagreement_leaves_documents_untouched() {
        let mut resources = resources(&[
            "kind: ConfigMap\nmetadata: {name: cm, namespace: prod}",
            "kind: Service\nmetadata: {name: svc, namespace: staging}",
        ]);

        let mut overlay = Overlay::default();
        NamespaceTransformer::default()
            .transform(&mut overlay, &mut resources)
            .unwrap();

        assert_eq!(overlay.namespace, None);
        let cm = resources.map.iter().next().unwrap();
        assert!(cm.metadata().unwrap().contains_key("namespace"));
    }
}
