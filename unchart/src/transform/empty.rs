use serde_yaml::{Mapping, Value};

use crate::{manifest::Overlay, resmap::Resources};

use super::Transformer;

/// Removes null values and empty mappings recursively from every document,
/// cascading the deletion upward when a submap empties out.
#[derive(Default)]
pub struct EmptyTransformer(());

impl Transformer for EmptyTransformer {
    fn name(&self) -> &'static str {
        "empty"
    }

    #[tracing::instrument(skip_all, name = "empty_transform")]
    fn transform(
        &mut self,
        _overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        for resource in resources.map.iter_mut() {
            prune_mapping(resource.root_mut());
        }
        Ok(())
    }
}

/// Returns whether the mapping is empty once pruned.
///
/// Lists of mappings keep the reference behavior: if any element prunes to
/// empty, the key holding the whole list is deleted, not just that element.
pub(crate) fn prune_mapping(map: &mut Mapping) -> bool {
    let keys: Vec<Value> = map.keys().cloned().collect();

    for key in keys {
        let remove = match map.get_mut(&key) {
            Some(Value::Mapping(submap)) => submap.is_empty() || prune_mapping(submap),
            Some(Value::Sequence(seq)) => {
                let mut any_empty = false;
                for item in seq.iter_mut() {
                    if let Value::Mapping(submap) = item {
                        if prune_mapping(submap) {
                            any_empty = true;
                        }
                    }
                }
                any_empty
            }
            Some(Value::Null) => true,
            _ => false,
        };

        if remove {
            map.remove(&key);
        }
    }

    map.is_empty()
}
