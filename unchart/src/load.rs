use anyhow::Context;
use serde::Deserialize;
use serde_yaml::Value;

use crate::{resmap::ResourceMap, resource::Resource};

/// Builds the resource collection from already-rendered (name, text) pairs.
///
/// Whitespace-only blobs, `NOTES.txt` and `_`-prefixed helper templates are
/// skipped. Each remaining blob may hold several YAML documents; top-level
/// `items` lists are expanded into one entry per item.
pub fn load_rendered<'a>(
    docs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> anyhow::Result<ResourceMap> {
    let mut map = ResourceMap::default();

    for (name, text) in docs {
        if is_helper(name) || text.trim().is_empty() {
            tracing::debug!("skipping rendered manifest `{name}`");
            continue;
        }

        for value in
            parse_documents(text).with_context(|| format!("parsing rendered manifest `{name}`"))?
        {
            let resource = Resource::from_value(value)
                .with_context(|| format!("loading resource from `{name}`"))?;
            map.insert(resource).map_err(anyhow::Error::new)?;
        }
    }

    Ok(map)
}

fn is_helper(name: &str) -> bool {
    let base = name.rsplit('/').next().unwrap_or(name);
    base == "NOTES.txt" || base.starts_with('_')
}

fn parse_documents(text: &str) -> anyhow::Result<Vec<Value>> {
    let mut documents = Vec::new();

    for document in serde_yaml::Deserializer::from_str(text) {
        match Value::deserialize(document)? {
            Value::Null => {}
            Value::Mapping(mut root) => {
                if root.is_empty() {
                    continue;
                }

                if matches!(root.get("items"), Some(Value::Sequence(_))) {
                    if let Some(Value::Sequence(items)) = root.remove("items") {
                        documents.extend(items.into_iter().filter(|item| item.is_mapping()));
                    }
                } else {
                    documents.push(Value::Mapping(root));
                }
            }
            value => anyhow::bail!("expected a mapping at the document root, found `{value:?}`"),
        }
    }

    Ok(documents)
}
