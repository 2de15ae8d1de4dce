use core::fmt;
use std::ops::Deref;

use anyhow::{Context, bail};
use compact_str::format_compact;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::manifest::Str;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Gvk {
    pub group: Str,
    pub version: Str,
    pub kind: Str,
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}.{}", self.kind, self.version)
        } else {
            write!(f, "{}.{}.{}", self.kind, self.version, self.group)
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResId {
    #[serde(flatten)]
    pub gvk: Gvk,
    pub name: Str,
}

impl Deref for ResId {
    type Target = Gvk;

    fn deref(&self) -> &Self::Target {
        &self.gvk
    }
}

impl fmt::Debug for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.gvk, self.name)
    }
}

/// One structured document being transformed. The `apiVersion`, `kind` and
/// `metadata.name` fields are folded into the immutable [`ResId`]; everything
/// else (including `metadata`) stays in the mutable `root` mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    id: ResId,
    root: Mapping,
}

impl Resource {
    pub fn from_value(value: Value) -> anyhow::Result<Self> {
        let Value::Mapping(mut root) = value else {
            bail!("expected a mapping at the document root");
        };

        let api_version = match root.remove("apiVersion") {
            Some(Value::String(s)) => Str::from(s.as_str()),
            Some(_) => bail!("`apiVersion` must be a string"),
            None => Str::default(),
        };

        let kind = match root.remove("kind") {
            Some(Value::String(s)) => Str::from(s.as_str()),
            Some(_) => bail!("`kind` must be a string"),
            None => bail!("document is missing `kind`"),
        };

        let name = root
            .get("metadata")
            .and_then(Value::as_mapping)
            .and_then(|metadata| metadata.get("name"))
            .and_then(Value::as_str)
            .map(Str::from)
            .with_context(|| format!("document of kind `{kind}` is missing `metadata.name`"))?;

        let (group, version) = api_version
            .split_once('/')
            .map_or((Str::default(), api_version.clone()), |(g, v)| {
                (g.into(), v.into())
            });

        Ok(Resource {
            id: ResId {
                gvk: Gvk {
                    group,
                    version,
                    kind,
                },
                name,
            },
            root,
        })
    }

    pub fn id(&self) -> &ResId {
        &self.id
    }

    pub fn name(&self) -> &Str {
        &self.id.name
    }

    pub fn gvk(&self) -> &Gvk {
        &self.id.gvk
    }

    pub fn kind(&self) -> &Str {
        &self.id.kind
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    pub fn metadata(&self) -> Option<&Mapping> {
        self.root.get("metadata").and_then(Value::as_mapping)
    }

    pub fn metadata_mut(&mut self) -> Option<&mut Mapping> {
        self.root.get_mut("metadata").and_then(Value::as_mapping_mut)
    }

    /// The name as currently present in the document, which a pass may have
    /// pruned away, unlike the one recorded in the identity.
    pub fn metadata_name(&self) -> Option<&str> {
        self.metadata()?.get("name")?.as_str()
    }

    pub fn labels(&self) -> Option<&Mapping> {
        self.metadata()?.get("labels")?.as_mapping()
    }

    pub fn labels_mut(&mut self) -> Option<&mut Mapping> {
        self.metadata_mut()?.get_mut("labels")?.as_mapping_mut()
    }
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        let api_version = if self.id.gvk.group.is_empty() {
            self.id.gvk.version.clone()
        } else {
            format_compact!("{}/{}", self.id.gvk.group, self.id.gvk.version)
        };

        let mut out = Mapping::new();
        if !api_version.is_empty() {
            out.insert(Value::from("apiVersion"), Value::from(api_version.as_str()));
        }
        out.insert(Value::from("kind"), Value::from(self.id.kind.as_str()));
        for (key, value) in &self.root {
            out.insert(key.clone(), value.clone());
        }

        out.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Resource::from_value(value).map_err(serde::de::Error::custom)
    }
}
