use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type Str = CompactString;

/// The accumulated overlay descriptor: everything factored out of the
/// documents during a run, in the shape of a kustomization manifest. Fields
/// start empty and are populated monotonically by the passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Overlay {
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub name_prefix: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Str>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub common_labels: IndexMap<Str, Str>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        rename = "configMapGenerator"
    )]
    pub config_map_generators: Vec<Generator>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        rename = "secretGenerator"
    )]
    pub secret_generators: Vec<SecretGenerator>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Str>,
}

/// A pinned image reference. `digest` takes precedence over `new_tag` when
/// both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Image {
    pub name: Str,
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub new_tag: Str,
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub digest: Str,
}

/// Instruction to reconstruct a ConfigMap-like object from literal and/or
/// file data sources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generator {
    pub name: Str,
    #[serde(flatten)]
    pub sources: DataSources,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretGenerator {
    pub name: Str,
    #[serde(rename = "type")]
    pub ty: Str,
    #[serde(flatten)]
    pub sources: DataSources,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSources {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub literals: Vec<Str>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Str>,
}
