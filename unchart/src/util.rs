use serde_yaml::{Mapping, Value};

use crate::manifest::Str;

/// Removes `target_key` from every mapping that sits under a key equal to
/// `parent_key`, anywhere in the tree. Matched submaps are not descended
/// into; everything else is. Absent keys and repeated calls are no-ops.
pub fn remove_key(parent_key: &str, target_key: &str, map: &mut Mapping) {
    for (key, value) in map.iter_mut() {
        match value {
            Value::Mapping(submap) => {
                if key.as_str() == Some(parent_key) {
                    submap.remove(target_key);
                } else {
                    remove_key(parent_key, target_key, submap);
                }
            }
            Value::Sequence(seq) => {
                for item in seq {
                    if let Value::Mapping(submap) = item {
                        remove_key(parent_key, target_key, submap);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Longest literal prefix shared by every name. Comparison is character-wise;
/// no delimiter is assumed. Empty input yields the empty string.
pub fn common_prefix(names: &[Str]) -> Str {
    let mut names: Vec<&str> = names.iter().map(Str::as_str).collect();
    if names.is_empty() {
        return Str::default();
    }

    names.sort_by_key(|name| name.len());

    let mut prefix = names[0];
    for name in &names[1..] {
        let shared: usize = prefix
            .chars()
            .zip(name.chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();
        prefix = &prefix[..shared];
        if prefix.is_empty() {
            break;
        }
    }

    Str::from(prefix)
}

/// Short form of a kind for use in resource filenames, falling back to the
/// kind itself when no abbreviation is known.
pub fn kind_abbreviation(kind: &str) -> Str {
    let lower = kind.to_lowercase();
    match lower.as_str() {
        "certificatesigningrequest" => "csr".into(),
        "clusterrolebinding" => "crb".into(),
        "configmap" => "cm".into(),
        "customresourcedefinition" => "crd".into(),
        "daemonset" => "ds".into(),
        "deployment" => "deploy".into(),
        "endpoint" => "ep".into(),
        "horizontalpodautoscaler" => "hpa".into(),
        "ingress" => "ing".into(),
        "limitrange" => "limits".into(),
        "namespace" => "ns".into(),
        "networkpolicy" => "netpol".into(),
        "persistentvolume" => "pv".into(),
        "persistentvolumeclaim" => "pvc".into(),
        "poddisruptionbudget" => "pdb".into(),
        "podsecuritypolicy" => "psp".into(),
        "replicaset" => "rs".into(),
        "replicationcontroller" => "rc".into(),
        "resourcequota" => "quota".into(),
        "rolebinding" => "rb".into(),
        "service" => "svc".into(),
        "serviceaccount" => "sa".into(),
        _ => lower.into(),
    }
}

/// Stable output filename for a resource: `{prefix}/{name}-{abbrev}.yaml`,
/// lowercased, with `:` normalized to `-`.
pub fn resource_file_name(path_prefix: &str, name: &str, kind: &str) -> Str {
    let name = name.replace(':', "-");
    let abbrev = kind_abbreviation(kind);
    format!("{path_prefix}/{name}-{abbrev}.yaml").to_lowercase().into()
}
