use std::sync::LazyLock;

use compact_str::format_compact;
use indexmap::IndexMap;
use regex::Regex;

use crate::manifest::{DataSources, Str};

static ENV_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Z0-9_]+$").expect("env key pattern"));

/// Auxiliary file contents extracted from config/secret data, keyed by the
/// generated filename. Filenames are namespaced by the owning resource, so
/// collisions only occur if the same resource is extracted twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFiles {
    files: IndexMap<Str, Str>,
}

impl SourceFiles {
    pub fn insert(&mut self, filename: Str, content: Str) -> Option<Str> {
        self.files.insert(filename, content)
    }

    pub fn get(&self, filename: &str) -> Option<&Str> {
        self.files.get(filename)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Str, &Str)> {
        self.files.iter()
    }

    /// Entries in filename order, for byte-identical emission across runs.
    pub fn sorted(&self) -> Vec<(&Str, &Str)> {
        let mut entries: Vec<_> = self.files.iter().collect();
        entries.sort_by_key(|(filename, _)| *filename);
        entries
    }
}

/// Classifies a flat key/value data payload into generator data sources.
///
/// If every key looks like an environment variable name and no value spans
/// multiple lines, the whole payload becomes a single environment file named
/// `{resource_name}.env`. Otherwise each multi-line value is stored as an
/// external file under `{dir}/{resource_name}/{key}` and the remaining
/// entries become `key=value` literals. Output lists are sorted.
pub fn transform_data_source(
    dir: &str,
    resource_name: &str,
    input: &IndexMap<Str, Str>,
    source_files: &mut SourceFiles,
) -> DataSources {
    let mut sources = DataSources::default();
    if input.is_empty() {
        return sources;
    }

    if is_env_bundle(input) {
        let filename = format_compact!("{resource_name}.env");
        source_files.insert(filename.clone(), env_file(input));
        sources.env = Some(filename.clone());

        tracing::debug!("converting `{resource_name}` as environment file `{filename}`");
    } else {
        for (key, value) in input {
            if is_multiline(value) {
                let filename = format_compact!("{dir}/{resource_name}/{key}");
                source_files.insert(filename.clone(), value.clone());
                sources.files.push(filename);
            } else {
                sources.literals.push(format_compact!("{key}={value}"));
            }
        }

        sources.files.sort();
        sources.literals.sort();

        tracing::debug!(
            "converting {} file(s) and {} literal(s) from `{resource_name}`",
            sources.files.len(),
            sources.literals.len()
        );
    }

    sources
}

/// Serializes a flat map as sorted `KEY=value` lines.
fn env_file(input: &IndexMap<Str, Str>) -> Str {
    let mut lines: Vec<Str> = input
        .iter()
        .map(|(key, value)| format_compact!("{key}={value}"))
        .collect();
    lines.sort();
    lines.join("\n").into()
}

fn is_env_bundle(input: &IndexMap<Str, Str>) -> bool {
    input
        .iter()
        .all(|(key, value)| ENV_KEY_PATTERN.is_match(key) && !is_multiline(value))
}

fn is_multiline(s: &str) -> bool {
    s.contains('\n')
}
