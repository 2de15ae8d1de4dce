use std::{fs, path::Path};

use anyhow::Context;

use crate::{Conversion, util};

/// Name of the overlay descriptor file inside the package.
pub const OVERLAY_FILENAME: &str = "kustomization.yaml";

/// Writes the converted package: one file per remaining resource, every
/// extracted auxiliary file, and the overlay descriptor. The layout follows
/// the filenames already recorded by the listing pass.
pub fn write_package(
    destination: &Path,
    conversion: &Conversion,
    resource_prefix: &str,
) -> anyhow::Result<()> {
    for resource in conversion.resources.iter() {
        let filename = util::resource_file_name(resource_prefix, resource.name(), resource.kind());
        let content = serde_yaml::to_string(resource)
            .with_context(|| format!("serializing resource `{}`", resource.id()))?;
        write_file(&destination.join(filename.as_str()), &content)?;
    }

    for (filename, content) in conversion.source_files.sorted() {
        write_file(&destination.join(filename.as_str()), content)?;
    }

    let overlay = serde_yaml::to_string(&conversion.overlay)
        .context("serializing the overlay descriptor")?;
    write_file(&destination.join(OVERLAY_FILENAME), &overlay)?;

    Ok(())
}

fn write_file(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }

    tracing::debug!("writing {}", path.display());
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}
