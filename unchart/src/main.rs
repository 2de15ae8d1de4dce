use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use unchart::{Config, manifest::Str};

#[derive(Parser)]
#[command(name = "unchart", version, about = "convert rendered charts into overlay packages")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Convert a directory of rendered manifests into an overlay package.
    Convert {
        /// Directory holding the rendered manifests.
        #[arg(short, long)]
        input: PathBuf,
        /// Directory to write the package to.
        #[arg(short, long)]
        destination: PathBuf,
        /// Release name; a detected name prefix equal to it is not recorded.
        #[arg(long, default_value = "")]
        name: String,
        /// Path prefix for emitted resource files.
        #[arg(long, default_value = "resources")]
        resource_prefix: String,
        /// Comma-separated pass names to skip, e.g. `secret,configmap`.
        #[arg(long, value_delimiter = ',')]
        skip_transformers: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    match args.command {
        Command::Convert {
            input,
            destination,
            name,
            resource_prefix,
            skip_transformers,
        } => {
            let config = Config {
                ignored_prefix: Str::from(name),
                resource_prefix: Str::from(resource_prefix.as_str()),
                skip: skip_transformers
                    .iter()
                    .map(|name| Str::from(name.as_str()))
                    .collect(),
                ..Config::default()
            };

            let manifests = collect_manifests(&input)
                .with_context(|| format!("collecting manifests from {}", input.display()))?;

            let conversion = unchart::convert(
                manifests
                    .iter()
                    .map(|(name, text)| (name.as_str(), text.as_str())),
                &config,
            )?;

            unchart::emit::write_package(&destination, &conversion, &resource_prefix)?;

            tracing::info!(
                "wrote {} resource(s), {} source file(s) and the overlay to {}",
                conversion.resources.len(),
                conversion.source_files.len(),
                destination.display()
            );
        }
    }

    Ok(())
}

/// Gathers `.yaml`/`.yml` files under `dir`, sorted by path so runs are
/// deterministic regardless of directory enumeration order.
fn collect_manifests(dir: &Path) -> anyhow::Result<Vec<(String, String)>> {
    let mut manifests = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml" | "yml")
            ) {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                manifests.push((path.display().to_string(), text));
            }
        }
    }

    manifests.sort();
    Ok(manifests)
}

fn init_tracing() {
    let env = std::env::var("UNCHART_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_new(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
