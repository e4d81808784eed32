use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use turnip_dx2cg::{process_file, TranspileConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Folder of compiled shaders, walked recursively
    #[clap(value_parser)]
    folder: PathBuf,
    /// Inserted before the extension of each output file
    #[clap(value_parser, default_value = "_hlsl")]
    suffix: String,
    /// Use glstate.* names and POSITION instead of the UNITY_MATRIX_* names and SV_POSITION
    #[clap(long)]
    legacy: bool,
    /// Tabs to indent spliced programs by
    #[clap(long, value_parser, default_value_t = 3)]
    indent: usize,
}

/// `shader.txt` + `_hlsl` -> `shader_hlsl.txt`
fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match name.rfind('.') {
        Some(dot) => format!("{}{}{}", &name[..dot], suffix, &name[dot..]),
        None => format!("{}{}", name, suffix),
    };
    input.with_file_name(name)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = TranspileConfig {
        legacy: args.legacy,
        indent_depth: args.indent,
    };

    for entry in walkdir::WalkDir::new(&args.folder)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("walk {}", args.folder.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let input = entry.path();
        let output = output_path(input, &args.suffix);
        match process_file(input, &output, &config) {
            Ok(true) => tracing::info!("Processed {}", input.display()),
            Ok(false) => tracing::info!("Skipping {}", input.display()),
            Err(err) => tracing::warn!("Failed to process {}: {}", input.display(), err),
        }
    }

    Ok(())
}
