use anyhow::Context;
use clap::Parser;
use libdepot_core::config::default_preferences_folder;
use libdepot_core::{IndexerConfig, LibrariesIndexer, MatchKey};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "libdepot")]
#[command(about = "Reconcile the library index with installed libraries")]
struct Cli {
    /// Preferences folder holding library_index.json
    #[arg(short, long)]
    prefs: Option<PathBuf>,

    /// Index file (defaults to <prefs>/library_index.json)
    #[arg(short, long)]
    index: Option<PathBuf>,

    /// Writable sketchbook libraries folder
    #[arg(short, long)]
    sketchbook: Option<PathBuf>,

    /// Library folders to scan, in order
    #[arg(short = 'f', long = "folder")]
    folders: Vec<PathBuf>,

    /// Match index entries by the manifest name instead of the folder name
    #[arg(long)]
    match_manifest_name: bool,

    /// Print the merged view as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let prefs = match cli.prefs {
        Some(prefs) => prefs,
        None => default_preferences_folder().context("No preferences folder available")?,
    };

    let mut config = IndexerConfig::new(prefs);
    if let Some(index) = cli.index {
        config = config.with_index_file(index);
    }
    if let Some(sketchbook) = cli.sketchbook {
        config = config.with_sketchbook_libraries_folder(sketchbook);
    }
    if cli.match_manifest_name {
        config = config.with_match_key(MatchKey::ManifestName);
    }

    let mut indexer = LibrariesIndexer::new(config);
    indexer
        .load_index()
        .with_context(|| format!("Failed to load {:?}", indexer.index_file()))?;
    indexer.set_library_folders(cli.folders)?;

    let entries = indexer.entries()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for lib in entries.iter().filter(|lib| lib.is_installed()) {
        println!(
            "{} {}{} -> {}",
            lib.entry.name,
            lib.entry.version,
            if lib.is_read_only() { " (read-only)" } else { "" },
            lib.installed_folder().map(|f| f.display().to_string()).unwrap_or_default()
        );
    }

    let installed = indexer.installed_libraries();
    println!("Installed libraries: {}", installed.len());
    for lib in installed {
        println!(
            "  {} {} [{}]",
            lib.name(),
            lib.version().unwrap_or("legacy"),
            lib.folder().display()
        );
    }

    if let Some(loaded_at) = indexer.loaded_at() {
        println!("Index loaded at {}", loaded_at.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}
