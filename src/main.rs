//! xrobject CLI
//!
//! Command-line interface for exporting scene snapshots to X-Ray `.object`
//! files and inspecting the chunk layout of written files.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

use xrobject_core::Scene;
use xrobject_export::logging::{init_with_config, TracingConfig};
use xrobject_export::{ObjectExportOptions, ObjectExporter};
use xrobject_formats::{Chunk, ChunkReader, ObjectChunk};

/// xrobject - X-Ray object exporter
#[derive(Parser)]
#[command(name = "xrobject")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a node of a scene snapshot to an .object file
    Export(ExportArgs),

    /// List the chunk table of an .object file
    Chunks(ChunksArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Scene snapshot (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Name of the root node to export
    #[arg(short, long)]
    root: String,

    /// Output .object path
    #[arg(short, long)]
    output: PathBuf,

    /// Export options file (JSON); flags below override it
    #[arg(long)]
    options: Option<PathBuf>,

    /// Game textures folder stripped from image paths
    #[arg(long)]
    textures_folder: Option<String>,

    /// Use texture names instead of image paths
    #[arg(long)]
    texname_from_name: bool,

    /// Skip embedded motions
    #[arg(long)]
    no_motions: bool,

    /// Write motion references in the SoC layout
    #[arg(long)]
    soc_sgroups: bool,

    /// Store the written revision back into the scene snapshot
    #[arg(long)]
    update_scene: bool,
}

#[derive(Args)]
struct ChunksArgs {
    /// Path to an .object file
    path: PathBuf,

    /// Also list nested chunks of container sections
    #[arg(short, long)]
    nested: bool,
}

fn setup_logging(verbosity: u8) {
    let mut config = TracingConfig::for_verbosity(verbosity);
    config.show_target = verbosity >= 2;
    config.show_thread_ids = verbosity >= 3;
    init_with_config(config);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Export(args) => cmd_export(args, cli.format),
        Commands::Chunks(args) => cmd_chunks(args, cli.format),
    }
}

fn load_options(args: &ExportArgs) -> Result<ObjectExportOptions> {
    let mut options = match &args.options {
        Some(path) => ObjectExportOptions::load(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => ObjectExportOptions::default(),
    };

    if let Some(folder) = &args.textures_folder {
        options.textures_folder.clone_from(folder);
    }
    if args.texname_from_name {
        options.texname_from_path = false;
    }
    if args.no_motions {
        options.export_motions = false;
    }
    if args.soc_sgroups {
        options.soc_sgroups = true;
    }
    Ok(options)
}

fn cmd_export(args: ExportArgs, format: OutputFormat) -> Result<()> {
    info!("Loading scene: {:?}", args.scene);

    let mut scene = Scene::load(&args.scene).context("Failed to load scene snapshot")?;
    let root = scene
        .find_node(&args.root)
        .with_context(|| format!("No export root named '{}'", args.root))?;

    let exporter = ObjectExporter::with_options(load_options(&args)?);
    let exported = exporter
        .export_file(&scene, root, &args.output)
        .with_context(|| format!("Failed to export '{}'", args.root))?;

    for warning in &exported.warnings {
        warn!("{warning}");
    }

    if args.update_scene {
        let node = scene.node_mut(root)?;
        node.xray
            .get_or_insert_with(Default::default)
            .revision
            .update_from(&exported.revision);
        let text = serde_json::to_string_pretty(&scene)?;
        fs::write(&args.scene, text)
            .with_context(|| format!("Failed to update {}", args.scene.display()))?;
    }

    let size = exported.to_file_bytes().len() as u64;
    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "output": args.output,
                "size": size,
                "stats": exported.stats,
                "revision": exported.revision,
                "warnings": exported.warnings,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Exported '{}' to {}", args.root, args.output.display());
            println!("  Size:      {}", format_size(size));
            println!("  Meshes:    {}", exported.stats.meshes);
            println!("  Materials: {}", exported.stats.materials);
            println!("  Bones:     {}", exported.stats.bones);
            println!("  Armatures: {}", exported.stats.armatures);
            println!("  Owner:     {}", exported.revision.owner);
            if !exported.revision.moder.is_empty() {
                println!("  Modified:  {}", exported.revision.moder);
            }
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct ChunkEntry {
    depth: usize,
    id: u32,
    name: String,
    offset: usize,
    size: usize,
}

fn list_chunks(data: &[u8], depth: usize, nested: bool, entries: &mut Vec<ChunkEntry>) -> Result<()> {
    for chunk in ChunkReader::new(data) {
        let chunk: Chunk<'_> = chunk?;
        let kind = chunk.kind();
        entries.push(ChunkEntry {
            depth,
            id: chunk.id,
            name: kind.name(),
            offset: chunk.offset,
            size: chunk.data.len(),
        });

        if kind == ObjectChunk::Main || (nested && kind.is_container()) {
            list_chunks(chunk.data, depth + 1, nested, entries)?;
        }
    }
    Ok(())
}

fn cmd_chunks(args: ChunksArgs, format: OutputFormat) -> Result<()> {
    let data = fs::read(&args.path).with_context(|| format!("Failed to read {}", args.path.display()))?;
    if data.is_empty() {
        bail!("{} is empty", args.path.display());
    }

    let mut entries = Vec::new();
    list_chunks(&data, 0, args.nested, &mut entries).context("Malformed chunk table")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            println!("{:<8} {:<16} {:<10} {}", "Id", "Chunk", "Offset", "Size");
            println!("{:-<8} {:-<16} {:-<10} {:-<12}", "", "", "", "");
            for entry in &entries {
                let name = format!("{}{}", "  ".repeat(entry.depth), entry.name);
                println!(
                    "{:#06x}   {:<16} {:<10} {}",
                    entry.id,
                    name,
                    entry.offset,
                    format_size(entry.size as u64)
                );
            }
            println!("\nTotal: {} chunks", entries.len());
        }
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrobject_formats::ChunkedWriter;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_list_chunks_descends_into_main() {
        let mut body = ChunkedWriter::new();
        body.put(ObjectChunk::Version.id(), [0x10u8, 0]);
        let mut file = ChunkedWriter::new();
        file.put(ObjectChunk::Main.id(), body);

        let mut entries = Vec::new();
        list_chunks(file.data(), 0, false, &mut entries).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "VERSION");
        assert_eq!(entries[1].depth, 1);
    }

    #[test]
    fn test_cli_parses_export() {
        let cli = Cli::try_parse_from([
            "xrobject", "-vv", "export", "--scene", "s.json", "--root", "box", "-o", "box.object", "--soc-sgroups",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Export(ref a) if a.soc_sgroups && a.root == "box"));
    }
}
