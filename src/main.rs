//! blendshape CLI
//!
//! Command-line interface for decoding morph targets, rebuilding them from
//! quantized GPU buffers and inspecting which layout a version set selects.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use blendshape_export::{JsonExportOptions, JsonExporter};
use blendshape_parsers::{
    logging::instrument_parse, log_parse_complete, log_parse_start, AssetReader, DeltaRecord,
    FeatureStream, Game, LayoutTable, LodMorphPayload, MorphTargetAsset, MorphTargetParser,
    ParseOptions, Parser as ParserTrait, QuantizedMorphBuffer, SkipProperties, VersionContext,
};

/// blendshape - morph target decoder and inspector
#[derive(Parser)]
#[command(name = "blendshape")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for summaries
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a serialized morph target export
    Decode(DecodeArgs),

    /// Rebuild one morph's deltas from a quantized GPU buffer (JSON)
    Reconstruct(ReconstructArgs),

    /// Show the LOD layout a version set selects
    Layout(LayoutArgs),
}

#[derive(Args)]
struct VersionArgs {
    /// Version context file (JSON or YAML); newest epochs when omitted
    #[arg(long)]
    versions: Option<PathBuf>,

    /// Override the game the package was cooked for
    #[arg(long)]
    game: Option<Game>,
}

impl VersionArgs {
    fn load(&self) -> Result<VersionContext> {
        let mut versions = match &self.versions {
            Some(path) => VersionContext::from_file(path)
                .with_context(|| format!("Failed to load version context {:?}", path))?,
            None => VersionContext::latest(),
        };
        if let Some(game) = self.game {
            versions.game = game;
        }
        Ok(versions)
    }
}

#[derive(Args)]
struct DecodeArgs {
    /// Serialized morph target export
    #[arg(short, long)]
    input: PathBuf,

    #[command(flatten)]
    versions: VersionArgs,

    /// Bytes of object properties preceding the morph payload
    #[arg(long, default_value = "0")]
    offset: u64,

    /// Accept booleans other than 0 or 1
    #[arg(long)]
    lenient: bool,

    /// Write the decoded asset as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Omit the metadata wrapper from JSON output
    #[arg(long)]
    no_metadata: bool,

    /// Compact JSON output
    #[arg(long)]
    compact: bool,
}

#[derive(Args)]
struct ReconstructArgs {
    /// Quantized morph buffer as JSON
    #[arg(short, long)]
    buffer: PathBuf,

    /// Morph index within the buffer
    #[arg(short, long)]
    morph: usize,

    /// Section indices to attach to the payload
    #[arg(long, value_delimiter = ',')]
    sections: Vec<i32>,

    /// Write the payload JSON to this path instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Omit the metadata wrapper from JSON output
    #[arg(long)]
    no_metadata: bool,

    /// Compact JSON output
    #[arg(long)]
    compact: bool,
}

#[derive(Args)]
struct LayoutArgs {
    #[command(flatten)]
    versions: VersionArgs,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_thread_ids(verbosity >= 3)
        .with_file(verbosity >= 3)
        .with_line_number(verbosity >= 3)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Decode(args) => cmd_decode(args, cli.format),
        Commands::Reconstruct(args) => cmd_reconstruct(args),
        Commands::Layout(args) => cmd_layout(args, cli.format),
    }
}

fn exporter(no_metadata: bool, compact: bool) -> JsonExporter {
    JsonExporter::with_options(JsonExportOptions {
        pretty: !compact,
        include_metadata: !no_metadata,
    })
}

fn cmd_decode(args: DecodeArgs, format: OutputFormat) -> Result<()> {
    let path = &args.input;
    if !path.exists() {
        bail!("File not found: {:?}", path);
    }

    let versions = args.versions.load()?;
    let options = ParseOptions {
        strict_validation: !args.lenient,
        ..ParseOptions::default()
    };
    let parser = MorphTargetParser::new(versions);

    log_parse_start!(parser.name(), path);
    let start = std::time::Instant::now();
    let asset = instrument_parse(parser.name(), || decode_file(&parser, path, args.offset, &options))
        .with_context(|| format!("Failed to decode {:?}", path))?;
    log_parse_complete!(parser.name(), start.elapsed(), asset.lod_count());

    if let Some(output) = &args.output {
        exporter(args.no_metadata, args.compact)
            .export_morph_target(&asset, output)
            .with_context(|| format!("Failed to write {:?}", output))?;
        info!(path = %output.display(), "Wrote morph target JSON");
    }

    print_asset(path, &asset, format)
}

fn decode_file(
    parser: &MorphTargetParser,
    path: &Path,
    offset: u64,
    options: &ParseOptions,
) -> Result<MorphTargetAsset> {
    if offset == 0 {
        return Ok(parser.parse_file_with_options(path, options, None)?);
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let valid_pos = bytes.len() as u64;
    debug!(offset, valid_pos, "Skipping object properties");

    let mut reader =
        AssetReader::with_options(Cursor::new(bytes), parser.versions().clone(), options.clone());
    Ok(MorphTargetAsset::decode(
        &mut reader,
        valid_pos,
        &mut SkipProperties(offset),
    )?)
}

fn print_asset(path: &Path, asset: &MorphTargetAsset, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let lods: Vec<_> = asset
                .lod_models
                .iter()
                .map(|lod| {
                    serde_json::json!({
                        "vertex_count": lod.vertices.len(),
                        "num_base_mesh_verts": lod.num_base_mesh_verts,
                        "section_indices": lod.section_indices,
                        "generated_by_engine": lod.generated_by_engine,
                        "stripped": lod.is_stripped(),
                        "source_filename": lod.source_filename,
                    })
                })
                .collect();
            let json = serde_json::json!({
                "type": "Morph Target",
                "path": path,
                "lod_count": asset.lod_count(),
                "vertex_count": asset.total_vertex_count(),
                "empty": asset.is_empty(),
                "lods": lods,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }

        OutputFormat::Text => {
            println!("Morph Target: {:?}", path);
            println!("  LODs:               {}", asset.lod_count());
            println!("  Total deltas:       {}", asset.total_vertex_count());

            for (i, lod) in asset.lod_models.iter().enumerate() {
                println!("\n  LOD {}:", i);
                println!("    Deltas:           {}", lod.vertices.len());
                println!("    Base mesh verts:  {}", lod.num_base_mesh_verts);
                println!("    Sections:         {:?}", lod.section_indices);
                println!("    Engine generated: {}", lod.generated_by_engine);
                if lod.is_stripped() {
                    println!("    Source deltas stripped for cooked build");
                }
                if let Some(name) = &lod.source_filename {
                    println!("    Source file:      {}", name);
                }
                if let Some(largest) = largest_delta(&lod.vertices) {
                    println!(
                        "    Largest offset:   {:.4} (vertex {})",
                        largest.position_delta.length(),
                        largest.source_index
                    );
                }
            }
        }
    }

    Ok(())
}

fn largest_delta(vertices: &[DeltaRecord]) -> Option<&DeltaRecord> {
    vertices
        .iter()
        .max_by(|a, b| a.position_delta.length().total_cmp(&b.position_delta.length()))
}

fn cmd_reconstruct(args: ReconstructArgs) -> Result<()> {
    let text = fs::read_to_string(&args.buffer)
        .with_context(|| format!("Failed to read {:?}", args.buffer))?;
    let buffer: QuantizedMorphBuffer = serde_json::from_str(&text)
        .with_context(|| format!("Invalid quantized morph buffer {:?}", args.buffer))?;

    info!(
        morphs = buffer.morph_count(),
        batches = buffer.morph_data.len(),
        "Loaded quantized morph buffer"
    );

    let lod = LodMorphPayload::reconstruct(&buffer, args.morph, args.sections)
        .with_context(|| format!("Failed to reconstruct morph {}", args.morph))?;

    let exporter = exporter(args.no_metadata, args.compact);
    match &args.output {
        Some(output) => {
            exporter
                .export_lod(&lod, output)
                .with_context(|| format!("Failed to write {:?}", output))?;
            info!(path = %output.display(), deltas = lod.vertices.len(), "Wrote LOD payload JSON");
        }
        None => println!("{}", exporter.lod_to_string(&lod)?),
    }

    Ok(())
}

fn cmd_layout(args: LayoutArgs, format: OutputFormat) -> Result<()> {
    let versions = args.versions.load()?;
    let thresholds = &versions.thresholds;
    let layout = LayoutTable::compile(thresholds).select(&versions)?;

    let packed_tangents = DeltaRecord::uses_legacy_tangent(&versions);
    // Streams that were never registered stay unknown rather than failing
    let strippable = versions
        .is_at_least(
            FeatureStream::Ue5PrivateFrostyStream,
            thresholds.strip_morph_target_source_data_for_cooked_builds,
        )
        .ok();
    let source_filename = versions
        .is_at_least(FeatureStream::FortniteMain, thresholds.morph_target_custom_import)
        .ok();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "layout": layout.to_string(),
                "game": versions.game,
                "object_version": versions.object_version,
                "packed_tangents": packed_tangents,
                "strippable": strippable,
                "source_filename": source_filename,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }

        OutputFormat::Text => {
            let show = |v: Option<bool>| v.map_or_else(|| "unknown".to_string(), |b| b.to_string());
            println!("Layout:               {}", layout);
            println!("  Game:               {}", versions.game);
            println!("  Object version:     {}", versions.object_version);
            for stream in FeatureStream::ALL {
                let epoch = versions
                    .custom_version(stream)
                    .map_or_else(|_| "unresolved".to_string(), |v| v.to_string());
                println!("  {:<38}{}", stream.name(), epoch);
            }
            println!("  Packed tangents:    {}", packed_tangents);
            println!("  Strippable:         {}", show(strippable));
            println!("  Source filename:    {}", show(source_filename));
        }
    }

    Ok(())
}
