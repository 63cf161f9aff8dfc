use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codec::{Codec, OpcodeRegistry, RegistryConfig, TracingSink};
use glob::Pattern;
use structwire_tools::{
    decode_frame_json, format_decode_pretty, inspect_frame, parse_opcode, record_from_json,
    InspectReport,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "structwire-tools",
    version,
    about = "structwire frame inspection and conversion tools"
)]
struct Cli {
    /// Registry JSON to use instead of the built-in legacy table.
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the opcode, bound layout and sizes of a frame.
    Inspect {
        /// Path to a frame file or a directory of frames.
        frame_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected frames.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected frames (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Decode a frame into a record and print it.
    Decode {
        /// Path to the frame bytes.
        frame_file: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
    /// Build a record from JSON and write its frame.
    Encode {
        /// Opcode, decimal or 0x-prefixed hex.
        #[arg(value_parser = parse_opcode)]
        opcode: u16,
        /// Path to the record JSON.
        record_file: PathBuf,
        /// Output path for the frame bytes.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the registry fingerprint.
    Fingerprint,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = load_registry(cli.registry.as_deref()).context("load registry")?;
    let codec = Codec::new(Arc::new(registry));

    match cli.command {
        Command::Inspect {
            frame_path,
            glob,
            sort,
            limit,
        } => {
            if frame_path.is_dir() {
                let entries = collect_frame_entries(&frame_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                for entry in entries {
                    let bytes = fs::read(&entry.path)
                        .with_context(|| format!("read frame {}", entry.path.display()))?;
                    let report =
                        inspect_frame(codec.registry(), &bytes, &wire::Limits::default())?;
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    print_inspect_report(&report);
                }
            } else {
                let bytes = fs::read(&frame_path)
                    .with_context(|| format!("read frame {}", frame_path.display()))?;
                let report = inspect_frame(codec.registry(), &bytes, &wire::Limits::default())?;
                print_inspect_report(&report);
            }
        }
        Command::Decode { frame_file, format } => {
            let bytes = fs::read(&frame_file)
                .with_context(|| format!("read frame {}", frame_file.display()))?;
            let report = decode_frame_json(&codec, &bytes)?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&report).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    print!("{}", format_decode_pretty(&report));
                }
            }
        }
        Command::Encode {
            opcode,
            record_file,
            output,
        } => {
            let contents = fs::read_to_string(&record_file)
                .with_context(|| format!("read record {}", record_file.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&contents).context("parse record json")?;
            let record = record_from_json(codec.registry(), opcode, &value)?;
            let frame = codec
                .encode(opcode, &record, &mut TracingSink)
                .context("encode record")?
                .with_context(|| format!("opcode {opcode:#06x} produced no frame"))?;
            fs::write(&output, &frame)
                .with_context(|| format!("write frame {}", output.display()))?;
            info!(opcode, bytes = frame.len(), path = %output.display(), "wrote frame");
        }
        Command::Fingerprint => {
            println!("{}", codec.registry().fingerprint());
        }
    }
    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<OpcodeRegistry> {
    let Some(path) = path else {
        return legacy_registry::registry().context("build legacy registry");
    };
    let contents =
        fs::read_to_string(path).with_context(|| format!("read registry {}", path.display()))?;
    let config = RegistryConfig::from_json(&contents).context("parse registry json")?;
    config.build().context("build registry")
}

struct FrameEntry {
    path: PathBuf,
    size: u64,
}

fn collect_frame_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<FrameEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(FrameEntry { path, size });
    }
    Ok(entries)
}

fn maybe_sort_entries(mut entries: Vec<FrameEntry>, sort: Option<InspectSort>) -> Vec<FrameEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => {}
    }
    entries
}

fn print_inspect_report(report: &InspectReport) {
    println!(
        "opcode: {:#06x} ({})",
        report.opcode,
        report.name.unwrap_or("unnamed")
    );
    match (&report.record_layout, &report.message_schema) {
        (Some(layout), Some(schema)) => println!("layout: {layout} schema: {schema}"),
        _ => println!("layout: unregistered"),
    }
    println!("payload_len: {} bytes", report.payload_len);
    if let Some(size) = report.record_size {
        println!("record size: {size} bytes");
    }
}
