//! CLI binary for format-converter.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConverterConfig`, drives a `ConversionSession`, and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use format_converter::{
    catalog, ConversionProgressCallback, ConversionSession, ConversionType, Converter,
    ConverterConfig, ProgressCallback, UploadedFile, DEFAULT_BASE_URL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn accent(t: &ConversionType, s: &str) -> String {
    format!("\x1b[{}m{s}\x1b[0m", t.accent.ansi_code())
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders the simulated percentage as a 0–100 bar.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, conversion_type: &str, file_name: &str, _size_bytes: u64) {
        self.bar.set_message(format!("{file_name} → {conversion_type}"));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_progress(&self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn on_conversion_complete(&self, _filename: &str, _size_bytes: u64) {
        self.bar.finish_and_clear();
    }

    fn on_conversion_error(&self, _error: &str) {
        self.bar.abandon();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Show the available conversion types
  fconv list

  # HEIC photo to JPG, saved into ./out
  fconv convert image-format photo.heic --to jpg -o out

  # OCR a scan (image → text)
  fconv convert image-to-text-ocr scan.png

  # Machine-readable result
  fconv convert json-csv data.json --json

  # Talk to a local backend
  fconv --base-url http://localhost:5000 convert video-gif clip.mp4

ENVIRONMENT VARIABLES:
  FCONV_BASE_URL      Conversion backend (default: the hosted service)
  FCONV_OUTPUT_DIR    Directory converted files are saved into
  FCONV_TIMEOUT       Request timeout in seconds (default: none)
  RUST_LOG            Overrides the log filter, e.g. RUST_LOG=format_converter=debug
"#;

/// Convert files with a remote conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "fconv",
    version,
    about = "Convert files (JSON/CSV, images, video → GIF, OCR) with a remote conversion service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Conversion backend base URL.
    #[arg(long, global = true, env = "FCONV_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "FCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "FCONV_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available conversion types.
    List {
        /// Print the catalog as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Upload a file and save the converted result.
    Convert {
        /// Conversion type id (see `fconv list`).
        conversion_type: String,

        /// File to convert. Only the first path is uploaded.
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Target format for image-format conversions (default: png).
        #[arg(long = "to", value_name = "FORMAT")]
        target_format: Option<String>,

        /// Directory to save the converted file into.
        #[arg(short, long, env = "FCONV_OUTPUT_DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Request timeout in seconds. No timeout when unset.
        #[arg(long, env = "FCONV_TIMEOUT")]
        timeout: Option<u64>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,

        /// Disable progress bar.
        #[arg(long, env = "FCONV_NO_PROGRESS")]
        no_progress: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = match cli.command {
        Command::Convert {
            json, no_progress, ..
        } => !cli.quiet && !no_progress && !json,
        Command::List { .. } => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::List { json } => print_catalog(json),
        Command::Convert {
            ref conversion_type,
            ref files,
            ref target_format,
            ref output_dir,
            timeout,
            json,
            ..
        } => {
            let progress: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
            } else {
                None
            };

            let mut builder = ConverterConfig::builder()
                .base_url(&cli.base_url)
                .download_dir(output_dir);
            if let Some(secs) = timeout {
                builder = builder.request_timeout_secs(secs);
            }
            if let Some(cb) = progress {
                builder = builder.progress_callback(cb);
            }
            let config = builder.build().context("Invalid configuration")?;
            let converter = Converter::new(config).context("Failed to set up the HTTP client")?;

            let mut session = ConversionSession::new();
            let selected = session.select_type(conversion_type)?;
            if let Some(t) = target_format {
                if !selected.takes_target_format() {
                    eprintln!("{} --to is ignored for '{}'", dim("note:"), selected.id);
                } else if !selected.lists_format(t) {
                    eprintln!(
                        "{} '{}' is not one of [{}]; sending it anyway",
                        dim("note:"),
                        t,
                        selected.formats.join(", ")
                    );
                }
            }
            if files.len() > 1 && !cli.quiet {
                eprintln!(
                    "{} only the first file is converted, {} ignored",
                    dim("note:"),
                    files.len() - 1
                );
            }
            let first = files
                .first()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let upload = UploadedFile::first_of(files.iter().cloned())
                .await
                .with_context(|| format!("Failed to load {first}"))?
                .context("No file given")?;
            if !cli.quiet && !json {
                eprintln!(
                    "{} {}  {}",
                    accent(selected, selected.icon.glyph()),
                    bold(upload.name()),
                    dim(&upload.size_label())
                );
            }
            session.select_file(upload);
            if let Some(t) = target_format {
                session.set_target_format(t.as_str());
            }

            let saved = match session.convert(&converter).await {
                Ok(saved) => saved,
                Err(e) => {
                    if e.is_server_side() {
                        if let Some(status) = e.http_status() {
                            eprintln!(
                                "{} the service rejected the file (HTTP {status})",
                                dim("note:")
                            );
                        }
                    }
                    return Err(anyhow::Error::new(e).context("Conversion failed"));
                }
            };

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&saved).context("Failed to serialise result")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    green("✔"),
                    bold(&saved.path.display().to_string()),
                    dim(&format!("{} bytes", saved.size_bytes))
                );
            }
            Ok(())
        }
    }
}

/// Print the catalog as cards, or as JSON.
fn print_catalog(json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(catalog::all()).context("Failed to serialise catalog")?
        );
        return Ok(());
    }

    for t in catalog::all() {
        println!(
            "{}  {:<30} {}",
            accent(t, t.icon.glyph()),
            bold(t.title),
            dim(t.id)
        );
        println!("   {}", t.description);
        let badges: Vec<String> = t.formats.iter().map(|f| format!("[{f}]")).collect();
        println!("   {}", badges.join(" "));
        if t.takes_target_format() {
            println!("   {}", dim("--to <FORMAT> selects the output format (default: png)"));
        }
        println!();
    }
    Ok(())
}
