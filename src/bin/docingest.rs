//! CLI binary for docingest.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! [`Pipeline`] and prints the payload.

use anyhow::{Context, Result};
use clap::Parser;
use docingest::handler::run_with_deadline;
use docingest::{
    ConversionRequest, DeliveryMode, FsObjectStore, HttpEngine, Payload, Pipeline, PipelineConfig,
    ResponseShape, Source,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a remote document to Markdown on stdout
  docingest https://example.com/report.pdf

  # Write to a file, with OCR over page images
  docingest --ocr https://example.com/scan.pdf -o scan.md

  # Structured output instead of Markdown
  docingest --structured https://example.com/report.pdf -o report.json

  # Convert an object from a directory-backed store and write the result
  # back at the derived key (input/ -> output/, extension -> .md)
  docingest --store-root ./data --bucket docs input/report.pdf

  # Bound the whole invocation
  docingest --deadline 25 https://example.com/big.pdf

SUPPORTED FORMATS:
  pdf, png, jpeg, pptx, docx, xlsx, html, epub

ENVIRONMENT VARIABLES:
  DOCINGEST_ENGINE_URL   Conversion sidecar base URL
  DOCINGEST_STORE_ROOT   Directory backing the object store
"#;

/// Convert documents from URLs or object storage to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "docingest",
    version,
    about = "Convert documents (pdf, office, images, html, epub) to Markdown or structured JSON",
    long_about = "Fetch a document from a URL or a directory-backed object store, convert it \
through a conversion sidecar, and print or store the result. Every failure maps to a stable \
status category (fetch 502, unsupported format 400, engine 500, timeout 504).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// HTTP(S) URL of the document, or an object key when --bucket is set.
    input: String,

    /// Write the payload to this file instead of stdout.
    #[arg(short, long, env = "DOCINGEST_OUTPUT")]
    output: Option<PathBuf>,

    /// Request the structured mapping instead of Markdown.
    #[arg(long)]
    structured: bool,

    /// Run OCR passes over page images.
    #[arg(long, env = "DOCINGEST_OCR")]
    ocr: bool,

    /// Conversion sidecar base URL.
    #[arg(
        long,
        env = "DOCINGEST_ENGINE_URL",
        default_value = "http://localhost:3001"
    )]
    engine_url: String,

    /// Directory backing the object store.
    #[arg(long, env = "DOCINGEST_STORE_ROOT")]
    store_root: Option<PathBuf>,

    /// Treat INPUT as an object key in this bucket; the converted document
    /// is written back at the derived output key.
    #[arg(long, env = "DOCINGEST_BUCKET", requires = "store_root")]
    bucket: Option<String>,

    /// Engine worker hint (1-64).
    #[arg(long, env = "DOCINGEST_WORKERS", default_value_t = 8)]
    workers: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCINGEST_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Overall invocation deadline in seconds (default: unbounded).
    #[arg(long, env = "DOCINGEST_DEADLINE")]
    deadline: Option<u64>,

    /// Directory to create scratch space under (default: system temp).
    #[arg(long, env = "DOCINGEST_SCRATCH_ROOT")]
    scratch_root: Option<PathBuf>,

    /// Print the full outcome (payload + metadata) as JSON.
    #[arg(long, env = "DOCINGEST_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "DOCINGEST_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCINGEST_VERBOSE")]
    verbose: bool,

    /// Suppress everything except errors and the payload.
    #[arg(short, long, env = "DOCINGEST_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the feedback channel while it is active; library logs
    // only appear with --verbose or when the spinner is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build the pipeline ───────────────────────────────────────────────
    let mut builder = PipelineConfig::builder()
        .engine_workers(cli.workers)
        .download_timeout_secs(cli.download_timeout);
    if let Some(secs) = cli.deadline {
        builder = builder.deadline_secs(secs);
    }
    if let Some(ref root) = cli.scratch_root {
        builder = builder.scratch_root(root);
    }
    let config = builder.build().context("Invalid configuration")?;

    let engine = Arc::new(HttpEngine::new(&cli.engine_url));
    let mut pipeline = Pipeline::new(engine, config);
    if let Some(ref root) = cli.store_root {
        pipeline = pipeline.with_store(Arc::new(FsObjectStore::new(root)));
    }

    let shape = if cli.structured {
        ResponseShape::Structured
    } else {
        ResponseShape::Markdown
    };

    let (request, delivery) = if let Some(ref bucket) = cli.bucket {
        let source = Source::ObjectRef {
            bucket: bucket.clone(),
            key: cli.input.clone(),
        };
        (
            ConversionRequest::new(source, cli.ocr, shape),
            DeliveryMode::WriteBack,
        )
    } else {
        if !cli.input.starts_with("http://") && !cli.input.starts_with("https://") {
            anyhow::bail!(
                "'{}' is not an HTTP(S) URL; pass --bucket to treat it as an object key",
                cli.input
            );
        }
        (
            ConversionRequest::new(Source::RemoteUrl(cli.input.clone()), cli.ocr, shape),
            DeliveryMode::Inline,
        )
    };

    // ── Run conversion ───────────────────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message("waiting for the engine…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = run_with_deadline(&pipeline, &request, delivery).await;
    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }
    let outcome = result.context("Conversion failed")?;

    // ── Emit ─────────────────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
        );
    } else {
        let text = payload_text(&outcome.payload)?;
        match cli.output {
            Some(ref path) => {
                tokio::fs::write(path, &text)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            None if delivery == DeliveryMode::Inline => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(text.as_bytes())
                    .context("Failed to write to stdout")?;
                if !text.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }
            // Write-back without -o: the store copy is the deliverable.
            None => {}
        }
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{}  {} document  {}  {}ms",
            green("✔"),
            bold(outcome.metadata.kind.extension()),
            dim(&format!("{} bytes in", outcome.metadata.source_bytes)),
            outcome.metadata.timings.total_ms,
        );
        if let Some(ref key) = outcome.stored_at {
            eprintln!("   stored at {}", bold(key));
        }
        if let Some(ref path) = cli.output {
            eprintln!("   wrote {}", bold(&path.display().to_string()));
        }
    }

    Ok(())
}

/// Render a payload for file/stdout output.
fn payload_text(payload: &Payload) -> Result<String> {
    match payload {
        Payload::Markdown(text) => Ok(text.clone()),
        Payload::Structured(map) => {
            serde_json::to_string_pretty(map).context("Failed to serialise structured payload")
        }
    }
}
