//! CLI binary for booking-confirm.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `TransformConfig`, runs one document through the pipeline and prints a
//! summary. Any failure exits with status 1.

use anyhow::{Context, Result};
use booking_confirm::{Stage, TransformConfig, TransformOutput, TransformProgressCallback, Transformer};
use clap::Parser;
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
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One spinner for the whole run; each finished stage leaves a log line
/// above it.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl TransformProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{}…", stage.activity()));
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.bar
            .println(format!("  {} {:<9} {}", green("✓"), stage.to_string(), dim(detail)));
    }

    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.bar.println(format!("  {} {}", red("✘"), stage));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scanned PDF export
  confirm --input bookings/R4411.pdf

  # Word document, confirmations written to ./out
  confirm --input booking.docx --output-dir out

  # Verbose logs (raw model replies, token counts)
  confirm --input booking.txt --debug

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY       Anthropic API key (default provider)
  OPENAI_API_KEY          OpenAI API key (with --provider openai)
  BOOKING_LLM_PROVIDER    Override provider (anthropic, openai, gemini, ollama)
  BOOKING_MODEL           Override model ID
  OUTPUT_DIR              Where confirmations are written (default: output)
  PDFIUM_LIB_PATH         Directory containing libpdfium
"#;

/// Turn a booking document into a branded HTML confirmation.
#[derive(Parser, Debug)]
#[command(
    name = "confirm",
    version,
    about = "Turn a booking PDF, Word document or text file into a branded HTML confirmation",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Booking document: .pdf, .docx or .txt.
    #[arg(short, long)]
    input: PathBuf,

    /// Enable DEBUG-level logs (and disable the spinner).
    #[arg(long)]
    debug: bool,

    /// Directory for `<res_id>_confirmation.html`.
    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// LLM provider: anthropic, openai, gemini, ollama.
    #[arg(long, env = "BOOKING_LLM_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID.
    #[arg(long, env = "BOOKING_MODEL")]
    model: Option<String>,

    /// PDF rendering DPI (72–400).
    #[arg(long, env = "BOOKING_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Retries per LLM call (0 = fail fast).
    #[arg(long, env = "BOOKING_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs unless --debug is given.
    let filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    eprintln!("{} {}", bold("◆ Processing"), cli.input.display());

    let progress = (!cli.debug).then(CliProgressCallback::new);
    let mut transformer = Transformer::from_config(config).context("LLM provider setup failed")?;
    if let Some(ref cb) = progress {
        transformer = transformer.with_progress(cb.clone());
    }

    let result = transformer.transform(&cli.input).await;
    if let Some(cb) = progress {
        cb.finish();
    }
    let output = result.context("Transformation failed")?;

    print_summary(&output);
    Ok(())
}

/// Map CLI args to `TransformConfig`.
fn build_config(cli: &Cli) -> Result<TransformConfig> {
    let mut builder = TransformConfig::builder()
        .dpi(cli.dpi)
        .max_retries(cli.max_retries)
        .output_dir(&cli.output_dir);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(output: &TransformOutput) {
    let record = &output.record;

    eprintln!();
    eprintln!("{}", bold("Extracted booking"));
    eprintln!("  Guest:         {}", record.guest_label());
    eprintln!("  Reservation:   {}", record.res_id_or_unknown());
    eprintln!("  Booking type:  {}", record.booking_type);
    eprintln!("  Rooms:         {}", record.rooms.len());
    if record.is_agent() {
        let agent = record
            .agent_info
            .as_ref()
            .and_then(|a| a.agent_name.as_deref())
            .unwrap_or("N/A");
        eprintln!("  Agent:         {agent}");
    }
    if let Some(status) = record.payment_status() {
        eprintln!("  Payment:       {}", status.label());
    }
    if !output.missing_fields.is_empty() {
        eprintln!(
            "  {} missing fields: {}",
            yellow("⚠"),
            output.missing_fields.join(", ")
        );
    }

    for w in &output.confirmation.brand_warnings {
        eprintln!("  {} {}", yellow("⚠"), w);
    }

    eprintln!();
    eprintln!(
        "{} Confirmation saved  →  {}",
        green("✔"),
        bold(&output.confirmation.html_path.display().to_string())
    );
    eprintln!(
        "   {} tokens in  /  {} tokens out",
        dim(&output.stats.input_tokens.to_string()),
        dim(&output.stats.output_tokens.to_string()),
    );
    eprintln!(
        "   {}",
        dim("Open the HTML in a browser and print to PDF (A4) for the guest copy.")
    );
}
