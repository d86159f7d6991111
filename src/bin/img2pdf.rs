//! CLI binary for edgequake-img2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_img2pdf::{
    convert, inspect, ConversionConfig, ConversionOutput, ConversionProgressCallback,
    DecodePolicy, FileOrder, Img2PdfError, OverlayMode, PageSize, ProgressCallback, Variant,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over images, one log line per image.
///
/// The end-of-run summary is printed by `run` from the returned stats.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the image currently being processed.
    image_start: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` reports the image count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Listing images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            image_start: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.image_start
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_images: usize) {
        self.activate_bar(total_images);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_images} image(s)…"))
        ));
    }

    fn on_image_start(&self, _index: usize, _total: usize, file_name: &str) {
        if let Ok(mut t) = self.image_start.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(file_name.to_string());
    }

    fn on_image_complete(&self, index: usize, total: usize, pages: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{pages:>3} page(s)")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs();

        // Keep the log tidy; the full message is in the tracing output.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _total_images: usize, _total_pages: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Image-only PDF from ./input_images (creation-time order, A4 slices)
  img2pdf

  # Searchable PDF with an invisible OCR text layer
  img2pdf scans/ -o output_pdf/course_material_ocr.pdf --ocr

  # One page per image (no slicing), OCR in German
  img2pdf scans/ --variant whole-image-ocr --lang deu

  # US Letter pages, order by file name, skip broken files
  img2pdf scans/ --page-size letter --order name --skip-bad-images

  # Show what would be produced without writing anything
  img2pdf scans/ --dry-run

ORDERING:
  created   File creation time. Where the filesystem has no birth time
            (many Linux setups) the metadata-change time is used instead,
            which renames and chmod can bump. Use --order name if file
            names already encode the page order.
  modified  Last modification time.
  name      File name.

EXIT STATUS:
  0 on success, 1 on any error. Errors are printed as
  error[<Class>]: <message>, where <Class> is one of FilesystemError,
  ImageDecodeError, DegenerateImageError, DocumentError or ConfigError.
  OCR failures never abort the run.

ENVIRONMENT VARIABLES:
  IMG2PDF_*               Every flag has an IMG2PDF_ environment equivalent
  RUST_LOG                Overrides the log filter (e.g. RUST_LOG=debug)
"#;

/// Convert a folder of images into a PDF, optionally with a searchable OCR layer.
#[derive(Parser, Debug)]
#[command(
    name = "img2pdf",
    version,
    about = "Convert a folder of images into a PDF, optionally searchable",
    long_about = "Convert every image in a directory into one PDF. Pages follow file creation \
time; images taller than a page are sliced into page-ratio strips. With --ocr each page \
gets an invisible, searchable text layer produced by tesseract.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory of input images.
    #[arg(env = "IMG2PDF_INPUT", default_value = "input_images")]
    input: PathBuf,

    /// Output PDF path.
    #[arg(short, long, env = "IMG2PDF_OUTPUT", default_value = "output_pdf/output.pdf")]
    output: PathBuf,

    /// Embed an OCR text layer (requires tesseract).
    #[arg(long, env = "IMG2PDF_OCR")]
    ocr: bool,

    /// One page per image instead of page-ratio slices.
    #[arg(long, env = "IMG2PDF_NO_SLICE")]
    no_slice: bool,

    /// Preset combination of slicing and OCR (overrides --ocr / --no-slice).
    #[arg(long, env = "IMG2PDF_VARIANT", value_enum)]
    variant: Option<VariantArg>,

    /// Page size: a4, letter, or WxH in points (e.g. 595x842).
    #[arg(long, env = "IMG2PDF_PAGE_SIZE", default_value = "a4")]
    page_size: String,

    /// Overlay text opacity (0.0–1.0).
    #[arg(long, env = "IMG2PDF_OPACITY", default_value_t = 0.01)]
    opacity: f32,

    /// Overlay font size in points.
    #[arg(long, env = "IMG2PDF_FONT_SIZE", default_value_t = 8,
          value_parser = clap::value_parser!(u32).range(1..))]
    font_size: u32,

    /// Overlay offset from the top-left corner, in points.
    #[arg(long, env = "IMG2PDF_MARGIN", default_value_t = 36.0)]
    margin: f32,

    /// Hide the overlay with text render mode 3 instead of low opacity.
    #[arg(long, env = "IMG2PDF_INVISIBLE_TEXT")]
    invisible_text: bool,

    /// Tesseract language(s), e.g. eng or eng+deu.
    #[arg(long, env = "IMG2PDF_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract executable.
    #[arg(long, env = "IMG2PDF_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Page order.
    #[arg(long, env = "IMG2PDF_ORDER", value_enum, default_value = "created")]
    order: OrderArg,

    /// Skip images that fail to decode instead of aborting.
    #[arg(long, env = "IMG2PDF_SKIP_BAD_IMAGES")]
    skip_bad_images: bool,

    /// List images and planned pages without writing a PDF.
    #[arg(long)]
    dry_run: bool,

    /// Print the result (or dry-run plan) as JSON on stdout.
    #[arg(long, env = "IMG2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "IMG2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMG2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum VariantArg {
    ImageOnly,
    SlicedOcr,
    WholeImageOcr,
}

impl From<VariantArg> for Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::ImageOnly => Variant::ImageOnly,
            VariantArg::SlicedOcr => Variant::SlicedOcr,
            VariantArg::WholeImageOcr => Variant::WholeImageOcr,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrderArg {
    Created,
    Modified,
    Name,
}

impl From<OrderArg> for FileOrder {
    fn from(v: OrderArg) -> Self {
        match v {
            OrderArg::Created => FileOrder::CreationTime,
            OrderArg::Modified => FileOrder::ModifiedTime,
            OrderArg::Name => FileOrder::Name,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.dry_run;
    let filter = log_filter(&cli, show_progress);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let class = e
                .chain()
                .find_map(|c| c.downcast_ref::<Img2PdfError>())
                .map_or("InternalError", Img2PdfError::class);
            eprintln!("{} {:#}", red(&format!("error[{class}]:")), e);
            ExitCode::FAILURE
        }
    }
}

/// Default log level. The progress bar replaces INFO-level library logs but
/// warnings (e.g. tesseract not runnable) still show; --verbose always wins.
fn log_filter(cli: &Cli, show_progress: bool) -> &'static str {
    if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    }
}

fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(cli, progress_cb)?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.dry_run {
        let plans = inspect(&config).context("Failed to inspect input directory")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plans).context("Failed to serialise plan")?
            );
        } else {
            let mut pages = 0;
            for plan in &plans {
                match plan.error {
                    None => {
                        pages += plan.slices.len();
                        println!(
                            "{:<40} {:>5}x{:<5}  → {} page(s)",
                            plan.path.display(),
                            plan.width,
                            plan.height,
                            plan.slices.len()
                        );
                    }
                    Some(ref err) => println!("{:<40} {}", plan.path.display(), red(err)),
                }
            }
            println!("Total: {} image(s) → {} page(s)", plans.len(), pages);
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&config).context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        eprintln!("{}", summary(&output, config.ocr_overlay));
    }

    Ok(())
}

/// Human-readable end-of-run report.
fn summary(output: &ConversionOutput, ocr: bool) -> String {
    let stats = &output.stats;
    let mut text = format!(
        "{}  {}/{} image(s) → {} page(s)  {}ms  →  {}",
        if stats.images_skipped == 0 && stats.ocr_failures == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        stats.images_processed,
        stats.images_found,
        bold(&stats.pages_written.to_string()),
        stats.total_duration_ms,
        bold(&output.output_path.display().to_string()),
    );
    if stats.images_skipped > 0 {
        text.push_str(&format!(
            "\n   {} image(s) skipped",
            red(&stats.images_skipped.to_string())
        ));
    }
    if ocr {
        text.push_str(&format!(
            "\n   OCR: {} page(s) failed  /  {}ms in OCR",
            dim(&stats.ocr_failures.to_string()),
            dim(&stats.ocr_duration_ms.to_string()),
        ));
    }
    text
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let page_size = parse_page_size(&cli.page_size)?;

    let mut builder = ConversionConfig::builder()
        .input_dir(&cli.input)
        .output_path(&cli.output)
        .page_size(page_size)
        .slicing(!cli.no_slice)
        .ocr_overlay(cli.ocr)
        .overlay_opacity(cli.opacity)
        .overlay_font_size(cli.font_size)
        .overlay_margin(cli.margin)
        .overlay_mode(if cli.invisible_text {
            OverlayMode::Invisible
        } else {
            OverlayMode::Translucent
        })
        .ocr_language(&cli.lang)
        .tesseract_binary(&cli.tesseract)
        .file_order(cli.order.into())
        .on_decode_error(if cli.skip_bad_images {
            DecodePolicy::Skip
        } else {
            DecodePolicy::Abort
        });

    if let Some(v) = cli.variant {
        builder = builder.variant(v.into());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build().context("Invalid configuration")?)
}

/// Parse `--page-size` into points.
fn parse_page_size(s: &str) -> Result<PageSize, Img2PdfError> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "a4" => return Ok(PageSize::A4),
        "letter" => return Ok(PageSize::LETTER),
        _ => {}
    }

    let invalid = || {
        Img2PdfError::InvalidConfig(format!(
            "Invalid page size '{s}': expected a4, letter, or WxH in points"
        ))
    };
    let (w, h) = s.split_once('x').ok_or_else(invalid)?;
    let w: f32 = w.trim().parse().map_err(|_| invalid())?;
    let h: f32 = h.trim().parse().map_err(|_| invalid())?;
    if !(w > 0.0 && h > 0.0) {
        return Err(invalid());
    }
    Ok(PageSize::new(w, h))
}
