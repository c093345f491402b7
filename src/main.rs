use clap::{ArgAction, Parser, Subcommand};
use rioyi_crop::imaging::RustBackend;
use rioyi_crop::session::Session;
use rioyi_crop::{config, output, report, scan};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that take a selection.
#[derive(clap::Args, Clone)]
struct SelectionArgs {
    /// Image files or directories of images
    paths: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(long, short)]
    recursive: bool,
}

#[derive(Parser)]
#[command(name = "rioyi-crop")]
#[command(about = "Batch content-aware cropping into fixed-size WebP images")]
#[command(long_about = "\
Batch content-aware cropping into fixed-size WebP images

Every selected image is cropped around its most interesting region (edges,
skin tones, saturated colour), resized to exactly 650x434 and encoded as
lossy WebP at quality 80. Files are saved as:

  <brand>-<YYYY-MM-DD>-<YYYYMMDDHHmmss>-<index>-<name>.webp
  rioyi-dev-2024-06-15-20240615123045-0-beach.webp

An image that cannot be read, decoded or encoded gets an error message and
is skipped; the rest of the batch is still processed.

Directories are expanded to the images they contain (top level only unless
--recursive). Files named explicitly are always attempted.

Set RUST_LOG (e.g. RUST_LOG=rioyi_crop=debug) for detailed logs.
Run 'rioyi-crop gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./rioyi-crop.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop, resize and encode the selection, then save the results
    Process {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Directory the processed images are saved to
        #[arg(long, short, default_value = "cropped")]
        output: PathBuf,

        /// Do not write index.html next to the saved images
        #[arg(long)]
        no_report: bool,

        /// Print the processed images as JSON instead of the messages
        #[arg(long)]
        json: bool,
    },
    /// List what would be processed, without processing
    Check {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Process {
            selection,
            output: dest,
            no_report,
            json,
        } => {
            let cfg = config::load_config(cli.config.as_deref())?;
            init_thread_pool(&cfg.processing);
            let paths = scan::collect_selection(&selection.paths, selection.recursive)?;

            let mut session = Session::new(RustBackend::new(), &cfg);
            session.select(&paths);
            output::print_selection(session.inputs());

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let processed = session.process(Some(tx));
            printer.join().ok();

            if json {
                println!("{}", serde_json::to_string_pretty(&session.output_summaries())?);
            } else {
                output::print_messages(&session.messages());
            }
            // An empty selection is reported through the messages.
            let Ok(count) = processed else {
                return Ok(());
            };
            println!("{}", output::format_summary(count, session.inputs().len()));

            let page = (!no_report).then(|| report::render_session(&session).into_string());
            let saved = session.download_all(&dest)?;
            output::print_download(&saved, &dest);
            if let Some(page) = page {
                std::fs::write(dest.join("index.html"), page)?;
                println!("Report \u{2192} {}", dest.join("index.html").display());
            }
            info!(stats = %session.tracker().stats(), "references");
        }
        Command::Check { selection } => {
            let cfg = config::load_config(cli.config.as_deref())?;
            let paths = scan::collect_selection(&selection.paths, selection.recursive)?;
            let mut session = Session::new(RustBackend::new(), &cfg);
            session.select(&paths);
            output::print_selection(session.inputs());
            println!(
                "==> {}x{} WebP, quality {}, brand {}",
                cfg.output.width, cfg.output.height, cfg.output.quality, cfg.output.brand
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rioyi_crop={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
