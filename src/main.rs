use clap::{Parser, Subcommand};
use mdlatex::config::{self, BuildConfig};
use mdlatex::rewrite::{Pipeline, RewriteOptions};
use mdlatex::{generate, output, scan, tree};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdlatex")]
#[command(about = "Builds a single LaTeX document from a tree of Markdown pages")]
#[command(long_about = "\
Builds a single LaTeX document from a tree of Markdown pages

Each page declares its place in the document in a front-matter block. The
folder layout carries no meaning; the hierarchy comes from the front matter.

  ---
  title: Install                   # Required: pages without a title are skipped
  parent: Guide                    # Title of the page this one belongs under
  grand_parent: Home               # Title of that page's parent
  nav_order: 1                     # Position among siblings (ascending)
  ---

Source structure:

  docs/
  ├── config.toml                  # Build config (optional)
  ├── index.md                     # title: Home
  └── guide/
      ├── index.md                 # title: Guide, parent: Home
      └── install.md               # title: Install, parent: Guide, grand_parent: Home

Pages are written depth-first: a page, then its children in nav_order order.
Each page body is converted by a fixed set of passes: emphasis, lists,
images, tables, headers, links and fenced code.

Run 'mdlatex gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Source directory containing the Markdown pages
    #[arg(long, default_value = "docs", global = true)]
    source: PathBuf,

    /// LaTeX output file
    #[arg(long, default_value = "output.tex", global = true)]
    output: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the source directory and list the pages found
    Scan {
        /// Also write the scan manifest as JSON to this path
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Show the page tree built from front matter
    Tree,
    /// Run the full pipeline: scan → tree → generate
    Build,
    /// Convert every page without writing output
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Scan { manifest: path } => {
            let config = config::load_config(&cli.source)?;
            init_thread_pool(&config.processing);
            let manifest = scan::scan(&cli.source)?;
            if let Some(path) = path {
                let json = serde_json::to_string_pretty(&manifest)?;
                std::fs::write(&path, json)?;
            }
            output::print_scan_output(&manifest, &cli.source);
        }
        Command::Tree => {
            let config = config::load_config(&cli.source)?;
            let root = scan_tree(&cli.source, &config)?;
            output::print_tree(&root, &cli.source);
        }
        Command::Build => {
            let config = config::load_config(&cli.source)?;

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let root = scan_tree(&cli.source, &config)?;
            output::print_tree(&root, &cli.source);

            println!("==> Stage 2: Generating LaTeX → {}", cli.output.display());
            let pipeline = Pipeline::new(RewriteOptions::from_build_config(&config));
            let report = generate::generate(&root, &cli.output, &pipeline, &config.document)?;
            output::print_generate_output(&report, Some(&cli.output));

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let config = config::load_config(&cli.source)?;
            let root = scan_tree(&cli.source, &config)?;
            let pipeline = Pipeline::new(RewriteOptions::from_build_config(&config));
            let report = generate::check(&root, &pipeline)?;
            output::print_generate_output(&report, None);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Scan the source directory and arrange the documents into a page tree.
fn scan_tree(
    source: &Path,
    config: &BuildConfig,
) -> Result<tree::Page, Box<dyn std::error::Error>> {
    init_thread_pool(&config.processing);
    let manifest = scan::scan(source)?;
    Ok(tree::build_tree(manifest.documents)?)
}

/// Route `tracing` output to stderr. `RUST_LOG` overrides the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
