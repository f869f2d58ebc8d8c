use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use vellum::{config, output, site};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "Compile markdown-like documents into component page units")]
#[command(long_about = "\
Compile markdown-like documents into component page units

Your filesystem is the data source. Folders named _0N become navigation
sections, documents become page units, and every image or code block is
stored once under a content hash.

Content structure:

  docs/
  ├── vellum.toml                  # Build config (optional)
  ├── _01_guide/                   # Section folder (navigated, descended)
  │   ├── _1_intro.md              # Ordered document
  │   └── _2_setup.md
  ├── about.md                     # Page at the root level
  ├── about.tsx                    # Override unit (has_custom_tsx: true)
  ├── widget.tsx                   # Standalone unit (page of its own)
  ├── diagrams/                    # Plain folder: images only, no pages
  │   └── flow.png
  └── logo.png                     # Referenced by name from any document

Every document opens with front matter declaring created_at,
last_updated_at, author, and has_custom_tsx, followed by a '# ' title
heading.

Run 'vellum gen-config' to generate a documented vellum.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Output directory (overrides output_root from vellum.toml)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a content directory (or a single document) into page units
    Build {
        /// Content directory or single document
        input: Option<PathBuf>,
    },
    /// Print a stock vellum.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build { input } => {
            let Some(input) = input else {
                println!("Usage: vellum build <input-dir-or-file>");
                std::process::exit(1);
            };
            if !input.exists() {
                eprintln!("Error: Path not found: {}", input.display());
                std::process::exit(1);
            }

            let config = config::load_config(config_root(&input))?;
            let output_root = cli
                .output
                .unwrap_or_else(|| PathBuf::from(&config.output_root));

            println!("==> Building {}", input.display());
            let outcome = site::build_site(&input, &output_root, config)?;
            output::print_build_output(&outcome);
            println!("==> Build complete: {}", output_root.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Where to look for `vellum.toml`: the input itself when it is a directory,
/// its parent when a single document was given.
fn config_root(input: &Path) -> &Path {
    if input.is_dir() {
        input
    } else {
        input.parent().unwrap_or(Path::new("."))
    }
}
