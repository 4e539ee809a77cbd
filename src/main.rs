use clap::{Parser, Subcommand};
use image_manifest::config::{self, CliOverrides};
use image_manifest::{generate, logging, output, scan};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-manifest")]
#[command(about = "Write a sorted images.json manifest for an image directory")]
#[command(long_about = "\
Write a sorted images.json manifest for an image directory

Lists the entries of the directory (not recursively), keeps the ones whose
name ends with a recognized image suffix, sorts them by byte order, and
writes them as a JSON array to images.json inside the same directory.

  images/
  ├── config.toml     # Optional settings (see gen-config)
  ├── images.json     # Written by this tool, replaced on every run
  ├── A.JPG           # Listed
  ├── a.png           # Listed
  └── notes.txt       # Ignored

Recognized suffixes (case-sensitive):
  .jpg .jpeg .png .gif .JPG .JPEG .PNG .GIF

Run with no arguments to generate images/images.json.")]
#[command(version)]
struct Cli {
    /// Directory to scan; the manifest is written inside it
    #[arg(long, default_value = "images", global = true)]
    dir: PathBuf,

    /// Manifest file name (overrides config.toml)
    #[arg(long, global = true)]
    output: Option<String>,

    /// Number of names shown in the summary (overrides config.toml)
    #[arg(long, global = true)]
    preview: Option<usize>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Scan the directory and write the manifest (default)
    Generate,
    /// List the images that would be written, without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let overrides = CliOverrides {
        output: cli.output,
        preview_count: cli.preview,
    };

    match cli.command.unwrap_or(Command::Generate) {
        Command::Generate => {
            let config = config::load_config(&cli.dir, &overrides)?;
            let generated = generate::generate(&cli.dir, &config)?;
            output::print_generate_output(
                &generated.manifest,
                &config.output,
                config.preview_count,
            );
        }
        Command::Check => {
            let config = config::load_config(&cli.dir, &overrides)?;
            let manifest = scan::scan(&cli.dir, &config.extensions)?;
            output::print_check_output(&manifest, &cli.dir);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
