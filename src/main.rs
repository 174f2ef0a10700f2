use clap::{Parser, Subcommand};
use markframe::{config, generate, output};
use std::path::PathBuf;

/// Shared arguments for commands that read a site config.
#[derive(clap::Args, Clone)]
struct ConfigArgs {
    /// Site config file (.json or .toml)
    #[arg(default_value = "config.json")]
    config: PathBuf,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once; clap asks for the version a single time.
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "markframe")]
#[command(about = "Static site generator that frames Markdown pages in HTML templates")]
#[command(long_about = "\
Static site generator that frames Markdown pages in HTML templates

Every .md file under the source directory is rendered to HTML, placed inside
the children of the frame element with id=\"main-content\", and written next
to its siblings in the destination. All other files are copied as-is.

Source structure:

  content/
  ├── frame.html                   # Frame template (not copied)
  ├── index.md                     # → index.html
  ├── style.css                    # Copied verbatim
  ├── ignore/                      # Excluded by name
  └── blog/
      ├── post.md                  # → blog/post.html
      └── img-post/
          └── cover.jpg            # Cover image for post.md (og:image)

Page transforms:
  .md links      → .html
  external links → target=\"_blank\"
  <h2>           → trailing anchor link with a slug id
  <title>        → \"<page title> - <hostname>\"
  <head>         → og: and twitter: meta tags

Run 'markframe gen-config' to generate a documented site.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the site into the destination directory
    Build(ConfigArgs),
    /// Validate config and frame resolution without writing output
    Check(ConfigArgs),
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => {
            let site_config = config::load_config(&args.config)?;
            init_thread_pool(&site_config.processing);

            println!(
                "==> Building {} → {}",
                site_config.source.display(),
                site_config.destination.display()
            );
            let source_root = site_config.source.clone();
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_build_event(&event, &source_root) {
                        println!("{}", line);
                    }
                }
            });
            let result = generate::build(&site_config, Some(tx));
            printer.join().ok();
            let summary = result?;
            output::print_build_summary(&summary);

            println!(
                "==> Build complete: {}",
                site_config.destination.display()
            );
        }
        Command::Check(args) => {
            let site_config = config::load_config(&args.config)?;
            println!("==> Checking {}", site_config.source.display());
            let report = generate::check(&site_config)?;
            output::print_check_report(&report);
            if !report.is_ok() {
                return Err(format!("{} page(s) cannot be rendered", report.problems.len()).into());
            }
            println!("==> Site is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
