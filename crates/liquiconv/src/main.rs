use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use env_logger::Env;

mod artifact;
mod config;
mod convert;
mod error;
mod finder;
mod guard;
mod pipeline;
mod resolver;

use config::Config;
use pipeline::Toolchain;

#[derive(Parser)]
#[command(name = "liquiconv")]
#[command(
    about = "Convert every Liquibase XML changelog in a git checkout to MySQL SQL",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Root of the tree to scan (defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,

    /// Directory liquify jars are cached in (defaults to /tmp)
    #[arg(long, value_name = "PATH", hide = true)]
    artifact_dir: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level shows skipped entries during the walk; RUST_LOG overrides.
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config = Config::new(cli.root, cli.artifact_dir)?;
    log::debug!("Using {config:?}");

    let summary = pipeline::run(&config, &Toolchain::system())?;

    if !summary.converted.is_empty() {
        println!(
            "{} {} migration(s) using {} pom(s), {} jar(s) downloaded",
            "✓".green().bold(),
            summary.converted.len(),
            summary.manifests_resolved,
            summary.downloads
        );
    }
    Ok(())
}
