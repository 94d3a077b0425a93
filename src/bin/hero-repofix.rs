use anyhow::Result;
use clap::Parser;
use hero::artifacts::core::error::exit_code_of;
use hero::artifacts::core::settings::{DEFAULT_LOG_FILTER, LOG_FILTER_VAR};
use hero::artifacts::migration::{LayoutVersion, Migrator};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hero-repofix",
    version,
    author = "Sami Barbut-Dica",
    about = "Upgrade a repository to the current hero layout",
    long_about = "hero-repofix upgrades the repository rooted in the working directory \
    (or in DIR) so that the current hero can read it. Give the latest layout version the \
    repository is known to work with, or let --heuristic guess it. Known versions: \
    0.02.1, 0.02.2 and 0.03.0 (current).",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[arg(
        index = 1,
        required_unless_present = "heuristic",
        conflicts_with = "heuristic",
        value_name = "SOURCE_VERSION",
        help = "The layout version the repository is in now"
    )]
    source_version: Option<String>,
    #[arg(long, help = "Guess the layout version from what is on disk")]
    heuristic: bool,
    #[arg(short = 'C', value_name = "DIR", help = "Repository root (defaults to the working directory)")]
    directory: Option<PathBuf>,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_FILTER_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(exit_code_of(&error))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = match cli.directory {
        Some(directory) => directory,
        None => std::env::current_dir()?,
    };
    let migrator = Migrator::new(root.into_boxed_path());

    let source = match cli.source_version {
        Some(version) => LayoutVersion::try_parse(&version)?,
        None => {
            let detected = migrator.detect()?;
            println!("Detected layout {detected}");
            detected
        }
    };

    for step in migrator.upgrade_from(source)? {
        if step.changed {
            println!("Upgraded {} -> {}", step.from, step.to);
        } else {
            println!("Already {} compatible, nothing to do", step.to);
        }
    }
    println!("Repository layout is {}", LayoutVersion::CURRENT);

    Ok(())
}
