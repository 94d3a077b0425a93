use anyhow::Result;
use clap::{Parser, Subcommand};
use hero::areas::repository::Repository;
use hero::artifacts::checkout::OverwritePolicy;
use hero::artifacts::core::error::exit_code_of;
use hero::artifacts::core::prompt::StdinPrompter;
use hero::artifacts::core::settings::{DEFAULT_LOG_FILTER, LOG_FILTER_VAR, Settings};
use hero::commands::porcelain::branch::BranchOptions;
use hero::commands::porcelain::commit::CommitOptions;
use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hero",
    version,
    author = "Sami Barbut-Dica",
    about = "A small content-addressed version control tool",
    long_about = "hero records snapshots of a directory as self-certifying commits, \
    tracks them with branches and restores any of them into the working directory.",
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
        short = 'C',
        global = true,
        value_name = "DIR",
        help = "Run as if hero was started in DIR"
    )]
    directory: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Create a new repository",
        long_about = "This command creates the repository layout, a root commit titled \
        'Initial Commit' and a first branch pointing at it."
    )]
    Init {
        #[arg(index = 1, help = "Name of the first branch (defaults to main)")]
        branch: Option<String>,
    },
    #[command(
        name = "add",
        about = "Stage files for the next commit",
        long_about = "This command hashes the given files (directories are expanded recursively) \
        and copies them into the index. If any file cannot be staged, the index is emptied."
    )]
    Add {
        #[arg(required = true, help = "Files or directories to stage")]
        paths: Vec<String>,
    },
    #[command(
        name = "commit",
        about = "Record the index as a new commit",
        long_about = "This command records the staged files as a child of the current position. \
        With paths, exactly those files are committed and the rest of the index stays staged."
    )]
    Commit {
        #[arg(short, long, help = "The commit title (asked for when missing)")]
        title: Option<String>,
        #[arg(short, long, help = "The commit message")]
        message: Option<String>,
        #[arg(
            short,
            long,
            conflicts_with = "paths",
            help = "Stage every file of the current commit again before committing"
        )]
        all: bool,
        #[arg(help = "Commit only these paths")]
        paths: Vec<String>,
    },
    #[command(
        name = "log",
        about = "Show the commit history",
        long_about = "This command walks parent links from the current position, \
        or from the given reference, back to the root commit."
    )]
    Log {
        #[arg(index = 1, help = "Where to start (branch, digest or HEAD)")]
        reference: Option<String>,
    },
    #[command(
        name = "checkout",
        about = "Restore a commit into the working directory",
        long_about = "This command restores every file of the referenced commit and moves \
        the current position. Checking out anything but a branch head detaches it."
    )]
    Checkout {
        #[arg(index = 1, help = "Branch, digest (or unique prefix) or HEAD")]
        reference: String,
        #[arg(short, long, help = "Rewrite files even when they already match")]
        force: bool,
    },
    #[command(
        name = "branch",
        about = "List or create branches",
        long_about = "Without a name, this command lists branches and marks the attached one. \
        With a name, it creates (or, after confirmation, overwrites) that branch."
    )]
    Branch {
        #[arg(index = 1, help = "Name of the branch to create")]
        name: Option<String>,
        #[arg(index = 2, requires = "name", help = "Where the branch points (defaults to HEAD)")]
        reference: Option<String>,
        #[arg(short, long, requires = "name", help = "Overwrite an existing branch without asking")]
        force: bool,
        #[arg(short, long, requires = "name", help = "Check the branch out once created")]
        checkout: bool,
    },
    #[command(
        name = "merge",
        about = "Merge another commit into the working directory",
        long_about = "This command merges the files of the referenced commit with those of the \
        current position and stages the result. Commit afterwards to record it."
    )]
    Merge {
        #[arg(index = 1, help = "Branch, digest or HEAD to merge")]
        reference: String,
    },
    #[command(
        name = "hash-object",
        about = "Print the digest of a file",
        long_about = "This command prints the SHA-256 digest a file would be staged under."
    )]
    HashObject {
        #[arg(index = 1)]
        file: String,
    },
    #[command(
        name = "cat-file",
        about = "Print a stored commit",
        long_about = "This command prints the header and file records of a stored commit, \
        followed by the result of its integrity checks."
    )]
    CatFile {
        #[arg(index = 1, help = "Branch, digest or HEAD")]
        reference: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    colored::control::set_override(std::io::stdout().is_terminal());

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(exit_code_of(&error))
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let root = match cli.directory {
        Some(directory) => directory,
        None => std::env::current_dir()?,
    };
    let mut repository = Repository::new(
        &root,
        Box::new(std::io::stdout()),
        Box::new(StdinPrompter),
        Settings::load_from_env()?,
    )?;

    match cli.command {
        Commands::Init { branch } => repository.init(branch.as_deref()).await?,
        Commands::Add { paths } => repository.add(&paths).await?,
        Commands::Commit {
            title,
            message,
            all,
            paths,
        } => {
            let options = CommitOptions {
                title,
                message,
                all,
                paths,
            };

            repository.commit(&options).await?
        }
        Commands::Log { reference } => repository.log(reference.as_deref()).await?,
        Commands::Checkout { reference, force } => {
            let policy = if force {
                OverwritePolicy::Always
            } else {
                OverwritePolicy::Ask
            };

            repository.checkout(&reference, policy).await?
        }
        Commands::Branch {
            name,
            reference,
            force,
            checkout,
        } => {
            let options = BranchOptions { force, checkout };

            repository
                .branch(name.as_deref(), reference.as_deref(), &options)
                .await?
        }
        Commands::Merge { reference } => repository.merge(&reference).await?,
        Commands::HashObject { file } => repository.hash_object(&file).await?,
        Commands::CatFile { reference } => repository.cat_file(&reference).await?,
    }

    Ok(())
}
