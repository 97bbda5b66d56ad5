mod logging;

use std::path::PathBuf;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use minipack::{bundle, Config, DuplicatePolicy, OsFileSystem, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "minipack", version, about = "Bundle a CommonJS module graph into one script")]
struct Cli {
    /// Configuration file, relative to the working directory
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the working directory
    #[arg(long, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Record each module once, even when required from several modules
    #[arg(long)]
    dedupe: bool,

    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cwd = match cli.cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir().into_diagnostic()?,
    };
    let cwd = dunce::canonicalize(cwd).into_diagnostic()?;

    let config = Config::load(&cwd.join(&cli.config)).into_diagnostic()?;
    let policy = if cli.dedupe {
        DuplicatePolicy::FirstDiscovery
    } else {
        config.duplicate_policy()
    };

    let output = bundle(&OsFileSystem::default(), &cwd, &config, policy).into_diagnostic()?;
    tracing::info!(path = %output.display(), "done");
    Ok(())
}
