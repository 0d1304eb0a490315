use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use collect_deps::{
    collect, CollectError, CollectOptions, CopyErrorPolicy, DEFAULT_CONVERTER_TOOL,
    DEFAULT_LISTING_TOOL, DEFAULT_SYSTEM_PREFIX,
};

mod logger;

/// Copy the non-system shared libraries an executable depends on into a directory.
#[derive(Parser, Debug)]
#[command(name = "collect-deps", version, about, long_about = None)]
struct Cli {
    /// Executable whose dependencies are collected
    prog: PathBuf,

    /// Directory to copy the libraries into (created if missing)
    dest: PathBuf,

    /// Dependency-listing tool
    #[arg(long = "ldd", env = "COLLECT_DEPS_LDD", default_value = DEFAULT_LISTING_TOOL)]
    listing_tool: String,

    /// Path-conversion helper, used only if it responds to --help
    #[arg(long = "cygpath", env = "COLLECT_DEPS_CYGPATH", default_value = DEFAULT_CONVERTER_TOOL)]
    converter_tool: String,

    /// Libraries under this prefix are not copied (case-insensitive, repeatable)
    #[arg(long = "system-prefix", default_value = DEFAULT_SYSTEM_PREFIX)]
    system_prefixes: Vec<String>,

    /// Log copy failures and continue instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> CollectOptions {
        CollectOptions {
            listing_tool: self.listing_tool.clone(),
            converter_tool: self.converter_tool.clone(),
            system_prefixes: self.system_prefixes.clone(),
            on_copy_error: if self.keep_going {
                CopyErrorPolicy::Skip
            } else {
                CopyErrorPolicy::Abort
            },
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let report = collect(&cli.prog, &cli.dest, &cli.options())
        .with_context(|| format!("Collecting dependencies of {}", cli.prog.display()))?;

    tracing::debug!(
        "{} copied, {} failed, path conversion {}",
        report.copied().len(),
        report.failures(),
        if report.converted_paths { "on" } else { "off" }
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);
    tracing::debug!("{:?}", cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<CollectError>()
                .map_or(2, CollectError::exit_code);
            eprintln!("Error: {:#}", err);
            ExitCode::from(code)
        }
    }
}
