//! The main entry point for the `reptree` command-line application.
//!
//! Parses arguments, runs the replace-then-format pipeline, and maps any
//! failure to a message on stderr and a non-zero exit status.

use clap::CommandFactory;
use reptree::cli::{self, Args};
use reptree::errors::{Error, ErrorKind};
use reptree::formatter::Rustfmt;
use reptree::pipeline::Pipeline;
use std::env;
use std::panic::Location;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    if env::args_os().len() == 1 {
        eprintln!("Replace literal strings in every .rs file under a directory.\n");
        eprintln!("USAGE EXAMPLES:");
        eprintln!("  reptree . foo:bar baz:buzz               # Two replacements, applied in order");
        eprintln!("  reptree --fake src OldClient:NewClient   # Include fake* directories");
        eprintln!("  reptree --no-format . old_name:new_name  # Skip import formatting");
        eprintln!("\nRun 'reptree --help' for all options");
        process::exit(2);
    }

    let args = cli::parse_args();
    init_logging(args.verbose);

    let formatter = Rustfmt::new(args.rustfmt.clone(), args.edition.clone());
    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => fatal(e),
    };

    match Pipeline::new(config, formatter).run() {
        Ok(report) => println!("Success: {:?}", report.elapsed),
        Err(e) => fatal(e),
    }
}

/// Installs the stderr log sink. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "reptree=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Reports `err` and exits.
///
/// Usage errors print the usage line and exit with 2. Everything else prints
/// `Error (<file>:#<line>): <message>` naming the reporting call site and
/// exits with 1.
#[track_caller]
fn fatal(err: Error) -> ! {
    match err.kind() {
        ErrorKind::Usage => {
            eprintln!("error: {err}\n");
            eprintln!("{}", Args::command().render_usage());
            process::exit(2);
        }
        ErrorKind::FileIo | ErrorKind::Traversal | ErrorKind::Format => {
            let caller = Location::caller();
            let file = Path::new(caller.file())
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            eprintln!("Error ({}:#{}): {err}", file, caller.line());
            process::exit(1);
        }
    }
}
