//! Aceto CLI — run Aceto programs from source files.
//!
//! Exit codes:
//! - 0: Normal termination (running off the curve, or `X`)
//! - 1: Usage errors, unreadable input, uncaught runtime errors
//! - 2: Unterminated string or character literal

mod term;

use std::env;
use std::fs;
use std::process;

use aceto_interp::{run, Options};
use term::TermIo;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut opts = Options::default();
    let mut path: Option<String> = None;

    for arg in &args[1..] {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-F" | "--flush" => opts.flush = true,
            "-e" | "--err-all" => opts.err_all = true,
            "-v" | "--verbose" => opts.verbosity += 1,
            other if other.starts_with('-') => {
                eprintln!("error: unknown option '{other}'");
                eprintln!();
                print_usage();
                process::exit(1);
            }
            other => {
                if path.is_some() {
                    eprintln!("error: exactly one source file expected");
                    process::exit(1);
                }
                path = Some(other.to_string());
            }
        }
    }

    let Some(path) = path else {
        print_usage();
        process::exit(1);
    };

    opts.seed = match seed_from_env() {
        Ok(seed) => seed,
        Err(message) => {
            eprintln!("error: {message}");
            process::exit(1);
        }
    };

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read '{path}': {e}");
            process::exit(1);
        }
    };

    let mut io = TermIo::new();
    if let Err(e) = run(&source, opts, &mut io) {
        eprintln!("error: {e}");
        process::exit(e.exit_code());
    }
}

/// Parse the optional `ACETO_SEED` variable (a decimal u64).
fn seed_from_env() -> Result<Option<u64>, String> {
    match env::var("ACETO_SEED") {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("ACETO_SEED must be a decimal integer, got '{value}'")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(format!("ACETO_SEED: {e}")),
    }
}

fn print_usage() {
    eprintln!("Usage: aceto [options] <file>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -v, --verbose    Trace execution to stderr (repeatable)");
    eprintln!("  -F, --flush      Flush after every print");
    eprintln!("  -e, --err-all    Ignore catch marks (@) and always error out");
    eprintln!("  -h, --help       Show this help");
    eprintln!();
    eprintln!("The ACETO_SEED environment variable (decimal) seeds the PRNG.");
}
