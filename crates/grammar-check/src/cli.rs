//! `grammar-check`: verifies that every bundled grammar loads and yields a
//! parser, and exits non-zero if any does not.

use facet::Facet;
use grammar_check::report::EXIT_FAILURE;
use grammar_check::{GrammarRegistry, Runner};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for invalid arguments.
const EXIT_USAGE: u8 = 2;

/// Verify the bundled TON grammars.
#[derive(Facet, Debug)]
struct Args {
    /// Print the report as JSON instead of text.
    #[facet(named, short = 'j', default)]
    json: bool,

    /// Check languages one after another instead of concurrently.
    #[facet(named, default)]
    sequential: bool,

    /// Call every accessor twice and fail languages whose results differ.
    #[facet(named, default)]
    idempotence: bool,

    /// Comma-separated language ids to check; all by default.
    #[facet(named, default)]
    only: Option<String>,

    /// Also write the JSON report to this file.
    #[facet(named, short = 'o', default)]
    output: Option<String>,

    /// Log every check step.
    #[facet(named, short = 'v', default)]
    verbose: bool,
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
    let args: Args = match facet_args::from_slice(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let registry = match select(GrammarRegistry::bundled(), args.only.as_deref()) {
        Ok(registry) => registry,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let report = Runner::new()
        .parallel(!args.sequential)
        .check_idempotence(args.idempotence)
        .run(&registry);

    if args.json {
        println!("{}", report.to_json());
    } else {
        println!("{report}");
    }

    if let Some(path) = &args.output {
        if let Err(e) = std::fs::write(path, report.to_json()) {
            tracing::error!(path = %path, error = %e, "could not write report");
            return ExitCode::from(EXIT_FAILURE);
        }
    }

    ExitCode::from(report.exit_code())
}

/// Restricts `registry` to the comma-separated ids in `only`.
///
/// Fails when `only` names no id at all or an id that names no registered
/// language.
fn select(registry: GrammarRegistry, only: Option<&str>) -> Result<GrammarRegistry, String> {
    let Some(only) = only else {
        return Ok(registry);
    };
    let ids: Vec<&str> = only
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err("--only names no language ids".to_string());
    }
    if let Some(unknown) = ids
        .iter()
        .find(|id| !registry.ids().any(|known| known == **id))
    {
        return Err(format!("unknown language id '{unknown}'"));
    }
    Ok(registry.retain_ids(&ids))
}
