use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use testplan_gcs::archive::browse_url;
use testplan_gcs::config;
use testplan_gcs::gcs::GcsStore;
use testplan_gcs::harness::{load_items, run_tests};
use testplan_gcs::options::HarnessOptions;
use testplan_gcs::runner::RunResult;
use testplan_gcs::session::{ArchiveProgress, Collected, Session};

/// testplan-gcs - Test plan export and report archiving for test sessions
#[derive(Parser, Debug)]
#[command(
    name = "testplan-gcs",
    about = "Generate test plans from collected tests, or run tests and archive the HTML report to GCS",
    after_help = "ENVIRONMENT VARIABLES:\n\
        TESTPLAN_GCS_SERVICE_KEY   Same as --gcs-service-key\n\
        TESTPLAN_GCS_BUCKET        Same as --gcs-bucket\n\
        TESTPLAN_GCS_FILENAME      Same as --gcs-filename\n\
        TESTPLAN_GCS_GSUTIL        gsutil executable used for uploads\n\
        TESTPLAN_GCS_BROWSE_URL    Base URL printed for uploaded reports\n\
        RUST_LOG                   Log filter (overrides -v)\n\n\
        The test command receives the report path as {report} in its arguments\n\
        and as TESTPLAN_GCS_REPORT_PATH in its environment."
)]
struct Args {
    #[command(flatten)]
    options: HarnessOptions,

    /// JSON manifest of collected test items ("-" for stdin); required with --testplan
    #[arg(long, value_name = "PATH")]
    collected: Option<PathBuf>,

    /// Output the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable logging
    #[arg(short, long)]
    quiet: bool,

    /// Test command to run, e.g. -- pytest --html={report}
    #[arg(last = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(args: &Args) {
    if args.quiet {
        return;
    }

    let filter = match args.verbose {
        0 => "warn,testplan_gcs=info",
        1 => "info,testplan_gcs=debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: Args) -> Result<ExitCode, Box<dyn Error>> {
    let mut session = Session::configure(&args.options)?;

    // Collected items only matter for the plan
    let items = match (&session.config().plan_path, &args.collected) {
        (Some(_), Some(manifest)) => load_items(manifest)?,
        (Some(_), None) => return Err("--testplan requires --collected <PATH> with the collected test items".into()),
        (None, _) => Vec::new(),
    };

    match session.collect(&items)? {
        Collected::Planned { path, records } => {
            if args.json {
                let result = RunResult::planned(path, records.len());
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Generated test plan: {}", path.display());
            }
            return Ok(ExitCode::SUCCESS);
        }
        Collected::Run => {}
    }

    let store = GcsStore::new();
    if session.config().archive.is_some() {
        if let Err(e) = store.check_available() {
            tracing::warn!(error = %e, "gsutil is not usable; the report upload will likely fail");
        }
    }

    let status = run_tests(&args.command, session.report_sink())?;

    let browse_base = config::browse_url();
    let json = args.json;
    let finished = session.finish_with_progress(&store, |progress| {
        if let ArchiveProgress::Uploading { local, bucket, key } = progress {
            if !json {
                println!(
                    "\nUploading {} to {}...",
                    local.display(),
                    browse_url(&browse_base, &bucket, &key)
                );
            }
        }
    })?;

    let result = RunResult::finished(status.code(), &finished, &browse_base);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    // Propagate the test command's outcome
    Ok(match status.code() {
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}
