// src/main.rs
// =============================================================================
// This is the entry point of the `favcheck` CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Load the bookmark list and the checker settings
// 3. Start a check session, show progress, let Ctrl-C cancel it
// 4. Print the report and exit with a proper code:
//      0 = nothing broken, 1 = broken favorites, 2 = error, 130 = cancelled
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{CheckArgs, Cli, Commands};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use favorites_checker::checker::{CheckResult, ProbeOutcome, ReqwestClient, SessionState};
use favorites_checker::{report, store, CheckSession, CheckerConfig};

const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so `--json` output on stdout stays clean
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check(args) => handle_check(args).await,
    }
}

// Settings: defaults, then the --config file, then individual flags
fn build_config(args: &CheckArgs) -> Result<CheckerConfig> {
    let mut config = match &args.config {
        Some(path) => CheckerConfig::from_toml_file(path)?,
        None => CheckerConfig::default(),
    };

    if let Some(concurrency) = args.concurrency {
        config.concurrency = usize::from(concurrency);
    }
    if let Some(secs) = args.timeout {
        config.per_request_timeout = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid --timeout value {}", secs))?;
    }
    if let Some(max_redirects) = args.max_redirects {
        config.max_redirects = max_redirects;
    }

    config.validate()?;
    Ok(config)
}

async fn handle_check(args: CheckArgs) -> Result<i32> {
    let config = build_config(&args)?;
    let bookmarks = store::load_bookmarks(&args.bookmarks)?;

    if bookmarks.is_empty() {
        eprintln!("No favorites to check");
        return Ok(0);
    }

    let client = ReqwestClient::new(&config).context("creating HTTP client")?;
    let session = Arc::new(CheckSession::new(Arc::new(client), &config));

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let run = session.start(bookmarks, Some(progress_tx))?;

    // Progress line on stderr; ends when the run drops its sender
    let progress = tokio::spawn(async move {
        while let Some(p) = progress_rx.recv().await {
            eprint!("\rChecking favorites... {} of {}", p.checked, p.total);
            let _ = std::io::stderr().flush();
        }
        eprintln!();
    });

    // Ctrl-C cancels; the session then drains and reports what it has
    let canceller = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling, waiting for running checks to stop...");
                let _ = session.cancel();
            }
        })
    };

    let result = run.finish().await?;
    canceller.abort();
    let _ = progress.await;

    print_results(&result, args.json)?;

    let code = if result.state == SessionState::Cancelled {
        EXIT_CANCELLED
    } else if result.report.broken_count > 0 {
        1
    } else {
        0
    };
    Ok(code)
}

fn print_results(result: &CheckResult, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(result)?;
        println!("{}", json_output);
    } else {
        print_table(result);
        println!();
        print!("{}", report::render_summary(result));
    }
    Ok(())
}

// Broken and redirected favorites as a table; accessible ones are not listed
fn print_table(result: &CheckResult) {
    let report = &result.report;
    if report.broken_details.is_empty() && report.redirected_details.is_empty() {
        return;
    }

    println!("{:<60} {:<15} {:<30}", "URL", "STATUS", "DETAILS");
    println!("{}", "=".repeat(105));

    for entry in report.broken_details.iter().chain(&report.redirected_details) {
        let url = entry.bookmark.url.as_str();
        // Truncate URL if too long for display
        let url_display = if url.chars().count() > 57 {
            format!("{}...", url.chars().take(57).collect::<String>())
        } else {
            url.to_string()
        };

        println!(
            "{:<60} {:<15} {:<30}",
            url_display,
            format_status(&entry.outcome),
            report::describe_outcome(&entry.outcome)
        );
    }
}

fn format_status(outcome: &ProbeOutcome) -> &'static str {
    match outcome {
        ProbeOutcome::Accessible { .. } => "OK",
        ProbeOutcome::Redirected { .. } => "REDIRECT",
        ProbeOutcome::Failed {
            transport_error: Some(_),
            ..
        } => "UNREACHABLE",
        ProbeOutcome::Failed { .. } => "BROKEN",
    }
}
