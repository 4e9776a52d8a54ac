//! Fetch Salesforce Integration Service cases from the last N days.
//!
//! Credentials come from `SALESFORCE_*` environment variables or a `.env`
//! file. Three logins are tried in order: username/password + security
//! token, an existing session id, then the OAuth web server flow.
//!
//! ```sh
//! fetch-sf-cases        # last 7 days
//! fetch-sf-cases 14
//! RUST_LOG=sfcases=debug fetch-sf-cases 0
//! ```

use std::io::Write;
use std::path::Path;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sfcases::auth::{Authenticator, CredentialStore, FALLBACK_GUIDANCE};
use sfcases::cases::{fetch_cases, CaseQuery, DEFAULT_DAYS};
use sfcases::report;

#[derive(Parser)]
#[command(name = "fetch-sf-cases")]
#[command(about = "Fetch Salesforce Integration Service cases from the last N days")]
#[command(version)]
struct Cli {
    /// Look-back window in days (0 means today)
    #[arg(default_value_t = DEFAULT_DAYS.to_string(), allow_negative_numbers = true)]
    days: String,
}

/// CLI exit codes.
#[repr(i32)]
enum ExitCode {
    /// Bad `days` value, every login failed, or the query failed.
    Error = 1,
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn fail(lines: &[String]) -> ! {
    for line in lines {
        println!("{line}");
    }
    let _ = std::io::stdout().flush();
    std::process::exit(ExitCode::Error as i32);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    setup_logging();

    let query = match CaseQuery::parse(&cli.days) {
        Ok(query) => query,
        Err(e) => fail(&[format!("✗ {e}")]),
    };

    let store = CredentialStore::from_env();
    let mut stdout = std::io::stdout();
    let _ = report::render_banner(&mut stdout, store.instance_url(), query.days());

    let outcome = Authenticator::default().authenticate(&store).await;
    let session = match outcome.result {
        Ok(session) => session,
        Err(_) => fail(&[
            "\n✗ All authentication methods failed.".to_string(),
            format!("\n{FALLBACK_GUIDANCE}"),
        ]),
    };

    println!("\nQuerying cases from last {} day(s)...", query.days());
    let result = match fetch_cases(&session, &query).await {
        Ok(result) => result,
        Err(e) => fail(&report::failure_lines("Error fetching cases", &e)),
    };

    let mut out = stdout.lock();
    if let Err(e) = report::render_report(&mut out, &result, query.days()) {
        eprintln!("Error: cannot write report: {e}");
        std::process::exit(ExitCode::Error as i32);
    }

    if result.is_empty() {
        return;
    }

    match report::write_results(Path::new("."), &result.records, &chrono::Local::now()) {
        Ok(path) => {
            let _ = report::render_saved(&mut out, &path);
        }
        Err(e) => {
            drop(out);
            fail(&[format!("✗ Error saving results: {e}")])
        }
    }
}
