use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use sitegauge_core::audit::{AuditOptions, AuditProgressCallback, execute_audit};
use sitegauge_core::config::AuditConfig;
use sitegauge_core::report::{
    ReportData, ReportFormat, gather_report_data, render_report, save_report,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Exit status for a run whose score is below `--fail-under`.
pub const EXIT_BELOW_THRESHOLD: i32 = 1;
/// Exit status for configuration and I/O failures.
pub const EXIT_USAGE_ERROR: i32 = 2;

/// Installs the stderr log subscriber. `RUST_LOG` wins over the flags.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .try_init();
}

pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Site root from the positional argument, with `~` expanded.
pub fn root_from_args(args: &ArgMatches) -> PathBuf {
    let root = args
        .get_one::<String>("ROOT")
        .map(String::as_str)
        .unwrap_or(".");
    PathBuf::from(shellexpand::tilde(root).as_ref())
}

/// Loads `--config` if given, then applies every flag that was passed.
pub fn build_audit_config(args: &ArgMatches) -> Result<AuditConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => {
            let path = expand_path(path);
            AuditConfig::load(&path)
                .with_context(|| format!("Could not load config {}", path.display()))?
        }
        None => AuditConfig::default(),
    };

    if let Some(base_url) = args.get_one::<String>("base-url") {
        config.base_url = Some(base_url.clone());
    }
    if let Some(homepage) = args.get_one::<PathBuf>("homepage") {
        config.homepage = homepage.clone();
    }
    if args.get_flag("no-external") {
        config.check_external = false;
    }
    if let Some(threads) = args.get_one::<usize>("threads") {
        config.concurrency = *threads;
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        config.timeout_secs = *timeout;
    }
    if let Some(domains) = args.get_many::<String>("trusted-domain") {
        config.trusted_domains.extend(domains.cloned());
    }
    if let Some(top) = args.get_one::<usize>("top") {
        config.top_pages = *top;
    }
    if let Some(sitemap) = args.get_one::<PathBuf>("sitemap") {
        config.sitemap = Some(expand_path(sitemap));
    }

    config.validate().context("Invalid audit settings")?;
    debug!("Effective config: {:?}", config);
    Ok(config)
}

pub fn report_format(args: &ArgMatches) -> ReportFormat {
    args.get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

/// Exit status for a finished audit.
pub fn exit_code_for(score: u32, fail_under: Option<u32>) -> i32 {
    match fail_under {
        Some(threshold) if score < threshold => EXIT_BELOW_THRESHOLD,
        _ => 0,
    }
}

/// Runs `audit` and returns the process exit status.
pub async fn handle_audit(args: &ArgMatches, quiet: bool) -> Result<i32> {
    let root = root_from_args(args);
    let config = build_audit_config(args)?;
    let format = report_format(args);
    let output = args.get_one::<PathBuf>("output").map(|p| expand_path(p));
    let fail_under = args.get_one::<u32>("fail-under").copied();

    // JSON on stdout must stay clean
    let interactive = !quiet && (output.is_some() || format == ReportFormat::Text);

    if interactive {
        eprintln!("{} Auditing {}", "→".blue(), root.display());
        if !config.check_external {
            eprintln!("{} External link verification disabled", "→".blue());
        }
    }

    let progress_callback: Option<AuditProgressCallback> = if interactive {
        Some(Arc::new(|phase: String| {
            eprintln!("{} {}", "•".cyan(), phase);
        }))
    } else {
        None
    };

    let started = Instant::now();
    let outcome = execute_audit(
        AuditOptions {
            root,
            config,
            show_progress_bars: interactive,
        },
        progress_callback,
    )
    .await
    .context("Audit failed")?;
    let elapsed = started.elapsed();

    let data = gather_report_data(&outcome);
    let rendered = render_report(&data, format).context("Failed to render report")?;

    match output {
        Some(ref path) => {
            save_report(&rendered, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                print_console_summary(&data);
                eprintln!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display()
                );
            }
        }
        None => print!("{}", rendered),
    }

    if interactive {
        eprintln!("Time taken: {:.2}s", elapsed.as_secs_f64());
    }

    Ok(exit_code_for(data.score, fail_under))
}

fn print_console_summary(data: &ReportData) {
    for issue in &data.issues {
        let tag = match issue.severity.as_str() {
            "ERROR" => format!("[{}]", issue.severity).red().bold(),
            _ => format!("[{}]", issue.severity).yellow(),
        };
        println!("{} {}: {}", tag, issue.file, issue.message);
    }
    if !data.issues.is_empty() {
        println!();
    }
    println!("Final Score: {}", score_colored(data.score));
}

fn score_colored(score: u32) -> colored::ColoredString {
    let text = format!("{}/100", score);
    if score < 50 {
        text.red().bold()
    } else if score < 80 {
        text.yellow().bold()
    } else {
        text.green().bold()
    }
}
