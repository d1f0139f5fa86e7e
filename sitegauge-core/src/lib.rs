pub mod audit;
pub mod checks;
pub mod config;
pub mod discover;
pub mod error;
pub mod graph;
pub mod issue;
pub mod report;
pub mod site;
pub mod sitemap;

pub use audit::{AuditOptions, AuditOutcome, AuditStats, execute_audit};
pub use config::AuditConfig;
pub use error::{AuditError, ConfigError};
pub use issue::{Issue, IssueKind, Severity};

use colored::Colorize;

pub fn print_banner() {
    eprintln!(
        "{} {}",
        "sitegauge".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    eprintln!("{}", "static site link and SEO auditor".dimmed());
    eprintln!();
}
