use clap::{arg, command};
use std::path::PathBuf;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitegauge")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitegauge")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner, progress bars and console issue lines")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log every issue and phase to stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("audit")
                .about(
                    "Audit a static HTML site on disk: dead links, URL hygiene, headings, \
                structured data and orphan pages.",
                )
                .arg(
                    arg!([ROOT])
                        .required(false)
                        .help("Site root directory")
                        .default_value("."),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("JSON config file; flags below override its values")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"base-url" <URL>)
                        .required(false)
                        .help("Site base URL (default: detected from the homepage canonical link)"),
                )
                .arg(
                    arg!(--"homepage" <FILE>)
                        .required(false)
                        .help("Homepage file relative to ROOT (default: index.html)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"no-external")
                        .required(false)
                        .help("Skip verification of external links")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of concurrent external link checks (default: 10)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("External link request timeout in seconds (default: 5)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"trusted-domain" <DOMAIN>)
                        .required(false)
                        .help("Domain whose 403 responses are not treated as dead (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(--"top" <N>)
                        .required(false)
                        .help("Number of pages in the inbound link ranking (default: 10)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"sitemap" <PATH>)
                        .required(false)
                        .help("Sitemap to cross-check (default: ROOT/sitemap.xml)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"fail-under" <SCORE>)
                        .required(false)
                        .help("Exit with status 1 when the score is below SCORE")
                        .value_parser(clap::value_parser!(u32).range(0..=100)),
                ),
        )
}
