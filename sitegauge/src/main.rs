use colored::Colorize;
use sitegauge::commands::command_argument_builder;
use sitegauge::handlers::{EXIT_USAGE_ERROR, handle_audit, init_tracing};
use sitegauge_core::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    init_tracing(verbose, quiet);

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let code = match chosen_command.subcommand() {
        Some(("audit", primary_command)) => match handle_audit(primary_command, quiet).await {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{} {:#}", "✗".red().bold(), e);
                EXIT_USAGE_ERROR
            }
        },
        _ => unreachable!("clap should ensure we don't get here"),
    };

    std::process::exit(code);
}
