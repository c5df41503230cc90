pub mod types;
pub mod commands;
pub mod logging;

use clap::Parser;

/// Run the command-line interface
pub async fn run() {
    let cli = types::Cli::parse();

    // Initialize logging system
    logging::init_logging(cli.debug, cli.quiet);

    // Configure backtrace
    logging::configure_backtrace(cli.trace);

    match &cli.command {
        types::Commands::Analyze { .. } => {
            commands::handle_analyze_command(&cli.command);
        }
        types::Commands::CheckUrl { .. } => {
            commands::handle_check_url_command(&cli.command);
        }
        types::Commands::Defaults { .. } => {
            commands::handle_defaults_command(&cli.command);
        }
        types::Commands::Settings { .. } => {
            commands::handle_settings_command(&cli.command).await;
        }
    }
}
