use clap::Parser;
use nexus_gate::cli::{
    handle_classify, handle_completions, handle_config_init, handle_detect, load_config, Cli,
    Commands, ConfigCommands,
};
use nexus_gate::config::LoggingConfig;
use std::path::Path;

/// Logging for one-shot commands: configured level, defaulting to `warn`
/// so command output stays readable.
fn init_logging(config_path: Option<&Path>) {
    let logging = load_config(config_path)
        .map(|c| c.logging)
        .unwrap_or_else(|_| LoggingConfig {
            level: "warn".to_string(),
            ..LoggingConfig::default()
        });
    if let Err(e) = nexus_gate::logging::init_tracing(&logging) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result: anyhow::Result<()> = match cli.command {
        Commands::Classify(args) => {
            init_logging(args.config.as_deref());
            handle_classify(&args).await.map(|output| println!("{}", output))
        }
        Commands::Detect(args) => {
            init_logging(args.config.as_deref());
            handle_detect(&args).map(|output| println!("{}", output))
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
