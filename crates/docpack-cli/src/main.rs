mod output;

use clap::{Parser, Subcommand};
use docpack_core::config::{resolve_publish_targets, PublishOverrides};
use docpack_server::{AppState, ServerConfig};

#[derive(Parser)]
#[command(
    name = "docpack",
    about = "Requirements-to-document automation server — generate BRD/FRS/SOW/RAID packs and backlogs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080", env = "PORT")]
        port: u16,
    },

    /// Report which configuration groups are usable (never prints secrets)
    Check,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Serve { port } => cmd_serve(port),
        Commands::Check => cmd_check(cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_serve(port: u16) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let state = AppState::new(ServerConfig::from_env());
        docpack_server::serve(state, port).await
    })
}

fn cmd_check(json: bool) -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    let llm_status = if config.llm.is_some() {
        "configured".to_string()
    } else {
        "missing (set LLM_API_KEY)".to_string()
    };
    let publish_status = match resolve_publish_targets(&PublishOverrides::default(), &config.env) {
        Ok(_) => "configured".to_string(),
        Err(e) => e.to_string(),
    };
    let smtp_status = if config.smtp.is_some() {
        "configured".to_string()
    } else {
        "missing (set SMTP_HOST, SMTP_USERNAME, SMTP_PASSWORD)".to_string()
    };

    if json {
        output::print_json(&serde_json::json!({
            "llm": llm_status,
            "publish": publish_status,
            "smtp": smtp_status,
        }))
    } else {
        output::print_table(
            &["Group", "Status"],
            vec![
                vec!["llm".to_string(), llm_status],
                vec!["publish".to_string(), publish_status],
                vec!["smtp".to_string(), smtp_status],
            ],
        );
        Ok(())
    }
}
