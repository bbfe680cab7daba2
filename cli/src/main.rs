mod backend;
mod commands;
mod render;
mod repl;
mod util;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wipowise_core::speech::Language;

use commands::feedback::FeedbackArgs;

#[derive(Parser)]
#[command(
    name = "wipowise",
    version,
    about = "WipoWise CLI: ask questions about the WIPO Patent Drafting Manual"
)]
struct Cli {
    /// Relay base URL
    #[arg(long, env = "WIPOWISE_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session
    Chat {
        /// Speech language (en-US, de-DE, fr-FR)
        #[arg(long, default_value = "en-US")]
        lang: Language,
    },
    /// Ask one question and print the answer
    Ask {
        /// The question
        message: String,
        /// Print the turn and its references as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rate an answer
    Feedback(FeedbackArgs),
    /// Check relay health
    Health,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WIPOWISE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Chat { lang } => commands::chat::run(&cli.api_url, lang).await,
        Commands::Ask { message, json } => commands::ask::run(&cli.api_url, &message, json).await,
        Commands::Feedback(args) => commands::feedback::run(&cli.api_url, args).await,
        Commands::Health => commands::health::run(&cli.api_url).await,
    };
    std::process::exit(code);
}
