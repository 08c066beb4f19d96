use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use node_gateway::client::{ClientError, ProtocolClient};
use node_gateway::config::{load_config, ClientConfig};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the node gateway API", long_about = None)]
struct Cli {
    /// Gateway base URL. Overrides the config file.
    #[arg(short, long)]
    url: Option<String>,

    /// Read client timeouts and credentials from this config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Basic-auth username.
    #[arg(long)]
    username: Option<String>,

    /// Basic-auth password.
    #[arg(long, requires = "username")]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a CSRF token
    Csrf,
    /// Show the node's build information
    Version,
    /// Check an address
    VerifyAddress { address: String },
    /// Check a hex-encoded transaction
    VerifyTx { encoded: String },
    /// Broadcast a hex-encoded transaction
    Inject { rawtx: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?.client,
        None => ClientConfig::default(),
    };
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    if let Some(username) = cli.username {
        config.username = Some(username);
        config.password = cli.password;
    }

    let client = ProtocolClient::from_config(&config)?;

    let outcome = match cli.command {
        Commands::Csrf => match client.csrf().await {
            Ok(Some(token)) => print_json(&token),
            Ok(None) => {
                println!("CSRF is disabled on this server");
                Ok(())
            }
            Err(e) => Err(e),
        },
        Commands::Version => client.version().await.and_then(|info| print_json(&info)),
        Commands::VerifyAddress { address } => client
            .verify_address(&address)
            .await
            .and_then(|v| print_json(&v)),
        Commands::VerifyTx { encoded } => match client.verify_transaction(&encoded).await {
            // a failed verification may still carry the decoded transaction
            Ok(partial) => partial
                .data
                .as_ref()
                .map_or(Ok(()), print_json)
                .and_then(|()| partial.into_result().map(|_| ())),
            Err(e) => Err(e),
        },
        Commands::Inject { rawtx } => client
            .inject_transaction(&rawtx)
            .await
            .and_then(|txid| print_json(&txid)),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        if e.is_transport() {
            eprintln!("Is the gateway running at {}?", client.base_url());
        }
        std::process::exit(1);
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ClientError> {
    let text = serde_json::to_string_pretty(value).map_err(ClientError::Decode)?;
    println!("{text}");
    Ok(())
}
