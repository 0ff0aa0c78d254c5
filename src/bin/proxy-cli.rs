use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Management CLI for the self-healing proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key, if the proxy requires one
    #[arg(short, long, env = "PROXY_ADMIN_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the health of every instance
    Health,
    /// Take a service's instances online or offline
    Toggle {
        service: String,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Show the current failure prediction for a service
    Predict { service: String },
    /// Check proxy status
    Status,
}

const BASE: &str = "gateway/management";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    let request = match &cli.command {
        Commands::Health => client.get(format!("{url}/{BASE}/health")),
        Commands::Toggle { service, active } => client
            .post(format!("{url}/{BASE}/services/{service}/toggle"))
            .query(&[("active", active)]),
        Commands::Predict { service } => client.get(format!("{url}/{BASE}/services/{service}/prediction")),
        Commands::Status => client.get(format!("{url}/{BASE}/status")),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
