use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "vpnwatch-cli")]
#[command(about = "Management CLI for the VPN fleet monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:4000")]
    url: String,

    #[arg(short, long, default_value = "change-me")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all registered servers
    Servers,
    /// View fleet-wide statistics
    Stats,
    /// Show the poll scheduler state
    Status,
    /// Start the poll scheduler
    Start,
    /// Stop the poll scheduler
    Stop,
    /// Force a poll cycle, optionally scoped to one hostname
    Force {
        #[arg(long)]
        hostname: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_str(&cli.key)?);

    match cli.command {
        Commands::Servers => {
            let res = client
                .get(format!("{}/api/servers", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Stats => {
            let res = client
                .get(format!("{}/api/servers/stats/summary", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/api/admin/poller/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Start => {
            let res = client
                .post(format!("{}/api/admin/poller/start", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Stop => {
            let res = client
                .post(format!("{}/api/admin/poller/stop", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Force { hostname } => {
            let mut url = format!("{}/api/admin/poller/force", cli.url);
            if let Some(hostname) = hostname {
                url.push_str(&format!("?hostname={}", hostname));
            }
            let res = client.post(url).headers(headers).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
