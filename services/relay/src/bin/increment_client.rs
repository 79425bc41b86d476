//! Minimal client for the increment relay
//!
//! Prints the response status code and raw body, e.g. `200 {"result":6}`.

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "increment-client")]
#[command(about = "Client for the three-tier increment service", long_about = None)]
struct Args {
    /// Relay endpoint
    #[arg(long, default_value = "http://127.0.0.1:5000/api/increment")]
    url: String,

    /// Natural number 0..N_MAX
    #[arg(long, allow_hyphen_values = true)]
    n: i64,

    /// Request timeout in seconds
    #[arg(long, default_value = "5")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .post(&args.url)
        .json(&json!({ "n": args.n }))
        .send()
        .await
        .with_context(|| format!("Request to {} failed", args.url))?;

    let status = response.status().as_u16();
    let body = response.text().await.context("Failed to read response body")?;
    println!("{} {}", status, body);

    Ok(())
}
