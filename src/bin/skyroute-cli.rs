use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use skyroute_gateway::config::{load_config, EnvMap};
use skyroute_gateway::routing::{RouteRule, Router};

#[derive(Parser)]
#[command(name = "skyroute-cli")]
#[command(about = "Management CLI for SkyRoute Gateway", long_about = None)]
struct Cli {
    /// Gateway base URL (a control host for `health` and `info`).
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the healthcheck endpoint
    Health,
    /// Show the gateway info document
    Info,
    /// Validate a config file and print how its routes resolve
    CheckConfig {
        path: PathBuf,
        #[arg(long, default_value = ".env.local")]
        env_file: PathBuf,
    },
    /// List comments for a post
    Comments {
        post_id: String,
        #[arg(long, default_value = "/api/comments")]
        path: String,
    },
    /// Post a comment
    Comment {
        post_id: String,
        content: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long, default_value = "/api/comments")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // Don't let a redirect to the frontend hide the info document
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/healthcheck", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Info => {
            let res = client.get(format!("{}/", base)).send().await?;
            if res.status().is_redirection() {
                let location = res
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("<none>");
                println!("Redirects to {}", location);
                return Ok(());
            }
            print_response(res).await?;
        }
        Commands::CheckConfig { path, env_file } => check_config(&path, &env_file)?,
        Commands::Comments { post_id, path } => {
            let res = client
                .get(format!("{}{}", base, path))
                .query(&[("postId", post_id.as_str())])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Comment {
            post_id,
            content,
            author,
            path,
        } => {
            let res = client
                .post(format!("{}{}", base, path))
                .json(&json!({ "postId": post_id, "author": author, "content": content }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn check_config(path: &Path, env_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    let env = EnvMap::load(Some(env_file))?;
    let router = Router::from_config(&config.routes, &env);

    println!("Config OK: {} route(s), listening on {}", router.len(), config.listener.bind_address);
    for route in &config.routes {
        let rule = RouteRule::compile(route, &env);
        let missing = rule.target.missing_settings();
        let status = if missing.is_empty() {
            "ready".to_string()
        } else {
            format!("missing {}", missing.join(", "))
        };
        println!(
            "  {:<20} {:?} -> {}://{}{} [{}]",
            rule.name,
            rule.kind,
            rule.target.protocol,
            rule.target.host.as_deref().unwrap_or("?"),
            rule.target.port.map(|p| format!(":{}", p)).unwrap_or_default(),
            status
        );
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
