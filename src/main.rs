mod config;
mod db;
mod maintenance;
mod models;
mod services;
mod utils;
mod web;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    config::AppConfig, services::auth::hash_password, utils::generate_slug, web::AppState,
};

#[derive(Debug, Parser)]
#[command(name = "linkpage", about = "Self-hosted link-in-bio site")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Print an ADMIN_PASSWORD_HASH line for the given password.
    HashPassword { password: String },
    /// Print the slug a section title would get.
    Slugify { text: String },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let outcome = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => app_main().await,
        Command::HashPassword { password } => {
            println!("ADMIN_PASSWORD_HASH={}", hash_password(&password, None));
            Ok(())
        }
        Command::Slugify { text } => {
            println!("{}", generate_slug(&text));
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let config = AppConfig::from_env()?;
    let port = config.port;
    let state = AppState::new(config).await?;

    maintenance::spawn(state.clone());

    let app = web::router::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");

    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
