mod auth;
mod config;
mod directory;
mod http;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use platform_authz::{Engine, Principal, TracingAuditSink, sitedesk_rules};
use platform_obs::{ObsConfig, init_tracing};
use tracing::info;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    directory::demo_directory,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "sitedesk-server", version, about = "Sitedesk construction suite")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP policy boundary.
    Serve(ServeCommand),
    /// Print the registered rule matrix as JSON.
    #[command(name = "policy:print")]
    PolicyPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
    /// Mint a development bearer token.
    Token(TokenCommand),
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[derive(Args, Debug)]
struct TokenCommand {
    /// Principal id; random when omitted.
    #[arg(long)]
    sub: Option<Uuid>,
    /// Tenant id; omit for a platform-scoped principal.
    #[arg(long)]
    tenant: Option<String>,
    /// Role name, repeatable.
    #[arg(long = "role")]
    roles: Vec<String>,
    /// Permission string, repeatable.
    #[arg(long = "perm")]
    perms: Vec<String>,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd).await,
        Command::PolicyPrint { output } => policy_print(output),
        Command::Token(cmd) => mint_token(cmd),
    }
}

async fn run_server(cmd: ServeCommand) -> Result<()> {
    let config = Arc::new(AppConfig::load()?);
    let engine = Engine::new(sitedesk_rules()?).with_audit(Arc::new(TracingAuditSink));
    let state = AppState {
        engine: Arc::new(engine),
        directory: Arc::new(demo_directory()),
        config,
    };
    http::serve(cmd.into(), state).await
}

fn policy_print(path: Option<PathBuf>) -> Result<()> {
    let table = sitedesk_rules()?;
    let rendered = serde_json::to_string_pretty(&table)?;
    match path {
        Some(target) => {
            std::fs::write(&target, rendered)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "policy matrix written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn mint_token(cmd: TokenCommand) -> Result<()> {
    let config = AppConfig::load()?;
    let principal = Principal {
        id: cmd.sub.unwrap_or_else(Uuid::new_v4),
        tenant: cmd.tenant.map(Into::into),
        roles: cmd.roles,
        permissions: cmd.perms,
        active: true,
    };
    let token = auth::issue_token(&principal, &config)?;
    println!("{token}");
    Ok(())
}
