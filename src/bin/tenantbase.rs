//! # tenantbase
//!
//! Operator CLI: list tenant rows, soft-delete or restore them, and obtain a
//! session token. Connection settings come from `SUPABASE_URL` and
//! `SUPABASE_ANON_KEY` (a `.env` file is read if present).

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tenantbase::{
    AuthClient, ClientFactory, DeletionManager, ReadScope, RecordStore, RequestContext,
    SessionToken,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tenantbase")]
#[command(about = "Tenant-scoped PostgREST client with soft delete", long_about = None)]
#[command(version)]
struct Cli {
    /// Session token forwarded as the bearer credential
    #[arg(long, env = "TENANTBASE_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List rows visible to the current session
    List {
        /// Table name
        table: String,

        /// Only rows whose deleted_at is unset
        #[arg(long)]
        live_only: bool,

        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Stamp deleted_at on a row
    SoftDelete {
        table: String,
        id: String,

        /// Fail when no row was visible to update
        #[arg(long)]
        strict: bool,
    },

    /// Clear deleted_at on a row
    Restore { table: String, id: String },

    /// Sign in with email and password and print the session
    SignIn {
        email: String,

        #[arg(long, env = "TENANTBASE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Revoke the current token
    SignOut,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("tenantbase=info".parse()?))
        .init();

    let cli = Cli::parse();
    let factory = ClientFactory::from_env().context("failed to configure the service client")?;
    let ctx = match cli.token {
        Some(raw) => RequestContext::authenticated(SessionToken::new(raw)?),
        None => RequestContext::anonymous(),
    };

    match cli.command {
        Commands::List {
            table,
            live_only,
            limit,
        } => {
            let scope = if live_only { ReadScope::LiveOnly } else { ReadScope::PolicyDefault };
            let records = RecordStore::new(factory).list(&ctx, &table, scope, limit).await?;
            print_json(&records)?;
        }
        Commands::SoftDelete { table, id, strict } => {
            let manager = DeletionManager::new(factory);
            let result = if strict {
                manager.soft_delete_strict(&ctx, &table, &id).await?
            } else {
                manager.soft_delete(&ctx, &table, &id).await?
            };
            print_json(&result)?;
        }
        Commands::Restore { table, id } => {
            let result = DeletionManager::new(factory).restore(&ctx, &table, &id).await?;
            print_json(&result)?;
        }
        Commands::SignIn { email, password } => {
            let session = AuthClient::new(&factory)
                .sign_in_with_password(&email, &password)
                .await?;
            print_json(&session)?;
        }
        Commands::SignOut => {
            let token = ctx.require_token()?;
            AuthClient::new(&factory).sign_out(token).await?;
        }
    }

    Ok(())
}
