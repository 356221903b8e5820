//! Account Lifecycle
//!
//! Maintenance runner for user accounts stored in MongoDB. Removes accounts
//! that were never activated, either once or on a cron schedule, and lets
//! operators drive the password reset flow.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::mongodb::{Client, check_health_detailed, connect_from_config_with_retry};
use domain_accounts::{AccountService, MongoUserRepository, PageRequest, UserView};
use eyre::{Result, WrapErr};
use serde_json::json;
use tracing::info;

mod config;
mod scheduler;

use config::Config;

#[derive(Parser)]
#[command(name = "account-lifecycle")]
#[command(about = "Password resets and removal of never-activated accounts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove not activated accounts past the retention window, once
    Cleanup,

    /// Run the cleanup on a cron schedule until interrupted
    Schedule {
        /// Cron expression with seconds (default: CLEANUP_CRON or daily at 01:00)
        #[arg(short, long)]
        cron: Option<String>,
    },

    /// Issue a password reset key for an activated account
    RequestReset {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password using a reset key
    CompleteReset {
        #[arg(short, long)]
        key: String,

        #[arg(short, long, env = "NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List managed accounts
    Users {
        #[arg(long, default_value_t = 0)]
        page: u64,

        #[arg(long, default_value_t = 20)]
        size: u64,
    },

    /// Check MongoDB connectivity
    Status,
}

/// Repository with indexes in place, wrapped in the lifecycle service
async fn account_service(
    client: &Client,
    config: &Config,
) -> Result<AccountService<MongoUserRepository>> {
    let repository = MongoUserRepository::new(client.database(config.mongodb.database()));
    repository
        .create_indexes()
        .await
        .wrap_err("Failed to create user indexes")?;

    Ok(AccountService::with_settings(
        repository,
        config.lifecycle.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(url = %config.mongodb.redacted_url(), "Connecting to MongoDB");
    let client = connect_from_config_with_retry(&config.mongodb, None)
        .await
        .wrap_err("MongoDB connection failed")?;

    match cli.command {
        Commands::Status => {
            let status = check_health_detailed(&client).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "healthy": status.healthy,
                    "responseTimeMs": status.response_time_ms,
                    "message": status.message,
                    "database": config.mongodb.database(),
                }))?
            );
        }

        Commands::Cleanup => {
            let service = account_service(&client, &config).await?;
            let removed = service.remove_not_activated_users().await?;
            info!(removed, "Cleanup complete");
        }

        Commands::Schedule { cron } => {
            let service = account_service(&client, &config).await?;
            let cron = cron.unwrap_or_else(|| config.cleanup_cron.clone());
            scheduler::run_scheduled(service, &cron).await?;
        }

        Commands::RequestReset { email } => {
            let service = account_service(&client, &config).await?;
            // Printed as `null` when refused, whatever the reason
            let issued = service.request_password_reset(&email).await?.map(|user| {
                let reset_key = user.reset_key.clone();
                json!({ "user": UserView::from(user), "resetKey": reset_key })
            });
            println!("{}", serde_json::to_string_pretty(&issued)?);
        }

        Commands::CompleteReset { key, password } => {
            let service = account_service(&client, &config).await?;
            let completed = service
                .complete_password_reset(&password, &key)
                .await?
                .map(UserView::from);
            println!("{}", serde_json::to_string_pretty(&completed)?);
        }

        Commands::Users { page, size } => {
            let service = account_service(&client, &config).await?;
            let page = service
                .get_all_managed_users(PageRequest::new(page, size))
                .await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }

    info!("Account lifecycle run finished");
    Ok(())
}
