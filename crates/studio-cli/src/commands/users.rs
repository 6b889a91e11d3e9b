//! Offline user-directory inspection.

use anyhow::{Context, Result};
use studio_auth::{AuthConfig, SledUserDirectory, StoreError, UserRepository};
use studio_core::{AdminUser, Config};

use crate::ui;

/// Users command actions.
#[derive(Debug, Clone)]
pub enum UsersAction {
    /// List users, newest first.
    List {
        /// Raw page size.
        limit: Option<i64>,
        /// Raw offset.
        offset: Option<i64>,
    },
    /// Show one user's profile.
    Show {
        /// Identity-provider uid.
        id: String,
    },
}

/// Run the users command.
///
/// # Errors
///
/// Returns error if the directory cannot be opened (for example while the
/// server holds its lock) or read.
pub async fn run_users(action: UsersAction, config: &Config) -> Result<()> {
    let data_dir = config.data_dir();
    let directory = SledUserDirectory::open(&data_dir)
        .with_context(|| format!("Failed to open user directory at {}", data_dir.display()))?;
    tracing::debug!(path = %data_dir.display(), users = directory.count(), "User directory opened");

    match action {
        UsersAction::List { limit, offset } => {
            let page = AuthConfig::from_config(config).page(limit, offset);
            let users = directory
                .list_users(page)
                .await
                .context("Failed to list users")?;
            print_users(&users);
        }
        UsersAction::Show { id } => match directory.get_me(&id).await {
            Ok(me) => println!("{}", serde_json::to_string_pretty(&me)?),
            Err(StoreError::NotFound) => anyhow::bail!("User not found: {id}"),
            Err(e) => return Err(e).context("Failed to read user"),
        },
    }

    Ok(())
}

fn print_users(users: &[AdminUser]) {
    if users.is_empty() {
        ui::info("No users found.");
        return;
    }

    println!(
        "{:<36} {:<12} {:<32} {:<20}",
        "ID", "ROLE", "EMAIL", "CREATED"
    );
    println!("{}", "-".repeat(103));

    for user in users {
        let created = user.created_at.format("%Y-%m-%d %H:%M:%S");
        println!(
            "{:<36} {} {:<32} {:<20}",
            user.id,
            ui::role(user.role, 12),
            user.email,
            created
        );
    }
}
