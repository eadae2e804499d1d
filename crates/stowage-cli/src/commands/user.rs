//! Account management CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use stowage_auth::{PasswordHasher, PasswordValidator};
use stowage_core::config::AppConfig;
use stowage_core::error::AppError;
use stowage_core::types::pagination::PageRequest;
use stowage_database::Stores;
use stowage_entity::user::{UserAccount, UserRole, UserStatus};
use stowage_service::user::{CreateUserRequest, UserService};

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create an account
    Create {
        /// Username (prompts when omitted)
        #[arg(short, long)]
        username: Option<String>,
        /// Email
        #[arg(short, long)]
        email: Option<String>,
        /// Display name
        #[arg(long)]
        display_name: Option<String>,
        /// Role: admin, member or service
        #[arg(short, long, default_value = "member")]
        role: String,
        /// Password (prompts when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// List accounts
    List {
        /// Filter by username, email or display name
        #[arg(short, long)]
        search: Option<String>,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Page size
        #[arg(long, default_value_t = 50)]
        page_size: u64,
    },
    /// Enable an account
    Enable {
        /// Username
        username: String,
    },
    /// Disable an account
    Disable {
        /// Username
        username: String,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// Account ID
    id: String,
    /// Username
    username: String,
    /// Email
    email: String,
    /// Role
    role: String,
    /// Status
    status: String,
    /// Last login
    last_login: String,
}

impl From<&UserAccount> for UserRow {
    fn from(u: &UserAccount) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username.clone(),
            email: u.email.clone().unwrap_or_default(),
            role: u.role.to_string(),
            status: u.status.to_string(),
            last_login: u
                .last_login_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

fn input_error(e: dialoguer::Error) -> AppError {
    AppError::internal(format!("Input error: {e}"))
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let stores = Stores::connect(&config.database).await?;
    if stores.backend_name() == "memory" {
        output::print_warning("database.provider is \"memory\"; changes end with this process.");
    }

    let service = UserService::new(
        Arc::clone(&stores.users),
        Arc::new(PasswordHasher::new(&config.auth)?),
        Arc::new(PasswordValidator::new(&config.auth)),
    );

    let result = run(&args.command, &service, format).await;
    stores.close().await;
    result
}

async fn run(
    command: &UserCommand,
    service: &UserService,
    format: OutputFormat,
) -> Result<(), AppError> {
    match command {
        UserCommand::Create {
            username,
            email,
            display_name,
            role,
            password,
        } => {
            let role: UserRole = role.parse()?;
            let username = match username {
                Some(u) => u.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Username")
                    .interact_text()
                    .map_err(input_error)?,
            };
            let password = match password {
                Some(p) => p.clone(),
                None => dialoguer::Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()
                    .map_err(input_error)?,
            };

            let user = service
                .create_user(CreateUserRequest {
                    username,
                    email: email.clone(),
                    password,
                    display_name: display_name.clone(),
                    role,
                })
                .await?;

            output::print_success(&format!(
                "Account '{}' created (id: {}, role: {})",
                user.username, user.id, user.role
            ));
        }
        UserCommand::List {
            search,
            page,
            page_size,
        } => {
            let users = service
                .list_users(search.as_deref(), &PageRequest::new(*page, *page_size))
                .await?;
            let rows: Vec<UserRow> = users.items.iter().map(UserRow::from).collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                println!(
                    "Page {}/{} ({} accounts)",
                    users.page, users.total_pages, users.total_items
                );
            }
        }
        UserCommand::Enable { username } => {
            let user = service.get_by_username(username).await?;
            service.set_status(user.id, UserStatus::Active).await?;
            output::print_success(&format!("Account '{username}' enabled"));
        }
        UserCommand::Disable { username } => {
            let user = service.get_by_username(username).await?;
            service.set_status(user.id, UserStatus::Disabled).await?;
            output::print_success(&format!("Account '{username}' disabled"));
        }
    }

    Ok(())
}
