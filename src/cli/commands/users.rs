use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::utils::{output_error, output_success, read_structured};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::DirectoryUser;
use crate::database::DatabaseManager;
use crate::services::user_directory::{seed_users, DEFAULT_PASSWORD};
use crate::services::{NewUser, PgUserDirectory, UserDirectory};

#[derive(Subcommand)]
pub enum UsersCommands {
    #[command(about = "Create a single user")]
    Create {
        #[arg(help = "Email address, used as the login name")]
        email: String,

        #[arg(help = "Display name")]
        name: String,

        #[arg(long, help = "Password (prompted for when omitted)")]
        password: Option<String>,

        #[arg(long, help = "Grant reviewer permissions")]
        reviewer: bool,
    },

    #[command(about = "Create users from a JSON or YAML file")]
    Import {
        #[arg(help = "File holding a list of {email, name, password, is_reviewer}")]
        file: PathBuf,
    },

    #[command(about = "Create the default demo users and reviewers")]
    Seed {
        #[arg(long, help = "Password for every seeded account")]
        password: Option<String>,
    },

    #[command(about = "List users in the directory")]
    List,
}

/// Outcome of provisioning a batch of users
#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub created: Vec<DirectoryUser>,
    pub failed: Vec<(String, String)>,
}

pub async fn handle(cmd: UsersCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let directory = connect_directory().await?;

    match cmd {
        UsersCommands::Create {
            email,
            name,
            password,
            reviewer,
        } => {
            let password = match password {
                Some(password) => password,
                None => rpassword::prompt_password("Enter password (min 8 chars, uppercase, lowercase, number): ")
                    .context("failed to read password")?,
            };
            let user = NewUser {
                email,
                name,
                password,
                is_reviewer: reviewer,
            };

            let created = directory
                .create_user(&user)
                .await
                .with_context(|| format!("Error creating user {}", user.email))?;
            output_success(
                &output_format,
                &format!("Created user: {} (Reviewer: {})", created.email, created.is_reviewer),
                Some(json!({ "user": user_json(&created) })),
            )
        }
        UsersCommands::Import { file } => {
            let users: Vec<NewUser> = read_structured(&file)?;
            let report = provision(&directory, users).await;
            report_batch(&output_format, report)
        }
        UsersCommands::Seed { password } => {
            let password = password.unwrap_or_else(|| DEFAULT_PASSWORD.to_string());
            let report = provision(&directory, seed_users(&password)).await;
            report_batch(&output_format, report)
        }
        UsersCommands::List => {
            let users = directory.list_users().await?;
            match output_format {
                OutputFormat::Json => {
                    let users: Vec<_> = users.iter().map(user_json).collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<35} {:<25} {:<10} {}", "EMAIL", "NAME", "REVIEWER", "CREATED");
                    println!("{}", "-".repeat(90));
                    for user in &users {
                        println!(
                            "{:<35} {:<25} {:<10} {}",
                            user.email,
                            user.name,
                            user.reviewer_attribute(),
                            user.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(())
        }
    }
}

async fn connect_directory() -> anyhow::Result<PgUserDirectory> {
    let config = AppConfig::from_env();
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to user directory database")?;
    let directory = PgUserDirectory::new(pool);
    directory.ensure_schema().await?;
    Ok(directory)
}

/// Create each user in turn. A failure is recorded and the batch carries on.
pub async fn provision(directory: &dyn UserDirectory, users: Vec<NewUser>) -> ProvisionReport {
    let mut report = ProvisionReport::default();

    for user in users {
        match directory.create_user(&user).await {
            Ok(created) => {
                tracing::info!("Created user: {} (Reviewer: {})", created.email, created.is_reviewer);
                report.created.push(created);
            }
            Err(e) => {
                tracing::warn!("Error creating user {}: {}", user.email, e);
                report.failed.push((user.email, e.to_string()));
            }
        }
    }

    report
}

fn report_batch(output_format: &OutputFormat, report: ProvisionReport) -> anyhow::Result<()> {
    for (email, reason) in &report.failed {
        output_error(output_format, &format!("Error creating user {}: {}", email, reason))?;
    }

    let created: Vec<_> = report.created.iter().map(user_json).collect();
    output_success(
        output_format,
        &format!("Created {} user(s), {} failed", report.created.len(), report.failed.len()),
        Some(json!({ "created": created, "failed": report.failed.len() })),
    )
}

fn user_json(user: &DirectoryUser) -> serde_json::Value {
    json!({
        "email": user.email,
        "email_verified": user.email_verified,
        "name": user.name,
        "custom:is_reviewer": user.reviewer_attribute(),
    })
}
