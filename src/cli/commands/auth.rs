use clap::Subcommand;
use serde_json::json;

use crate::cli::config::update_environment_config;
use crate::cli::utils::*;
use crate::cli::{Context, OutputFormat};
use crate::session::AuthState;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login with email and password")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Create an account and login")]
    Register {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password, at least 8 characters (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Forget the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Fetch current user information from the server")]
    Whoami,

    #[command(about = "Exchange the refresh token for a new token pair")]
    Refresh,
}

pub async fn handle(cmd: AuthCommands, ctx: &Context) -> anyhow::Result<()> {
    let output_format = &ctx.output_format;

    match cmd {
        AuthCommands::Login { email, password } => {
            let password = resolve_password(password)?;
            let user = ctx.auth.login(&email, &password).await?;
            update_environment_config(|env| env.last_email = Some(user.email.clone()))?;

            output_success(
                output_format,
                &format!("Logged in as {}", user.email),
                Some(json!({ "user": user })),
            )
        }
        AuthCommands::Register { email, password } => {
            let password = resolve_password(password)?;
            let user = ctx.auth.register(&email, &password).await?;
            update_environment_config(|env| env.last_email = Some(user.email.clone()))?;

            output_success(
                output_format,
                &format!("Registered and logged in as {}", user.email),
                Some(json!({ "user": user })),
            )
        }
        AuthCommands::Logout => {
            ctx.auth.logout()?;
            update_environment_config(|env| env.current_portfolio = None)?;
            output_success(output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let state = ctx.auth.state();
            match output_format {
                OutputFormat::Json => output_json(&json!({
                    "authenticated": state.is_authenticated(),
                    "user": state.user(),
                    "api": ctx.auth.client().base_url(),
                })),
                OutputFormat::Text => {
                    match state {
                        AuthState::Authenticated(user) => {
                            println!("Logged in as {} (user {})", user.email, user.id);
                        }
                        _ => println!("Not logged in"),
                    }
                    println!("API: {}", ctx.auth.client().base_url());
                    Ok(())
                }
            }
        }
        AuthCommands::Whoami => {
            let user = ctx.auth.whoami().await?;
            match output_format {
                OutputFormat::Json => output_json(&user),
                OutputFormat::Text => {
                    output_fields(&serde_json::to_value(&user)?);
                    Ok(())
                }
            }
        }
        AuthCommands::Refresh => match ctx.auth.client().refresh_access_token().await {
            Some(_) => output_success(output_format, "Token refreshed", None),
            None => Err(anyhow::anyhow!(
                "Refresh failed; session cleared. Run `atlas auth login <email>` to sign in again"
            )),
        },
    }
}
