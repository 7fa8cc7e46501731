use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use jwt_grant_auth::AuthorizationError;
use jwt_grant_auth::commands::check_token::{CheckTokenCommand, describe_failure, render_token};
use jwt_grant_auth::http::client::HttpClient;
use jwt_grant_auth::parameters::{Commands, LogLevel};
use jwt_grant_auth::token_retriever::http_impl;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "jwt-grant-auth-cli")]
struct Cli {
    /// Verbosity of the logs written to stderr
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::from(cli.log_level))
        .init();

    match cli.command {
        Commands::CheckToken {
            credentials,
            output_token_format,
            request,
        } => {
            let outcome = credentials
                .to_config()
                .map_err(AuthorizationError::from)
                .and_then(|config| {
                    let http_client = HttpClient::new(request.http_config())
                        .map_err(|e| AuthorizationError::Transport(e.to_string()))?;
                    let retriever = http_impl::from_config(config, http_client)?
                        .with_safety_margin(request.safety_margin())
                        .with_assertion_lifetime(request.assertion_lifetime());

                    CheckTokenCommand::new(retriever)
                        .with_transport_retries(request.transport_retries(), request.retry_delay())
                        .execute()
                });

            match outcome {
                Ok(token) => {
                    debug!(expires_at = %token.expires_at(), "token ready");
                    println!("{}", render_token(&token, &output_token_format)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => match describe_failure(&error) {
                    Some(message) => {
                        eprintln!("\n{message}\n");
                        Ok(ExitCode::FAILURE)
                    }
                    None => Err(error.into()),
                },
            }
        }
    }
}
