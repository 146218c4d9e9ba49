mod cli;
mod commands;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use arc_config::{BackendKind, Profile};
use arc_core::{ClientConfig, ResourceRegistry};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never contact the server
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "arc", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let client = build_client_config(&cli.global)?;
            let registry = ResourceRegistry::from_config(&client)?;

            tracing::debug!(
                command = ?cmd,
                backend = registry.rpc().backend_kind(),
                "dispatching command"
            );
            commands::dispatch(cmd, &registry, &cli.global).await
        }
    }
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = arc_config::load_config_or_default();
    let profile_name = cfg.profile_name(global.profile.as_deref());

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None if global.mock || global.url.is_some() => Profile {
            mock_latency_ms: Some(0),
            ..Profile::default()
        },
        None => {
            return Err(CliError::NoConfig {
                path: arc_config::config_path().display().to_string(),
            });
        }
    };

    if global.mock {
        profile.backend = BackendKind::Mock;
    }
    if let Some(ref url) = global.url {
        profile.backend = BackendKind::Script;
        profile.url = Some(url.clone());
    }

    let mut client = arc_config::profile_to_client_config(&profile, &profile_name, &cfg.defaults)?;
    if let Some(ms) = global.timeout_ms {
        client.timeout = Duration::from_millis(ms);
    }
    Ok(client)
}
