//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};
use serde::Serialize;

use arc_config::{BackendKind, Config, KEYRING_SERVICE, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn keyring_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "keyring".into(),
        reason: e.to_string(),
    }
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

fn store_token(profile_name: &str, token: &str) -> Result<(), CliError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/access-token"))
        .and_then(|entry| entry.set_password(token))
        .map_err(keyring_err)
}

/// Config as shown to the user: plaintext tokens masked.
#[derive(Serialize)]
struct ConfigView<'a> {
    path: String,
    #[serde(flatten)]
    config: &'a Config,
}

fn masked(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.access_token.is_some() {
            profile.access_token = Some("********".into());
        }
    }
    cfg
}

fn detail(view: &ConfigView<'_>) -> String {
    let cfg = view.config;
    let mut lines = vec![
        format!("Config file:     {}", view.path),
        format!(
            "Default profile: {}",
            cfg.default_profile.as_deref().unwrap_or("-")
        ),
        format!("Output:          {}", cfg.defaults.output),
        format!("Timeout:         {}ms", cfg.defaults.timeout_ms),
    ];
    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let profile = &cfg.profiles[name];
        let backend = match profile.backend {
            BackendKind::Script => profile.url.as_deref().unwrap_or("(no url)"),
            BackendKind::Mock => "mock",
        };
        lines.push(format!("[{name}] {backend}"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", arc_config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = masked(&arc_config::load_config()?);
            let view = ConfigView {
                path: arc_config::config_path().display().to_string(),
                config: &cfg,
            };
            let out = output::render_single(&global.output, &view, detail, |v| v.path.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let path = arc_config::config_path();
            eprintln!("ARC configuration");
            eprintln!("  Config path: {}\n", path.display());

            let mut cfg = arc_config::load_config_or_default();

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let backend = Select::new()
                .with_prompt("Server")
                .items(&["Script endpoint (URL)", "In-memory mock"])
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile::default();
            if backend == 0 {
                let url: String = Input::new()
                    .with_prompt("Script URL")
                    .interact_text()
                    .map_err(prompt_err)?;
                profile.url = Some(url);

                let token = Password::new()
                    .with_prompt("Access token (empty for none)")
                    .allow_empty_password(true)
                    .interact()
                    .map_err(prompt_err)?;
                if !token.is_empty() {
                    store_token(&profile_name, &token)?;
                    eprintln!("Token stored in the system keyring");
                }
            } else {
                profile.backend = BackendKind::Mock;
            }

            if cfg.profiles.is_empty() {
                cfg.default_profile = Some(profile_name.clone());
            }
            cfg.profiles.insert(profile_name.clone(), profile);
            arc_config::save_config(&cfg)?;
            eprintln!("Profile '{profile_name}' saved to {}", path.display());
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = arc_config::load_config_or_default();
            let default = cfg.profile_name(None);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: arc config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if *name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = arc_config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            arc_config::save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetToken { profile } => {
            let cfg = arc_config::load_config_or_default();
            let profile_name =
                profile.unwrap_or_else(|| cfg.profile_name(global.profile.as_deref()));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let token = Password::new()
                .with_prompt("Access token")
                .interact()
                .map_err(prompt_err)?;
            store_token(&profile_name, &token)?;
            eprintln!("Token for '{profile_name}' stored in the system keyring");
            Ok(())
        }
    }
}
