//! `credentials set | show | clear`.

use serde::Serialize;

use apwatch_config::{ENV_PASSWORD, load_config};
use apwatch_core::{
    ACCOUNT_CONTROLLER_URL, ACCOUNT_PASSWORD, ACCOUNT_USERNAME, ControllerCredentials,
    delete_credentials, missing_accounts, read_optional, save_credentials,
};

use crate::cli::{CredentialsArgs, CredentialsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

#[derive(Serialize)]
struct CredentialStatus {
    service: String,
    controller: Option<String>,
    username: Option<String>,
    password_stored: bool,
    missing: Vec<&'static str>,
    /// Environment variables currently taking precedence over the keyring.
    env_overrides: Vec<&'static str>,
}

fn detail(status: &CredentialStatus) -> String {
    let mut lines = vec![
        format!("Service:     {}", status.service),
        format!("Controller:  {}", status.controller.as_deref().unwrap_or("-")),
        format!("Username:    {}", status.username.as_deref().unwrap_or("-")),
        format!(
            "Password:    {}",
            if status.password_stored { "stored" } else { "-" }
        ),
    ];
    if !status.missing.is_empty() {
        lines.push(format!("Missing:     {}", status.missing.join(", ")));
    }
    if !status.env_overrides.is_empty() {
        lines.push(format!("From env:    {}", status.env_overrides.join(", ")));
    }
    lines.join("\n")
}

pub fn handle(args: CredentialsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_config()?;
    let store = config.secret_store();

    match args.command {
        CredentialsCommand::Set {
            controller,
            username,
        } => {
            let password = match std::env::var(ENV_PASSWORD) {
                Ok(pw) if !pw.is_empty() => pw,
                _ => rpassword::prompt_password("Password: ").map_err(prompt_err)?,
            };
            let credentials = ControllerCredentials::new(controller, username, password);
            save_credentials(&store, &credentials)?;
            eprintln!("Credentials stored in keyring service '{}'", store.service());
            Ok(())
        }

        CredentialsCommand::Show => {
            let status = CredentialStatus {
                service: store.service().to_string(),
                controller: read_optional(&store, ACCOUNT_CONTROLLER_URL)?,
                username: read_optional(&store, ACCOUNT_USERNAME)?,
                password_stored: read_optional(&store, ACCOUNT_PASSWORD)?.is_some(),
                missing: missing_accounts(&store)?,
                env_overrides: [ACCOUNT_CONTROLLER_URL, ACCOUNT_USERNAME, ACCOUNT_PASSWORD]
                    .into_iter()
                    .filter_map(|account| store.env_override(account))
                    .collect(),
            };
            let out = output::render_single(global.output, &status, detail)?;
            output::print_output(&out);
            Ok(())
        }

        CredentialsCommand::Clear => {
            delete_credentials(&store)?;
            eprintln!("Credentials removed from keyring service '{}'", store.service());
            Ok(())
        }
    }
}
