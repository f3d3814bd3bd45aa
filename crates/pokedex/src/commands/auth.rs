//! Account command handlers: `login`, `signup`, `logout`.

use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use pokedex_core::{AuthOutcome, validation};

use crate::cli::CredentialArgs;
use crate::error::CliError;

use super::Session;
use super::config_cmd::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

fn prompt_email(email: Option<String>) -> Result<String, CliError> {
    match email {
        Some(email) => Ok(email),
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(prompt_err),
    }
}

fn prompt_password(label: &str) -> Result<SecretString, CliError> {
    rpassword::prompt_password(format!("{label}: "))
        .map(SecretString::from)
        .map_err(prompt_err)
}

fn outcome_to_result(outcome: AuthOutcome) -> Result<AuthOutcome, CliError> {
    match outcome {
        AuthOutcome::Failed { message } => Err(CliError::AuthFailed { message }),
        other => Ok(other),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn login(session: &Session, args: CredentialArgs) -> Result<(), CliError> {
    let email = prompt_email(args.email)?;
    let password = match args.password {
        Some(pw) => SecretString::from(pw),
        None => prompt_password("Password")?,
    };

    let auth = session.app.auth();
    auth.initialize().await;
    outcome_to_result(auth.sign_in(&email, &password).await)?;
    session.remember_current();

    let who = auth.user_email().unwrap_or(email);
    session.status(&format!("Signed in as {who}"));
    Ok(())
}

pub async fn signup(session: &Session, args: CredentialArgs) -> Result<(), CliError> {
    let email = prompt_email(args.email)?;
    let password = match args.password {
        Some(pw) => SecretString::from(pw),
        None => {
            let password = prompt_password("Password")?;
            let confirmation = prompt_password("Confirm password")?;
            validation::validate_sign_up(
                &email,
                password.expose_secret(),
                confirmation.expose_secret(),
            )?;
            password
        }
    };

    let auth = session.app.auth();
    auth.initialize().await;
    match outcome_to_result(auth.sign_up(&email, &password).await)? {
        AuthOutcome::ConfirmationPending => {
            session.status(&format!(
                "Account created. Check {email} for a confirmation link, then run: pokedex login"
            ));
        }
        _ => {
            session.remember_current();
            session.status(&format!("Signed up and signed in as {email}"));
        }
    }
    Ok(())
}

pub async fn logout(session: &Session) -> Result<(), CliError> {
    let auth = session.app.auth();
    let snapshot = auth.initialize().await;
    if !snapshot.is_authenticated() {
        forget_session();
        session.status("Not signed in");
        return Ok(());
    }

    outcome_to_result(auth.sign_out().await)?;
    forget_session();
    session.status("Signed out");
    Ok(())
}

fn forget_session() {
    if let Err(e) = pokedex_config::clear_refresh_token() {
        warn!(error = %e, "failed to clear remembered session");
    }
}
