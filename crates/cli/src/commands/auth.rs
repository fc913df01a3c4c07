//! Session commands.

#![allow(clippy::print_stdout)]

use styleaura_storefront::AppState;
use styleaura_storefront::StorefrontError;
use styleaura_storefront::navigation::Route;
use styleaura_storefront::services::{AuthFlow, Registration};

use super::CliError;

fn form_error(err: &StorefrontError, flow: AuthFlow) -> CliError {
    CliError::Rejected(err.user_message(flow.fallback_message()))
}

fn report_route(state: &AppState, route: &Route) {
    let name = state
        .session()
        .user()
        .and_then(|user| user.greeting_name().map(ToString::to_string));
    match name {
        Some(name) => println!("Signed in as {name}. Continue at {route}"),
        None => println!("Signed in. Continue at {route}"),
    }
}

/// Sign in with email and password.
///
/// # Errors
///
/// Returns `CliError::Rejected` with the form message on failure.
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
    redirect: Option<&str>,
) -> Result<(), CliError> {
    let pending = redirect.map(Route::parse);
    let route = state
        .auth()
        .login(email, password, pending)
        .await
        .map_err(|e| form_error(&e, AuthFlow::Login))?;
    report_route(state, &route);
    Ok(())
}

/// Create an account.
///
/// # Errors
///
/// Returns `CliError::Rejected` with the form message on failure.
pub async fn register(state: &AppState, form: &Registration) -> Result<(), CliError> {
    let route = state
        .auth()
        .register(form)
        .await
        .map_err(|e| form_error(&e, AuthFlow::Register))?;
    report_route(state, &route);
    Ok(())
}

/// Sign in with a Google ID token.
///
/// # Errors
///
/// Returns `CliError::Rejected` with the form message on failure.
pub async fn google_login(
    state: &AppState,
    id_token: &str,
    redirect: Option<&str>,
) -> Result<(), CliError> {
    let pending = redirect.map(Route::parse);
    let route = state
        .auth()
        .google_login(id_token, pending)
        .await
        .map_err(|e| form_error(&e, AuthFlow::Google))?;
    report_route(state, &route);
    Ok(())
}

pub fn logout(state: &AppState) {
    state.auth().logout();
    println!("Signed out.");
}

pub fn whoami(state: &AppState) {
    let session = state.session().snapshot();
    let Some(user) = session.user() else {
        println!("Not signed in.");
        return;
    };

    let name = user
        .display_name()
        .or(user.email.as_deref())
        .unwrap_or("(unnamed user)");
    let role = if session.is_admin() { "admin" } else { "customer" };
    println!("{name} ({role})");
}
