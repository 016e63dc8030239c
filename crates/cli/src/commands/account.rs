//! Account commands: login, signup, logout, whoami.

#![allow(clippy::print_stdout)]

use secrecy::SecretString;

use suturahub_core::Role;
use suturahub_storefront::api::SignupForm;
use suturahub_storefront::error::AppError;
use suturahub_storefront::models::UserProfile;
use suturahub_storefront::state::AppState;

fn print_profile(user: &UserProfile) {
    println!("{} <{}>", user.name, user.email);
    println!("  id:   {}", user.id);
    println!("  role: {}", user.role);
}

/// Sign in and store the session.
pub async fn login(
    state: &AppState,
    role: Role,
    email: &str,
    password: SecretString,
) -> Result<(), AppError> {
    let user = state.auth().login(role, email, &password).await?;
    println!("Welcome back, {}!", display_name(&user));
    Ok(())
}

/// Register a new account.
pub async fn signup(state: &AppState, role: Role, form: &SignupForm) -> Result<(), AppError> {
    let message = state.auth().signup(role, form).await?;
    println!("{message}");
    println!("Your account has been created. You can now login.");
    Ok(())
}

/// Sign out.
pub fn logout(state: &AppState) {
    if state.auth().logout() {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
}

/// Show the signed-in account, optionally re-fetching it first.
pub async fn whoami(state: &AppState, refresh: bool) -> Result<(), AppError> {
    let user = if refresh {
        Some(state.auth().refresh_profile().await?)
    } else {
        state.session().user()
    };

    match user {
        Some(user) => print_profile(&user),
        None => println!("Not signed in"),
    }
    Ok(())
}

fn display_name(user: &UserProfile) -> &str {
    if user.name.trim().is_empty() {
        user.email.as_str()
    } else {
        &user.name
    }
}
