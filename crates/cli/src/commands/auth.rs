//! Account commands.

use secrecy::SecretString;

use super::{App, CommandError, out};

/// Register a customer account.
pub async fn register(
    app: &App,
    name: &str,
    email: &str,
    password: &SecretString,
) -> Result<(), CommandError> {
    app.session.register(name, email, password).await?;
    out(format_args!("Registered {email}. Log in with `shopfront login`."))
}

/// Log in and save the session.
pub async fn login(
    app: &mut App,
    email: &str,
    password: &SecretString,
) -> Result<(), CommandError> {
    let session = app.session.login(email, password).await?;
    out(format_args!(
        "Logged in as {} <{}> ({})",
        session.user.name, session.user.email, session.user.role
    ))
}

/// Forget the saved session.
pub fn logout(app: &mut App) -> Result<(), CommandError> {
    app.session.logout();
    out("Logged out")
}

/// Print the logged-in user.
pub fn whoami(app: &App) -> Result<(), CommandError> {
    match app.session.user() {
        Some(user) => out(format_args!(
            "{} <{}> id={} role={}",
            user.name, user.email, user.id, user.role
        )),
        None => out("Not logged in"),
    }
}
