//! Account commands.

use wrapsody_storefront::AppError;
use wrapsody_storefront::services::auth::{PasswordChange, SignUpForm};

use super::{Context, render};

/// Arguments of `wrapsody signup`.
pub struct SignUpArgs {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_eula: bool,
}

/// Create an account.
///
/// # Errors
///
/// Returns the first failing signup step.
pub async fn signup(ctx: &Context, args: SignUpArgs) -> Result<(), AppError> {
    let form = SignUpForm {
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        password: args.password,
        confirm_password: args.confirm_password,
        accepted_eula: args.accept_eula,
    };
    ctx.accounts.sign_up(&form).await?;
    render::message("Sign-up successful! You can now log in.");
    Ok(())
}

/// Log in.
///
/// # Errors
///
/// Returns an error if either the identity or storefront login fails.
pub async fn login(
    ctx: &Context,
    email: &str,
    password: &str,
    stay_logged_in: bool,
) -> Result<(), AppError> {
    let token = ctx.accounts.login(email, password, stay_logged_in).await?;
    let greeting = ctx
        .accounts
        .display_name(email)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| email.to_string());
    render::message(&format!(
        "Welcome, {greeting}. Session valid until {}.",
        token.expires_at.format("%Y-%m-%d")
    ));

    if !ctx.accounts.eula_status(email).await? {
        render::message("You have not accepted the EULA yet: run `wrapsody eula accept`.");
    }
    Ok(())
}

/// Log out.
///
/// # Errors
///
/// Returns an error if local state cannot be written.
pub async fn logout(ctx: &Context) -> Result<(), AppError> {
    ctx.accounts.logout().await?;
    render::message("Logged out.");
    Ok(())
}

/// Email a password reset link.
///
/// # Errors
///
/// Returns an error if the identity provider rejects the request.
pub async fn reset_password(ctx: &Context, email: &str) -> Result<(), AppError> {
    ctx.accounts.send_password_reset(email).await?;
    render::message("Password reset link sent! Check your email.");
    Ok(())
}

/// Change the account password.
///
/// # Errors
///
/// Returns an error if validation or re-authentication fails.
pub async fn update_password(
    ctx: &Context,
    email: String,
    current_password: String,
    new_password: String,
    confirm_password: String,
) -> Result<(), AppError> {
    ctx.accounts
        .update_password(&PasswordChange {
            email,
            current_password,
            new_password,
            confirm_password,
        })
        .await?;
    render::message("Password updated.");
    Ok(())
}

/// Delete the account.
///
/// # Errors
///
/// Returns an error if re-authentication or deletion fails.
pub async fn delete_account(ctx: &Context, email: &str, password: &str) -> Result<(), AppError> {
    ctx.accounts.delete_account(email, password).await?;
    render::message("Account deleted successfully!");
    Ok(())
}

/// Show whether the account accepted the EULA.
///
/// # Errors
///
/// Returns an error if the profile lookup fails.
pub async fn eula_status(ctx: &Context, email: &str) -> Result<(), AppError> {
    let accepted = ctx.accounts.eula_status(email).await?;
    render::message(if accepted {
        "EULA accepted."
    } else {
        "EULA not accepted."
    });
    Ok(())
}

/// Accept the EULA.
///
/// # Errors
///
/// Returns an error if the profile cannot be written.
pub async fn accept_eula(ctx: &Context, email: &str) -> Result<(), AppError> {
    ctx.accounts.accept_eula(email).await?;
    render::message("EULA accepted.");
    Ok(())
}
