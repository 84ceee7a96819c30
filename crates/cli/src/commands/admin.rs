//! User management commands.

use ecoshop_core::{Email, UserRole};
use ecoshop_server::db::UserRepository;

use super::CommandError;

/// Promote an existing user to the given role.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for bad input or an unknown user.
pub async fn promote(email: &str, role: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::Invalid(e.to_string()))?;
    let role = role
        .parse::<UserRole>()
        .map_err(CommandError::Invalid)?;

    let pool = super::connect().await?;

    let user = UserRepository::new(&pool)
        .update_role(&email, role)
        .await
        .map_err(|e| CommandError::Invalid(e.to_string()))?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "user promoted");
    Ok(())
}
