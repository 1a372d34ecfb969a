//! Password policy and hashing.
//!
//! Pure transformation and validation: nothing here touches persistence. The
//! registration and login handlers combine these functions with the repository.

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Cost used in production unless `BCRYPT_COST` overrides it.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// PolicyViolation
///
/// The reason a registration password was refused. Only the first failing rule
/// is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("Passwords do not match")]
    Mismatch,
    #[error("Password must be at least 8 characters")]
    TooShort,
    #[error("Password must have at least one uppercase letter")]
    MissingUppercase,
    #[error("Password must have at least one digit")]
    MissingDigit,
    #[error("Password must be at most 72 bytes")]
    TooLong,
}

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// validate_registration
///
/// Checks, in this order: confirmation matches, minimum length, an uppercase
/// letter, a digit, and finally the bcrypt input limit.
pub fn validate_registration(password: &str, confirm: &str) -> Result<(), PolicyViolation> {
    if password != confirm {
        return Err(PolicyViolation::Mismatch);
    }
    // Counted in characters, not bytes: "Ąbcdėf1" is seven long.
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PolicyViolation::TooShort);
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(PolicyViolation::MissingUppercase);
    }
    // ASCII 0-9 only. Other Unicode digits do not satisfy the rule.
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PolicyViolation::MissingDigit);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PolicyViolation::TooLong);
    }
    Ok(())
}

/// hash_password
///
/// Salted bcrypt hash at the given cost. Runs on the blocking pool: at production
/// cost a single hash takes long enough to stall a runtime worker.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, HashError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        bcrypt::hash(password, cost).map_err(|e| HashError(e.to_string()))
    })
    .await
    .map_err(|e| HashError(format!("task join error: {}", e)))?
}

/// verify_password
///
/// `Ok(true)` iff `password` produced `hash`. bcrypt compares digests in constant
/// time. A hash that cannot be parsed is an error rather than a mismatch, since it
/// means the stored record is corrupt.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, HashError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        bcrypt::verify(password, &hash).map_err(|e| HashError(e.to_string()))
    })
    .await
    .map_err(|e| HashError(format!("task join error: {}", e)))?
}

// Input for the throwaway hash `verify_unknown_account` checks against.
const UNKNOWN_ACCOUNT_PASSWORD: &str = "unknown-account-placeholder";

/// verify_unknown_account
///
/// Spends the same bcrypt work as `verify_password` on a login whose email has no
/// account, so response time does not reveal which emails are registered. The
/// reference hash is built once, at `cost`, on first use.
pub async fn verify_unknown_account(password: &str, cost: u32) -> Result<(), HashError> {
    static REFERENCE_HASH: tokio::sync::OnceCell<String> = tokio::sync::OnceCell::const_new();

    let hash = REFERENCE_HASH
        .get_or_try_init(|| hash_password(UNKNOWN_ACCOUNT_PASSWORD, cost))
        .await?;
    verify_password(password, hash).await?;
    Ok(())
}
