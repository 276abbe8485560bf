//! User accounts, password hashing and the login session file.

use std::fs;
use std::path::{Path, PathBuf};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::task::User;

/// Hash a password into an argon2id PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> Result<bool> {
    let parsed = PasswordHash::new(phc).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Add a new account to `db`.
pub fn register(db: &mut Database, id: &str, name: &str, password: &str) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::InvalidTask("user id must not be empty".into()));
    }
    if password.is_empty() {
        return Err(Error::InvalidTask("password must not be empty".into()));
    }
    if db.user(id).is_some() {
        return Err(Error::UserExists(id.to_string()));
    }
    db.users.push(User {
        id: id.to_string(),
        name: name.trim().to_string(),
        password_hash: hash_password(password)?,
    });
    info!(user_id = id, "registered user");
    Ok(())
}

/// Verify credentials. Unknown users and wrong passwords are indistinguishable.
pub fn authenticate<'a>(db: &'a Database, id: &str, password: &str) -> Result<&'a User> {
    let Some(user) = db.user(id) else {
        debug!(user_id = id, "login for unknown user");
        return Err(Error::InvalidCredentials);
    };
    if verify_password(password, &user.password_hash)? {
        Ok(user)
    } else {
        warn!(user_id = id, "wrong password");
        Err(Error::InvalidCredentials)
    }
}

/// The logged-in user, persisted between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    /// Session file kept next to the database file.
    pub fn path_for(db_path: &Path) -> PathBuf {
        db_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("session.json")
    }

    /// Read the current session, if any.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Read the current session or fail with [`Error::NotLoggedIn`].
    pub fn require(path: &Path) -> Result<Self> {
        Self::load(path)?.ok_or(Error::NotLoggedIn)
    }

    /// Persist this session.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Remove the session file. Returns whether one existed.
    pub fn clear(path: &Path) -> Result<bool> {
        if path.exists() {
            fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
