use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

use super::database::Database;
use super::error::ServiceError;
use crate::models::UserAccount;

/// Creates login identities for registered students.
#[derive(Clone)]
pub struct AccountProvisioner {
    db: Database,
}

impl AccountProvisioner {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a login account bound to a student. Fails with
    /// `UsernameTaken` when the username is already in use.
    pub async fn provision(
        &self,
        branch_id: &str,
        name: &str,
        username: &str,
        password: &str,
        email: &str,
        role: &str,
    ) -> Result<UserAccount, ServiceError> {
        if self.db.find_user_by_username(username).await?.is_some() {
            return Err(ServiceError::UsernameTaken);
        }

        let account = UserAccount {
            id: uuid::Uuid::new_v4().to_string(),
            branch_id: branch_id.to_string(),
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password),
            role: role.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };

        self.db.users().insert_one(&account, None).await?;

        tracing::info!(
            user_id = %account.id,
            username = %account.username,
            branch_id = %branch_id,
            "login account provisioned"
        );

        Ok(account)
    }
}

/// Random initial password for accounts provisioned without one.
pub fn generate_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";
    let mut rng = rand::thread_rng();
    (0..10)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Salted SHA-256 digest, stored as `<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let salt_hex = hex::encode(salt);
    let digest = digest_with_salt(&salt_hex, password);
    format!("{}${}", salt_hex, digest)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => digest_with_salt(salt, password) == digest,
        None => false,
    }
}

fn digest_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("s3cret!");
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("other", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn generated_passwords_have_expected_shape() {
        let pw = generate_password();
        assert_eq!(pw.len(), 10);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
