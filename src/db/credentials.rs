//! Publishing tokens and their verification state.

use crate::Result;
use crate::types::Credential;

use super::{CredentialRecord, Database, query_failed};

impl Database {
    /// Add a token to the store
    ///
    /// Adding a token that is already stored refreshes its label and verification state.
    pub async fn upsert_credential(
        &self,
        label: Option<&str>,
        token: &str,
        is_verified: bool,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO credentials (label, token, is_verified, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(token) DO UPDATE SET
                label = COALESCE(excluded.label, credentials.label),
                is_verified = excluded.is_verified
            RETURNING id
            "#,
        )
        .bind(label)
        .bind(token)
        .bind(is_verified)
        .bind(chrono::Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to upsert credential", e))?;

        Ok(id)
    }

    /// Change whether a token may be used
    pub async fn set_credential_verified(&self, token: &str, is_verified: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE credentials SET is_verified = ? WHERE token = ?")
            .bind(is_verified)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to update credential", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a token
    pub async fn delete_credential(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM credentials WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to delete credential", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// List every stored token, verified or not
    pub async fn list_credentials(&self) -> Result<Vec<CredentialRecord>> {
        sqlx::query_as::<_, CredentialRecord>(
            "SELECT id, label, token, is_verified, created_at FROM credentials ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to list credentials", e))
    }

    /// Tokens that make up the credential pool
    pub async fn list_verified_credentials(&self) -> Result<Vec<Credential>> {
        let tokens: Vec<String> = sqlx::query_scalar(
            "SELECT token FROM credentials WHERE is_verified = 1 ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to list verified credentials", e))?;

        Ok(tokens.into_iter().map(Credential::new).collect())
    }
}
