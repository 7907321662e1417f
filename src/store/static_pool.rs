//! Credential pool backed by a fixed token list

use super::traits::CredentialPool;
use crate::Result;
use crate::types::Credential;
use async_trait::async_trait;

/// Credential pool with tokens taken from configuration
#[derive(Clone, Debug, Default)]
pub struct StaticCredentials {
    tokens: Vec<Credential>,
}

impl StaticCredentials {
    /// Build a pool from raw tokens; blank entries are dropped
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = tokens
            .into_iter()
            .map(Into::<String>::into)
            .filter(|t| !t.trim().is_empty())
            .map(Credential::new)
            .collect();
        Self { tokens }
    }

    /// Number of tokens in the pool
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl CredentialPool for StaticCredentials {
    async fn fetch_all(&self) -> Result<Vec<Credential>> {
        Ok(self.tokens.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
