//! API token registry.

use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

/// Maps bearer tokens to organization ids.
///
/// Only SHA-256 digests of the tokens are held in memory; the plaintext is
/// discarded at load time.
#[derive(Clone, Default)]
pub struct AuthKeys {
    digests: Arc<HashMap<String, i64>>,
}

impl AuthKeys {
    /// Builds a registry from `(organization id, token)` pairs.
    pub fn new(tokens: impl IntoIterator<Item = (i64, String)>) -> Self {
        let digests = tokens
            .into_iter()
            .map(|(organization_id, token)| (Self::digest(&token), organization_id))
            .collect();

        Self {
            digests: Arc::new(digests),
        }
    }

    /// Parses the `VOLTRA_API_TOKENS` format: `orgId:token,orgId:token`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut tokens = Vec::new();

        for entry in raw.split(',').filter(|entry| !entry.trim().is_empty()) {
            let (organization_id, token) = entry
                .trim()
                .split_once(':')
                .ok_or_else(|| format!("malformed token entry: {entry}"))?;

            let organization_id: i64 = organization_id
                .parse()
                .map_err(|_| format!("non-numeric organization id: {organization_id}"))?;

            if token.len() < 16 {
                return Err(format!(
                    "token for organization {organization_id} is too short (min 16 chars)"
                ));
            }

            tokens.push((organization_id, token.to_string()));
        }

        Ok(Self::new(tokens))
    }

    /// Resolves a bearer token to its organization id.
    pub fn resolve(&self, token: &str) -> Option<i64> {
        self.digests.get(&Self::digest(token)).copied()
    }

    /// Returns the number of registered tokens.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    fn digest(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }
}

impl std::fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKeys")
            .field("tokens", &self.digests.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_token() {
        let keys = AuthKeys::new(vec![(7, "a-long-enough-token".to_string())]);
        assert_eq!(keys.resolve("a-long-enough-token"), Some(7));
        assert_eq!(keys.resolve("wrong-token"), None);
    }

    #[test]
    fn test_parse_token_list() {
        let keys = AuthKeys::parse("1:first-org-token-0001, 2:second-org-token-02").unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.resolve("second-org-token-02"), Some(2));
    }

    #[test]
    fn test_parse_rejects_short_tokens() {
        assert!(AuthKeys::parse("1:short").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_entries() {
        assert!(AuthKeys::parse("no-separator").is_err());
        assert!(AuthKeys::parse("x:a-long-enough-token").is_err());
    }
}
