//! Bearer-token authentication for the admin API.
//!
//! Tokens are never stored; configuration carries their SHA-256 digests and a
//! presented token is hashed and compared in constant time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::ApiSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiAuthError {
    #[error("missing api token")]
    Missing,
    #[error("invalid api token")]
    Invalid,
    #[error("api token lacks capability `{0}`")]
    Forbidden(&'static str),
}

/// Actions a principal may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read the full book list and change catalogue settings.
    ManageOptions,
    /// Create, update and delete books.
    EditBooks,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageOptions => "manage_options",
            Self::EditBooks => "edit_books",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    Administrator,
    Editor,
}

impl TokenRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Editor => "editor",
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Administrator => &[Capability::ManageOptions, Capability::EditBooks],
            Self::Editor => &[Capability::EditBooks],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiPrincipal {
    pub role: TokenRole,
}

impl ApiPrincipal {
    pub fn requires(&self, needed: Capability) -> Result<(), ApiAuthError> {
        if self.role.capabilities().contains(&needed) {
            Ok(())
        } else {
            Err(ApiAuthError::Forbidden(needed.as_str()))
        }
    }

    pub fn capability_list(&self) -> String {
        self.role
            .capabilities()
            .iter()
            .map(|capability| capability.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiTokens {
    entries: Vec<(TokenRole, [u8; 32])>,
}

impl ApiTokens {
    pub fn from_settings(settings: &ApiSettings) -> Self {
        let mut entries = Vec::new();
        if let Some(digest) = settings.admin_token_sha256 {
            entries.push((TokenRole::Administrator, digest));
        }
        if let Some(digest) = settings.editor_token_sha256 {
            entries.push((TokenRole::Editor, digest));
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn authenticate(&self, token: &str) -> Result<ApiPrincipal, ApiAuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiAuthError::Missing);
        }

        let presented = hash_token(token);
        // Compare against every entry so timing does not reveal which role matched.
        let mut matched = None;
        for (role, digest) in &self.entries {
            if bool::from(digest.ct_eq(&presented)) {
                matched.get_or_insert(*role);
            }
        }

        matched
            .map(|role| ApiPrincipal { role })
            .ok_or(ApiAuthError::Invalid)
    }
}

pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}
