//! Request gateway
//!
//! Resolves the caller from an `Authorization: Bearer <token>` header into an
//! [`Actor`] and forwards to the service. Sessions are pluggable through
//! [`SessionProvider`]; [`TokenTable`] keeps them in memory.
use super::error::{MarketError, Result};
use super::files::{FileStore, StoredFile};
use super::item::Item;
use super::service::MarketService;
use super::swap::{NewSwapRequest, SwapRequest};
use super::user::{Actor, User};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};
use uuid7::uuid7;

/// Maps bearer tokens to user ids.
pub trait SessionProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct TokenTable {
    tokens: RwLock<HashMap<String, String>>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for `user_id`.
    pub fn issue(&self, user_id: &str) -> String {
        let token = uuid7().to_string();
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.clone(), user_id.to_string());
        token
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(token)
            .is_some()
    }
}

impl SessionProvider for TokenTable {
    fn resolve(&self, token: &str) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned()
    }
}

pub struct Gateway<S: SessionProvider> {
    service: MarketService,
    sessions: S,
    files: FileStore,
}

impl<S: SessionProvider> Gateway<S> {
    pub fn new(service: MarketService, sessions: S, files: FileStore) -> Self {
        Self {
            service,
            sessions,
            files,
        }
    }

    pub fn service(&self) -> &MarketService {
        &self.service
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Resolve an `Authorization` header value into the calling user.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Actor> {
        let token = authorization
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| MarketError::forbidden("Not authorized to access this route"))?;

        let Some(user_id) = self.sessions.resolve(token) else {
            warn!("rejected unknown bearer token");
            return Err(MarketError::forbidden("Not authorized to access this route"));
        };
        // the account may have been deleted since the token was issued
        let user: User = self
            .service
            .store()
            .get(&user_id)?
            .ok_or_else(|| MarketError::forbidden("User not found"))?;

        debug!(user = %user.id, "caller authenticated");
        Ok(Actor::from(&user))
    }

    pub fn create_swap_request(
        &self,
        authorization: Option<&str>,
        request: NewSwapRequest,
    ) -> Result<SwapRequest> {
        let actor = self.authenticate(authorization)?;
        self.service.create_swap_request(&actor, request)
    }

    pub fn change_swap_status(
        &self,
        authorization: Option<&str>,
        swap_id: &str,
        status: &str,
    ) -> Result<SwapRequest> {
        let actor = self.authenticate(authorization)?;
        self.service.change_swap_status(&actor, swap_id, status)
    }

    pub fn cancel_swap_request(&self, authorization: Option<&str>, swap_id: &str) -> Result<()> {
        let actor = self.authenticate(authorization)?;
        self.service.cancel_swap_request(&actor, swap_id)
    }

    pub fn approve_item(
        &self,
        authorization: Option<&str>,
        item_id: &str,
        decision: bool,
    ) -> Result<Item> {
        let actor = self.authenticate(authorization)?;
        self.service.approve_item(&actor, item_id, decision)
    }

    pub fn upload_image(
        &self,
        authorization: Option<&str>,
        name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile> {
        self.authenticate(authorization)?;
        self.files.put(name, bytes)
    }

    pub fn upload_images(
        &self,
        authorization: Option<&str>,
        files: &[(&str, &[u8])],
    ) -> Result<Vec<StoredFile>> {
        self.authenticate(authorization)?;
        self.files.put_many(files)
    }
}

/// HTTP status for an error kind.
pub fn status_code(err: &MarketError) -> u16 {
    match err {
        MarketError::NotFound(_) => 404,
        MarketError::Forbidden(_) => 403,
        MarketError::Unavailable(_)
        | MarketError::SelfRequest
        | MarketError::InsufficientPoints { .. }
        | MarketError::InvalidStatus(_)
        | MarketError::InvalidTransition(_)
        | MarketError::Validation(_) => 400,
        MarketError::Conflict(_) => 409,
        MarketError::Identifier(_)
        | MarketError::Storage(_)
        | MarketError::Decode(_)
        | MarketError::Encode(_)
        | MarketError::Io(_) => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn token_table_issues_and_revokes() {
        let table = TokenTable::new();
        let token = table.issue("user_a");

        assert_eq!(table.resolve(&token).as_deref(), Some("user_a"));
        assert!(table.revoke(&token));
        assert_eq!(table.resolve(&token), None);
    }

    #[test]
    fn error_kinds_map_to_status_codes() {
        assert_eq!(status_code(&MarketError::not_found("Item x")), 404);
        assert_eq!(status_code(&MarketError::forbidden("no")), 403);
        assert_eq!(status_code(&MarketError::SelfRequest), 400);
        assert_eq!(
            status_code(&MarketError::Validation(ValidationError::NoImages)),
            400
        );
        assert_eq!(status_code(&MarketError::Conflict("raced".into())), 409);
        assert_eq!(status_code(&MarketError::Identifier("bad".into())), 500);
    }
}
