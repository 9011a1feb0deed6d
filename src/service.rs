//! Service layer for the exchange workflow
//!
//! [`MarketService`] owns the store handle and the point rules. Its operations
//! are spread across the domain modules (`swap`, `settlement`, `moderation`,
//! `catalog`, `accounts`), each adding an `impl MarketService` block.
use super::config::Rules;
use super::error::{MarketError, Result};
use super::store::Store;
use super::user::Actor;
use std::sync::Arc;

#[derive(Clone)]
pub struct MarketService {
    pub(crate) store: Store,
    pub(crate) rules: Rules,
}

impl MarketService {
    pub fn new(instance: Arc<sled::Db>, rules: Rules) -> Result<Self> {
        Ok(Self {
            store: Store::open(instance)?,
            rules,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }
}

pub(crate) fn require_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin {
        return Ok(());
    }
    Err(MarketError::forbidden("Not authorized as an admin"))
}
