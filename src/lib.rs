//! Community clothing exchange: listings, moderation, and swap requests that
//! settle either item-for-item or against a points balance.
//!
//! All state lives in a shared sled database. [`MarketService`] exposes the
//! operations; [`gateway::Gateway`] resolves bearer tokens into callers.

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod files;
pub mod gateway;
pub mod item;
pub mod ledger;
pub mod logging;
pub mod moderation;
pub mod ownership;
pub mod service;
pub mod settlement;
pub mod store;
pub mod swap;
pub mod types;
pub mod user;
pub mod utils;

pub use config::{MarketConfig, Rules};
pub use error::{MarketError, Result, ValidationError};
pub use service::MarketService;
pub use types::{SwapKind, SwapStatus};
pub use user::Actor;
