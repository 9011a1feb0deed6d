//! sled-backed record store
//!
//! Each record kind lives in its own tree, keyed by its bech32 id and encoded
//! as CBOR. Multi-record mutations go through sled transactions so that a
//! settlement either lands in full or not at all.
use super::error::{MarketError, Result};
use super::item::Item;
use super::swap::SwapRequest;
use super::types::TimeStamp;
use super::user::User;
use chrono::Utc;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::{Db, Tree};
use std::sync::Arc;

pub type TxResult<T> = ConflictableTransactionResult<T, MarketError>;

/// A record kind with its own tree.
pub trait Record: minicbor::Encode<()> + for<'b> minicbor::Decode<'b, ()> {
    /// Human readable name used in `NotFound` messages.
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn tree(store: &Store) -> &Tree;
}

#[derive(Clone)]
pub struct Store {
    instance: Arc<Db>,
    pub(crate) users: Tree,
    pub(crate) items: Tree,
    pub(crate) swaps: Tree,
    // ids of swap requests removed by cancellation
    pub(crate) cancelled: Tree,
    // lower-cased email -> user id
    pub(crate) emails: Tree,
}

impl Store {
    pub fn open(instance: Arc<Db>) -> Result<Self> {
        Ok(Self {
            users: instance.open_tree("users")?,
            items: instance.open_tree("items")?,
            swaps: instance.open_tree("swaps")?,
            cancelled: instance.open_tree("cancelled")?,
            emails: instance.open_tree("emails")?,
            instance,
        })
    }

    pub fn get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        T::tree(self)
            .get(id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Like [`Store::get`] but a missing record is a `NotFound` failure.
    pub fn require<T: Record>(&self, id: &str) -> Result<T> {
        self.get(id)?
            .ok_or_else(|| MarketError::not_found(format!("{} {id}", T::KIND)))
    }

    pub fn put<T: Record>(&self, record: &T) -> Result<()> {
        T::tree(self).insert(record.id().as_bytes(), minicbor::to_vec(record)?)?;
        Ok(())
    }

    pub fn scan<T: Record>(&self) -> Result<Vec<T>> {
        T::tree(self)
            .iter()
            .values()
            .map(|bytes| decode(&bytes?))
            .collect()
    }

    pub fn count<T: Record>(&self) -> usize {
        T::tree(self).len()
    }

    pub fn was_cancelled(&self, swap_id: &str) -> Result<bool> {
        Ok(self.cancelled.contains_key(swap_id.as_bytes())?)
    }

    /// When the swap request was cancelled, if it was.
    pub fn cancelled_at(&self, swap_id: &str) -> Result<Option<TimeStamp<Utc>>> {
        self.cancelled
            .get(swap_id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// The id of the account registered under `email`, which must already be normalised.
    pub fn user_id_for_email(&self, email: &str) -> Result<Option<String>> {
        Ok(self
            .emails
            .get(email.as_bytes())?
            .map(|id| String::from_utf8_lossy(&id).into_owned()))
    }

    pub fn flush(&self) -> Result<usize> {
        Ok(self.instance.flush()?)
    }
}

pub(crate) fn decode<T: for<'b> minicbor::Decode<'b, ()>>(bytes: &[u8]) -> Result<T> {
    Ok(minicbor::decode(bytes)?)
}

pub(crate) fn abort<T>(err: impl Into<MarketError>) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(err.into()))
}

pub(crate) fn tx_get<T: Record>(tree: &TransactionalTree, id: &str) -> TxResult<Option<T>> {
    match tree.get(id.as_bytes())? {
        Some(bytes) => decode(&bytes)
            .map(Some)
            .map_err(ConflictableTransactionError::Abort),
        None => Ok(None),
    }
}

pub(crate) fn tx_require<T: Record>(tree: &TransactionalTree, id: &str) -> TxResult<T> {
    match tx_get(tree, id)? {
        Some(record) => Ok(record),
        None => abort(MarketError::not_found(format!("{} {id}", T::KIND))),
    }
}

pub(crate) fn tx_put<T: Record>(tree: &TransactionalTree, record: &T) -> TxResult<()> {
    let cbor = minicbor::to_vec(record).map_err(|e| ConflictableTransactionError::Abort(e.into()))?;
    tree.insert(record.id().as_bytes(), cbor)?;
    Ok(())
}

/// Collapse a finished transaction's error into the crate taxonomy.
pub(crate) fn flatten_tx<T>(result: std::result::Result<T, TransactionError<MarketError>>) -> Result<T> {
    result.map_err(|e| match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => MarketError::Storage(e),
    })
}

impl Record for User {
    const KIND: &'static str = "User";

    fn id(&self) -> &str {
        &self.id
    }
    fn tree(store: &Store) -> &Tree {
        &store.users
    }
}

impl Record for Item {
    const KIND: &'static str = "Item";

    fn id(&self) -> &str {
        &self.id
    }
    fn tree(store: &Store) -> &Tree {
        &store.items
    }
}

impl Record for SwapRequest {
    const KIND: &'static str = "Swap request";

    fn id(&self) -> &str {
        &self.id
    }
    fn tree(store: &Store) -> &Tree {
        &store.swaps
    }
}
