//! Listing moderation
use super::error::Result;
use super::item::Item;
use super::ledger;
use super::service::{MarketService, require_admin};
use super::store::{flatten_tx, tx_get, tx_put, tx_require};
use super::user::{Actor, User};
use sled::Transactional;
use sled::transaction::ConflictableTransactionError;
use tracing::{debug, info};

impl MarketService {
    /// Approve or withdraw a listing. Moving an item from unapproved to
    /// approved pays the uploader the listing bonus in the same transaction;
    /// repeating an approval pays nothing.
    pub fn approve_item(&self, actor: &Actor, item_id: &str, decision: bool) -> Result<Item> {
        require_admin(actor)?;
        let bonus = self.rules.listing_bonus;
        let store = &self.store;

        let result = (&store.users, &store.items).transaction(|(users, items)| {
            let mut item: Item = tx_require(items, item_id)?;
            let newly_approved = decision && !item.is_approved;
            item.is_approved = decision;

            let mut rewarded = None;
            if newly_approved {
                // the uploader may have been deleted; the listing still goes live
                if let Some(mut uploader) = tx_get::<User>(users, &item.uploader)? {
                    ledger::credit(&mut uploader, bonus).map_err(ConflictableTransactionError::Abort)?;
                    tx_put(users, &uploader)?;
                    rewarded = Some(uploader.id);
                }
            }
            tx_put(items, &item)?;
            Ok((item, rewarded))
        });
        let (item, rewarded) = flatten_tx(result)?;

        match rewarded {
            Some(uploader) => info!(item = %item.id, %uploader, bonus, "listing approved"),
            None => info!(item = %item.id, approved = decision, "listing moderated"),
        }
        Ok(item)
    }

    /// Listings waiting for a moderation decision, oldest first.
    pub fn pending_items(&self, actor: &Actor) -> Result<Vec<Item>> {
        require_admin(actor)?;
        let mut items: Vec<Item> = self
            .store
            .scan::<Item>()?
            .into_iter()
            .filter(|item| !item.is_approved)
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        debug!(count = items.len(), "listed items pending moderation");
        Ok(items)
    }
}
