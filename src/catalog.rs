//! Listing CRUD and browsing views
use super::error::{MarketError, Result};
use super::item::{Item, ItemUpdate, NewItem};
use super::service::MarketService;
use super::store::{abort, flatten_tx, tx_put, tx_require};
use super::user::{Actor, User};
use super::utils::{ITEM_HRP, new_uuid_to_bech32};
use sled::transaction::ConflictableTransactionError;
use tracing::info;

impl MarketService {
    pub fn create_item(&self, actor: &Actor, draft: NewItem) -> Result<Item> {
        // the uploader must be a live account
        let uploader: User = self.store.require(&actor.id)?;
        let item = draft.validate_into(
            new_uuid_to_bech32(ITEM_HRP)?,
            uploader.id,
            self.rules.default_point_value,
        )?;
        self.store.put(&item)?;

        info!(item = %item.id, uploader = %item.uploader, "item listed for moderation");
        Ok(item)
    }

    pub fn get_item(&self, item_id: &str) -> Result<Item> {
        self.store.require(item_id)
    }

    /// Apply an owner's edit to the item as it stands at commit time, so an
    /// ownership change that lands first is kept and re-authorized against.
    pub fn update_item(&self, actor: &Actor, item_id: &str, update: ItemUpdate) -> Result<Item> {
        let result = self.store.items.transaction(|items| {
            let mut item: Item = tx_require(items, item_id)?;
            if !actor.is_or_admin(&item.uploader) {
                return abort(MarketError::forbidden("Not authorized to update this item"));
            }
            update
                .clone()
                .apply(&mut item)
                .map_err(ConflictableTransactionError::Abort)?;
            tx_put(items, &item)?;
            Ok(item)
        });
        let item = flatten_tx(result)?;

        info!(item = %item.id, actor = %actor.id, "item updated");
        Ok(item)
    }

    pub fn delete_item(&self, actor: &Actor, item_id: &str) -> Result<()> {
        let result = self.store.items.transaction(|items| {
            let item: Item = tx_require(items, item_id)?;
            if !actor.is_or_admin(&item.uploader) {
                return abort(MarketError::forbidden("Not authorized to delete this item"));
            }
            items.remove(item_id.as_bytes())?;
            Ok(())
        });
        flatten_tx(result)?;

        info!(item = %item_id, actor = %actor.id, "item deleted");
        Ok(())
    }

    /// The public listing: approved items, newest first.
    pub fn listed_items(&self) -> Result<Vec<Item>> {
        let mut items: Vec<Item> = self
            .store
            .scan::<Item>()?
            .into_iter()
            .filter(|item| item.is_approved)
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    pub fn items_owned_by(&self, actor: &Actor) -> Result<Vec<Item>> {
        Ok(self
            .store
            .scan::<Item>()?
            .into_iter()
            .filter(|item| actor.is(&item.uploader))
            .collect())
    }
}
