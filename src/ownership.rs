//! Item ownership registry
use super::item::Item;

/// Hand `item` to `new_owner`. The item stays available so the new owner can trade it on.
pub fn transfer(item: &mut Item, new_owner: &str) {
    item.uploader = new_owner.to_string();
    item.is_available = true;
}

/// Swap the owners of two items.
pub fn exchange(a: &mut Item, b: &mut Item) {
    std::mem::swap(&mut a.uploader, &mut b.uploader);
    a.is_available = true;
    b.is_available = true;
}

pub fn is_owned_by(item: &Item, user_id: &str) -> bool {
    item.uploader == user_id
}
