//! Identifier minting

use super::error::{MarketError, Result};
use bech32::Bech32m;
use uuid7::uuid7;

pub const USER_HRP: &str = "user_";
pub const ITEM_HRP: &str = "item_";
pub const SWAP_HRP: &str = "swap_";

// construct a unique record id then encode using bech32m under the record's prefix
pub fn new_uuid_to_bech32(hrp: &str) -> Result<String> {
    let hrp = bech32::Hrp::parse(hrp).map_err(|e| MarketError::Identifier(e.to_string()))?;
    bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())
        .map_err(|e| MarketError::Identifier(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_their_prefix() {
        let user = new_uuid_to_bech32(USER_HRP).unwrap();
        let swap = new_uuid_to_bech32(SWAP_HRP).unwrap();

        assert!(user.starts_with("user_1"));
        assert!(swap.starts_with("swap_1"));
        assert_ne!(user, new_uuid_to_bech32(USER_HRP).unwrap());
    }

    #[test]
    fn empty_prefix_is_rejected() {
        assert!(matches!(
            new_uuid_to_bech32(""),
            Err(MarketError::Identifier(_))
        ));
    }
}
