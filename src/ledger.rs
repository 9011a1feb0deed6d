//! Point-balance primitives
//!
//! These mutate an in-memory [`User`] copy. Callers load the record inside a
//! sled transaction, apply every adjustment of one settlement, and write the
//! copies back together, so a failed debit leaves nothing behind.
use super::error::{MarketError, Result, ValidationError};
use super::user::User;

pub fn ensure_funds(user: &User, need: u64) -> Result<()> {
    if user.points < need {
        return Err(MarketError::InsufficientPoints {
            have: user.points,
            need,
        });
    }
    Ok(())
}

pub fn debit(user: &mut User, amount: u64) -> Result<()> {
    ensure_funds(user, amount)?;
    user.points -= amount;
    Ok(())
}

pub fn credit(user: &mut User, amount: u64) -> Result<()> {
    user.points = user
        .points
        .checked_add(amount)
        .ok_or(ValidationError::BalanceOverflow)?;
    Ok(())
}
