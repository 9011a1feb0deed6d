//! Settlement engine
//!
//! Drives a swap request through `pending -> approved -> completed` or into
//! `rejected`, applying the point and ownership changes that belong to each
//! edge. A status change is planned from a plain read (authorization and the
//! edge check), then committed inside one sled transaction that re-reads the
//! request and refuses with `Conflict` if its status moved in between. Every
//! record the transition touches is written in that same transaction.
//!
//! Approval is the single point of settlement. Completion only stamps
//! `completed_at`. Rejecting an approved request reverses the stored receipt.
use super::error::{MarketError, Result, ValidationError};
use super::item::Item;
use super::ledger;
use super::ownership;
use super::service::MarketService;
use super::store::{TxResult, abort, flatten_tx, tx_get, tx_put, tx_require};
use super::swap::{Offer, Settlement, SwapRequest};
use super::types::{SwapStatus, TimeStamp};
use super::user::{Actor, User};
use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, TransactionalTree};
use tracing::{debug, info, warn};

/// A status change that passed authorization and the edge check against the
/// status observed at planning time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub swap_id: String,
    pub actor: Actor,
    pub from: SwapStatus,
    pub to: SwapStatus,
}

impl MarketService {
    /// Move a swap request to `new_status` on behalf of `actor`.
    pub fn change_swap_status(
        &self,
        actor: &Actor,
        swap_id: &str,
        new_status: &str,
    ) -> Result<SwapRequest> {
        let to: SwapStatus = new_status.parse()?;
        let transition = self.plan_transition(actor, swap_id, to)?;
        self.commit_transition(&transition)
    }

    pub fn plan_transition(&self, actor: &Actor, swap_id: &str, to: SwapStatus) -> Result<Transition> {
        let swap: SwapRequest = self.store.require(swap_id)?;
        let target: Item = self.store.require(&swap.item)?;

        authorize(actor, &swap, &target)?;
        swap.status.check_transition(to)?;

        debug!(swap = %swap.id, from = %swap.status, to = %to, actor = %actor.id, "transition planned");
        Ok(Transition {
            swap_id: swap.id,
            actor: actor.clone(),
            from: swap.status,
            to,
        })
    }

    /// Apply a planned transition atomically. Fails with `Conflict` when the
    /// request is no longer in the status the plan was made against.
    pub fn commit_transition(&self, transition: &Transition) -> Result<SwapRequest> {
        let bonus = self.rules.swap_bonus;
        let store = &self.store;

        let result = (&store.users, &store.items, &store.swaps).transaction(|(users, items, swaps)| {
            let Some(mut swap) = tx_get::<SwapRequest>(swaps, &transition.swap_id)? else {
                return abort(MarketError::Conflict(format!(
                    "swap request {} was removed before this update committed",
                    transition.swap_id
                )));
            };
            if swap.status != transition.from {
                return abort(MarketError::Conflict(format!(
                    "swap request {} moved from {} to {} before this update committed",
                    swap.id, transition.from, swap.status
                )));
            }

            let mut target: Item = tx_require(items, &swap.item)?;
            authorize(&transition.actor, &swap, &target).map_err(ConflictableTransactionError::Abort)?;

            match transition.to {
                SwapStatus::Approved => settle(users, items, &mut swap, &mut target, bonus)?,
                SwapStatus::Completed => swap.completed_at = Some(TimeStamp::new()),
                SwapStatus::Rejected if transition.from == SwapStatus::Approved => {
                    unwind(users, items, &swap, &mut target)?
                }
                // rejecting a pending request reserved nothing
                _ => {}
            }

            swap.record(&transition.actor.id, transition.to);
            tx_put(swaps, &swap)?;
            Ok(swap)
        });

        match flatten_tx(result) {
            Ok(swap) => {
                info!(
                    swap = %swap.id,
                    from = %transition.from,
                    to = %transition.to,
                    actor = %transition.actor.id,
                    "swap status changed"
                );
                Ok(swap)
            }
            Err(e) => {
                if matches!(e, MarketError::Conflict(_)) {
                    warn!(swap = %transition.swap_id, error = %e, "swap status change lost a race");
                } else {
                    debug!(swap = %transition.swap_id, error = %e, "swap status change refused");
                }
                Err(e)
            }
        }
    }

    /// Withdraw a pending request. The record is deleted and a tombstone kept,
    /// so a repeated cancel is told apart from an unknown id.
    pub fn cancel_swap_request(&self, actor: &Actor, swap_id: &str) -> Result<()> {
        let Some(swap) = self.store.get::<SwapRequest>(swap_id)? else {
            if self.store.was_cancelled(swap_id)? {
                return Err(MarketError::InvalidTransition(format!(
                    "swap request {swap_id} has already been cancelled"
                )));
            }
            return Err(MarketError::not_found(format!("Swap request {swap_id}")));
        };

        if !actor.is_or_admin(&swap.requester) {
            return Err(MarketError::forbidden(
                "Not authorized to cancel this swap request",
            ));
        }
        if swap.status != SwapStatus::Pending {
            return Err(MarketError::InvalidTransition(format!(
                "Cannot cancel a swap request with status: {}",
                swap.status
            )));
        }

        let store = &self.store;
        let result = (&store.swaps, &store.cancelled).transaction(|(swaps, cancelled)| {
            match tx_get::<SwapRequest>(swaps, swap_id)? {
                Some(current) if current.status == SwapStatus::Pending => {}
                _ => {
                    return abort(MarketError::Conflict(format!(
                        "swap request {swap_id} changed before it could be cancelled"
                    )));
                }
            }
            let stamp = minicbor::to_vec(TimeStamp::new())
                .map_err(|e| ConflictableTransactionError::Abort(e.into()))?;
            swaps.remove(swap_id.as_bytes())?;
            cancelled.insert(swap_id.as_bytes(), stamp)?;
            Ok(())
        });
        flatten_tx(result)?;

        info!(swap = %swap_id, actor = %actor.id, "swap request cancelled");
        Ok(())
    }
}

fn authorize(actor: &Actor, swap: &SwapRequest, target: &Item) -> Result<()> {
    if actor.is_or_admin(swap.counterparty(target)) {
        return Ok(());
    }
    Err(MarketError::forbidden(
        "Not authorized to update this swap request",
    ))
}

// pending -> approved
fn settle(
    users: &TransactionalTree,
    items: &TransactionalTree,
    swap: &mut SwapRequest,
    target: &mut Item,
    bonus: u64,
) -> TxResult<()> {
    if ownership::is_owned_by(target, &swap.requester) {
        return abort(MarketError::SelfRequest);
    }
    let mut owner: User = tx_require(users, &target.uploader)?;
    let mut requester: User = tx_require(users, &swap.requester)?;

    let receipt = match &swap.offer {
        Offer::Points(_) => settle_points(&mut requester, &mut owner, target, bonus),
        Offer::Item(offered_id) => {
            let mut offered: Item = tx_require(items, offered_id)?;
            let receipt = settle_exchange(&mut requester, &mut owner, target, &mut offered, bonus);
            tx_put(items, &offered)?;
            receipt
        }
    }
    .map_err(ConflictableTransactionError::Abort)?;

    tx_put(users, &requester)?;
    tx_put(users, &owner)?;
    tx_put(items, target)?;
    swap.settlement = Some(receipt);
    Ok(())
}

// approved -> rejected
fn unwind(
    users: &TransactionalTree,
    items: &TransactionalTree,
    swap: &SwapRequest,
    target: &mut Item,
) -> TxResult<()> {
    let Some(receipt) = &swap.settlement else {
        return Ok(());
    };
    let mut owner: User = tx_require(users, &receipt.owner)?;
    let mut requester: User = tx_require(users, &swap.requester)?;

    match &swap.offer {
        Offer::Points(_) => unwind_points(&mut requester, &mut owner, target, receipt),
        Offer::Item(offered_id) => {
            let mut offered: Item = tx_require(items, offered_id)?;
            let undone = unwind_exchange(&mut requester, &mut owner, target, &mut offered, receipt);
            tx_put(items, &offered)?;
            undone
        }
    }
    .map_err(ConflictableTransactionError::Abort)?;

    tx_put(users, &requester)?;
    tx_put(users, &owner)?;
    tx_put(items, target)?;
    Ok(())
}

/// Points redemption: the requester pays the live point value, the owner
/// receives it plus the bonus, and the item changes hands.
fn settle_points(
    requester: &mut User,
    owner: &mut User,
    target: &mut Item,
    bonus: u64,
) -> Result<Settlement> {
    let price = target.point_value;
    let proceeds = price
        .checked_add(bonus)
        .ok_or(ValidationError::BalanceOverflow)?;

    ledger::debit(requester, price)?;
    ledger::credit(owner, proceeds)?;
    ownership::transfer(target, &requester.id);

    Ok(Settlement {
        owner: owner.id.clone(),
        points_paid: price,
        owner_bonus: bonus,
        requester_bonus: 0,
        settled_at: TimeStamp::new(),
    })
}

/// Direct swap: the two items trade owners and both parties earn the bonus.
fn settle_exchange(
    requester: &mut User,
    owner: &mut User,
    target: &mut Item,
    offered: &mut Item,
    bonus: u64,
) -> Result<Settlement> {
    if !ownership::is_owned_by(offered, &requester.id) {
        // the requester traded it away after making the offer
        return Err(MarketError::Unavailable(format!("Offered item {}", offered.id)));
    }

    ownership::exchange(target, offered);
    ledger::credit(requester, bonus)?;
    ledger::credit(owner, bonus)?;

    Ok(Settlement {
        owner: owner.id.clone(),
        points_paid: 0,
        owner_bonus: bonus,
        requester_bonus: bonus,
        settled_at: TimeStamp::new(),
    })
}

fn unwind_points(
    requester: &mut User,
    owner: &mut User,
    target: &mut Item,
    receipt: &Settlement,
) -> Result<()> {
    if !ownership::is_owned_by(target, &requester.id) {
        return Err(MarketError::Conflict(format!(
            "item {} has changed hands since approval",
            target.id
        )));
    }
    let refund = receipt
        .points_paid
        .checked_add(receipt.owner_bonus)
        .ok_or(ValidationError::BalanceOverflow)?;

    ledger::debit(owner, refund)?;
    ledger::credit(requester, receipt.points_paid)?;
    ownership::transfer(target, &owner.id);
    Ok(())
}

fn unwind_exchange(
    requester: &mut User,
    owner: &mut User,
    target: &mut Item,
    offered: &mut Item,
    receipt: &Settlement,
) -> Result<()> {
    if !ownership::is_owned_by(target, &requester.id) || !ownership::is_owned_by(offered, &owner.id) {
        return Err(MarketError::Conflict(format!(
            "items {} and {} have changed hands since approval",
            target.id, offered.id
        )));
    }

    ledger::debit(requester, receipt.requester_bonus)?;
    ledger::debit(owner, receipt.owner_bonus)?;
    ownership::exchange(target, offered);
    Ok(())
}
