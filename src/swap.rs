//! Swap requests: the record of a proposed exchange and how it is created
use super::error::{MarketError, Result, ValidationError};
use super::item::Item;
use super::ledger;
use super::service::{MarketService, require_admin};
use super::types::{SwapKind, SwapStatus, TimeStamp};
use super::user::{Actor, User};
use super::utils::{SWAP_HRP, new_uuid_to_bech32};
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info};

pub const MESSAGE_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct SwapRequest {
    #[n(0)]
    pub id: String, // bech32, `swap_` prefix
    #[n(1)]
    pub requester: String,
    #[n(2)]
    pub item: String, // the requested (target) item
    #[n(3)]
    pub offer: Offer,
    #[n(4)]
    pub status: SwapStatus,
    #[n(5)]
    pub message: Option<String>,
    #[n(6)]
    pub created_at: TimeStamp<Utc>,
    #[n(7)]
    pub completed_at: Option<TimeStamp<Utc>>,
    #[n(8)]
    pub settlement: Option<Settlement>,
    #[n(9)]
    pub history: Vec<StatusEvent>,
}

/// What the requester puts up. Exactly one form exists per request.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum Offer {
    /// A requester-owned item, for `swap` requests.
    #[n(0)]
    Item(#[n(0)] String),
    /// The target's point value when the request was made, for `points` requests.
    #[n(1)]
    Points(#[n(0)] u64),
}

/// Receipt of what approval moved, kept so rejection can undo it exactly.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Settlement {
    #[n(0)]
    pub owner: String, // the target's owner at approval time
    #[n(1)]
    pub points_paid: u64,
    #[n(2)]
    pub owner_bonus: u64,
    #[n(3)]
    pub requester_bonus: u64,
    #[n(4)]
    pub settled_at: TimeStamp<Utc>,
}

impl Settlement {
    /// Points created by this settlement rather than moved between users.
    pub fn minted(&self) -> u64 {
        self.owner_bonus.saturating_add(self.requester_bonus)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct StatusEvent {
    #[n(0)]
    pub actor: String,
    #[n(1)]
    pub status: SwapStatus,
    #[n(2)]
    pub at: TimeStamp<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSwapRequest {
    pub item: String,
    pub kind: SwapKind,
    pub offered_item: Option<String>,
    pub message: Option<String>,
}

impl SwapRequest {
    pub fn kind(&self) -> SwapKind {
        match self.offer {
            Offer::Item(_) => SwapKind::Swap,
            Offer::Points(_) => SwapKind::Points,
        }
    }
    pub fn offered_item(&self) -> Option<&str> {
        match &self.offer {
            Offer::Item(id) => Some(id),
            Offer::Points(_) => None,
        }
    }
    pub fn points_offered(&self) -> Option<u64> {
        match self.offer {
            Offer::Points(points) => Some(points),
            Offer::Item(_) => None,
        }
    }
    /// The user entitled to decide on this request besides an admin: the
    /// target's owner, or the owner recorded at settlement once approved.
    pub fn counterparty<'a>(&'a self, target: &'a Item) -> &'a str {
        match &self.settlement {
            Some(settlement) => &settlement.owner,
            None => &target.uploader,
        }
    }
    pub(crate) fn record(&mut self, actor: &str, status: SwapStatus) {
        self.status = status;
        self.history.push(StatusEvent {
            actor: actor.to_string(),
            status,
            at: TimeStamp::new(),
        });
    }
}

impl NewSwapRequest {
    // Shape checks that need no lookups.
    fn check_shape(&self) -> Result<()> {
        if let Some(message) = &self.message {
            if message.chars().count() > MESSAGE_MAX {
                return Err(ValidationError::TooLong {
                    field: "Message",
                    max: MESSAGE_MAX,
                }
                .into());
            }
        }
        if self.kind == SwapKind::Points && self.offered_item.is_some() {
            return Err(ValidationError::UnexpectedOfferedItem.into());
        }
        Ok(())
    }
}

impl MarketService {
    /// Create a pending swap request. Nothing is reserved or paid until approval.
    pub fn create_swap_request(&self, actor: &Actor, request: NewSwapRequest) -> Result<SwapRequest> {
        request.check_shape()?;

        let requester: User = self.store.require(&actor.id)?;
        let target: Item = self.store.require(&request.item)?;

        if !target.is_listed() {
            return Err(MarketError::Unavailable(format!("Item {}", target.id)));
        }
        if target.uploader == requester.id {
            return Err(MarketError::SelfRequest);
        }

        let offer = match request.kind {
            SwapKind::Swap => {
                let offered_id = request
                    .offered_item
                    .ok_or_else(|| MarketError::not_found("Offered item"))?;
                let offered: Item = self
                    .store
                    .get(&offered_id)?
                    .ok_or_else(|| MarketError::not_found(format!("Offered item {offered_id}")))?;
                if offered.uploader != requester.id {
                    return Err(MarketError::forbidden("You can only offer your own items"));
                }
                if !offered.is_listed() {
                    return Err(MarketError::Unavailable(format!("Offered item {offered_id}")));
                }
                Offer::Item(offered_id)
            }
            SwapKind::Points => {
                ledger::ensure_funds(&requester, target.point_value)?;
                Offer::Points(target.point_value)
            }
        };

        let mut swap = SwapRequest {
            id: new_uuid_to_bech32(SWAP_HRP)?,
            requester: requester.id.clone(),
            item: target.id.clone(),
            offer,
            status: SwapStatus::Pending,
            message: request.message.filter(|m| !m.trim().is_empty()),
            created_at: TimeStamp::new(),
            completed_at: None,
            settlement: None,
            history: vec![],
        };
        swap.record(&requester.id, SwapStatus::Pending);
        self.store.put(&swap)?;

        info!(
            swap = %swap.id,
            requester = %swap.requester,
            item = %swap.item,
            kind = %swap.kind(),
            "swap request created"
        );
        Ok(swap)
    }

    /// Visible to the requester, the counterparty and admins.
    pub fn get_swap_request(&self, actor: &Actor, swap_id: &str) -> Result<SwapRequest> {
        let swap: SwapRequest = self.store.require(swap_id)?;
        let counterparty = self
            .store
            .get::<Item>(&swap.item)?
            .map(|target| swap.counterparty(&target).to_string());

        let allowed = actor.is_or_admin(&swap.requester)
            || counterparty.as_deref().is_some_and(|owner| actor.is(owner));
        if !allowed {
            return Err(MarketError::forbidden(
                "Not authorized to view this swap request",
            ));
        }
        Ok(swap)
    }

    /// The caller's own outgoing requests, newest first.
    pub fn swap_requests_for(&self, actor: &Actor) -> Result<Vec<SwapRequest>> {
        let mut swaps: Vec<SwapRequest> = self
            .store
            .scan::<SwapRequest>()?
            .into_iter()
            .filter(|swap| actor.is(&swap.requester))
            .collect();
        newest_first(&mut swaps);
        debug!(user = %actor.id, count = swaps.len(), "listed outgoing swap requests");
        Ok(swaps)
    }

    /// Pending requests that target items the caller currently owns.
    pub fn received_swap_requests(&self, actor: &Actor) -> Result<Vec<SwapRequest>> {
        let owned: HashSet<String> = self
            .store
            .scan::<Item>()?
            .into_iter()
            .filter(|item| actor.is(&item.uploader))
            .map(|item| item.id)
            .collect();

        let mut swaps: Vec<SwapRequest> = self
            .store
            .scan::<SwapRequest>()?
            .into_iter()
            .filter(|swap| swap.status == SwapStatus::Pending && owned.contains(&swap.item))
            .collect();
        newest_first(&mut swaps);
        Ok(swaps)
    }

    pub fn all_swap_requests(&self, actor: &Actor) -> Result<Vec<SwapRequest>> {
        require_admin(actor)?;
        let mut swaps = self.store.scan::<SwapRequest>()?;
        newest_first(&mut swaps);
        Ok(swaps)
    }
}

fn newest_first(swaps: &mut [SwapRequest]) {
    swaps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
