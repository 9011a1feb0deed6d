//! Account registration, profiles and admin user management
use super::error::{MarketError, Result, ValidationError};
use super::item::Item;
use super::service::{MarketService, require_admin};
use super::store::{abort, flatten_tx, tx_put, tx_require};
use super::swap::SwapRequest;
use super::types::{SwapStatus, TimeStamp};
use super::user::{Actor, NewUser, ProfileUpdate, User, UserUpdate, normalise_email, normalise_name};
use super::utils::{USER_HRP, new_uuid_to_bech32};
use sled::Transactional;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub users: usize,
    pub items: ItemStats,
    pub swaps: SwapStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub available: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl MarketService {
    pub fn register_user(&self, new_user: NewUser) -> Result<User> {
        self.insert_user(new_user, false)
    }

    fn insert_user(&self, new_user: NewUser, is_admin: bool) -> Result<User> {
        let user = User {
            id: new_uuid_to_bech32(USER_HRP)?,
            name: normalise_name(&new_user.name)?,
            email: normalise_email(&new_user.email)?,
            points: self.rules.starting_points,
            is_admin,
            created_at: TimeStamp::new(),
        };

        // the email index entry and the account land together
        let store = &self.store;
        let result = (&store.users, &store.emails).transaction(|(users, emails)| {
            if emails.get(user.email.as_bytes())?.is_some() {
                return abort(ValidationError::DuplicateEmail(user.email.clone()));
            }
            tx_put(users, &user)?;
            emails.insert(user.email.as_bytes(), user.id.as_bytes())?;
            Ok(())
        });
        flatten_tx(result)?;

        info!(user = %user.id, admin = is_admin, "user registered");
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        match self.store.user_id_for_email(&email)? {
            Some(user_id) => self.store.get(&user_id),
            None => Ok(None),
        }
    }

    /// Create the admin account unless one with this email exists. Returns the
    /// account and whether it was created.
    pub fn ensure_admin(&self, name: &str, email: &str) -> Result<(User, bool)> {
        if let Some(existing) = self.find_user_by_email(email)? {
            if !existing.is_admin {
                warn!(user = %existing.id, "seed email belongs to a non-admin account");
            }
            return Ok((existing, false));
        }
        let admin = self.insert_user(
            NewUser {
                name: name.to_string(),
                email: email.to_string(),
            },
            true,
        )?;
        Ok((admin, true))
    }

    pub fn get_user(&self, user_id: &str) -> Result<User> {
        self.store.require(user_id)
    }

    pub fn update_profile(&self, actor: &Actor, update: ProfileUpdate) -> Result<User> {
        let name = update.name.as_deref().map(normalise_name).transpose()?;

        let result = self.store.users.transaction(|users| {
            let mut user: User = tx_require(users, &actor.id)?;
            if let Some(name) = &name {
                user.name = name.clone();
            }
            tx_put(users, &user)?;
            Ok(user)
        });
        flatten_tx(result)
    }

    pub fn list_users(&self, actor: &Actor) -> Result<Vec<User>> {
        require_admin(actor)?;
        let mut users = self.store.scan::<User>()?;
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    /// Patch an account as it stands at commit time. Fields left `None` keep
    /// whatever concurrent settlements wrote.
    pub fn update_user(&self, actor: &Actor, user_id: &str, update: UserUpdate) -> Result<User> {
        require_admin(actor)?;
        let name = update.name.as_deref().map(normalise_name).transpose()?;
        let email = update.email.as_deref().map(normalise_email).transpose()?;

        let store = &self.store;
        let result = (&store.users, &store.emails).transaction(|(users, emails)| {
            let mut user: User = tx_require(users, user_id)?;

            if let Some(name) = &name {
                user.name = name.clone();
            }
            if let Some(email) = email.as_ref().filter(|email| **email != user.email) {
                if emails.get(email.as_bytes())?.is_some() {
                    return abort(ValidationError::DuplicateEmail(email.clone()));
                }
                emails.remove(user.email.as_bytes())?;
                emails.insert(email.as_bytes(), user.id.as_bytes())?;
                user.email = email.clone();
            }
            if let Some(points) = update.points {
                user.points = points;
            }
            if let Some(is_admin) = update.is_admin {
                user.is_admin = is_admin;
            }

            tx_put(users, &user)?;
            Ok(user)
        });
        let user = flatten_tx(result)?;

        info!(user = %user.id, actor = %actor.id, points = user.points, admin = user.is_admin, "user updated by admin");
        Ok(user)
    }

    pub fn delete_user(&self, actor: &Actor, user_id: &str) -> Result<()> {
        require_admin(actor)?;

        let store = &self.store;
        let result = (&store.users, &store.emails).transaction(|(users, emails)| {
            let user: User = tx_require(users, user_id)?;
            if user.is_admin {
                return abort(MarketError::forbidden("Cannot delete admin user"));
            }
            users.remove(user_id.as_bytes())?;
            emails.remove(user.email.as_bytes())?;
            Ok(())
        });
        flatten_tx(result)?;

        info!(user = %user_id, actor = %actor.id, "user deleted");
        Ok(())
    }

    pub fn dashboard_stats(&self, actor: &Actor) -> Result<DashboardStats> {
        require_admin(actor)?;

        let mut items = ItemStats::default();
        for item in self.store.scan::<Item>()? {
            items.total += 1;
            if item.is_approved {
                items.approved += 1;
            } else {
                items.pending += 1;
            }
            if item.is_listed() {
                items.available += 1;
            }
        }

        let mut swaps = SwapStats::default();
        for swap in self.store.scan::<SwapRequest>()? {
            swaps.total += 1;
            match swap.status {
                SwapStatus::Pending => swaps.pending += 1,
                SwapStatus::Completed => swaps.completed += 1,
                _ => {}
            }
        }

        Ok(DashboardStats {
            users: self.store.count::<User>(),
            items,
            swaps,
        })
    }
}
