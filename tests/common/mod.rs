#![allow(dead_code)]

use rewear::item::{Item, NewItem};
use rewear::types::{Category, ClothingType, Condition, Size};
use rewear::user::{Actor, NewUser, User, UserUpdate};
use rewear::{MarketService, Rules};
use std::sync::Arc;
use tempfile::TempDir;

/// A service over a fresh database. Sled locks its directory, so every test
/// gets its own; the `TempDir` must outlive the service.
pub struct Market {
    pub service: MarketService,
    pub admin: Actor,
    _dir: TempDir,
}

impl Market {
    pub fn open() -> anyhow::Result<Self> {
        Self::with_rules(Rules::default())
    }

    pub fn with_rules(rules: Rules) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let db = sled::open(dir.path().join("market.db"))?;
        let service = MarketService::new(Arc::new(db), rules)?;
        let (admin, _) = service.ensure_admin("Admin User", "admin@rewear.com")?;

        Ok(Self {
            service,
            admin: Actor::from(&admin),
            _dir: dir,
        })
    }

    pub fn user(&self, name: &str) -> anyhow::Result<Actor> {
        let user = self.service.register_user(NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        })?;
        Ok(Actor::from(&user))
    }

    /// Overwrite a balance through the admin path.
    pub fn set_points(&self, actor: &Actor, points: u64) -> anyhow::Result<()> {
        self.service.update_user(
            &self.admin,
            &actor.id,
            UserUpdate {
                points: Some(points),
                ..UserUpdate::default()
            },
        )?;
        Ok(())
    }

    pub fn points(&self, actor: &Actor) -> anyhow::Result<u64> {
        Ok(self.service.get_user(&actor.id)?.points)
    }

    pub fn item(&self, id: &str) -> anyhow::Result<Item> {
        Ok(self.service.get_item(id)?)
    }

    /// A moderated, publicly listed item. Approval pays the listing bonus.
    pub fn listed_item(&self, owner: &Actor, title: &str, point_value: u64) -> anyhow::Result<Item> {
        let item = self.service.create_item(owner, draft(title, point_value))?;
        Ok(self.service.approve_item(&self.admin, &item.id, true)?)
    }

    pub fn total_points(&self) -> anyhow::Result<u64> {
        Ok(self
            .service
            .list_users(&self.admin)?
            .iter()
            .map(|user: &User| user.points)
            .sum())
    }
}

pub fn draft(title: &str, point_value: u64) -> NewItem {
    NewItem {
        title: title.to_string(),
        description: format!("{title}, gently worn"),
        category: Category::Unisex,
        kind: ClothingType::Tops,
        size: Size::M,
        condition: Condition::Good,
        tags: vec!["cotton".to_string()],
        images: vec!["/uploads/placeholder.png".to_string()],
        point_value: Some(point_value),
    }
}
