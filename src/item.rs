//! Garment listings
use super::error::{Result, ValidationError};
use super::types::{Category, ClothingType, Condition, Size, TimeStamp};
use chrono::Utc;

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Item {
    #[n(0)]
    pub id: String, // bech32, `item_` prefix
    #[n(1)]
    pub title: String,
    #[n(2)]
    pub description: String,
    #[n(3)]
    pub category: Category,
    #[n(4)]
    pub kind: ClothingType,
    #[n(5)]
    pub size: Size,
    #[n(6)]
    pub condition: Condition,
    #[n(7)]
    pub tags: Vec<String>,
    #[n(8)]
    pub images: Vec<String>, // storage paths, see `files::FileStore`
    #[n(9)]
    pub uploader: String, // owning user
    #[n(10)]
    pub is_available: bool, // may receive new swap requests
    #[n(11)]
    pub is_approved: bool, // visible in public listings
    #[n(12)]
    pub point_value: u64,
    #[n(13)]
    pub created_at: TimeStamp<Utc>,
}

impl Item {
    /// Eligible to take part in a new swap request.
    pub fn is_listed(&self) -> bool {
        self.is_available && self.is_approved
    }
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub kind: ClothingType,
    pub size: Size,
    pub condition: Condition,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    /// Falls back to the configured default when unset.
    pub point_value: Option<u64>,
}

/// The fields an owner may edit. Ownership and approval are not among them.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub kind: Option<ClothingType>,
    pub size: Option<Size>,
    pub condition: Option<Condition>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub point_value: Option<u64>,
    pub is_available: Option<bool>,
}

impl ItemUpdate {
    pub fn apply(self, item: &mut Item) -> Result<()> {
        if let Some(title) = self.title {
            item.title = check_title(&title)?;
        }
        if let Some(description) = self.description {
            item.description = check_description(&description)?;
        }
        if let Some(images) = self.images {
            item.images = check_images(images)?;
        }
        if let Some(point_value) = self.point_value {
            item.point_value = check_point_value(point_value)?;
        }
        if let Some(tags) = self.tags {
            item.tags = clean_tags(tags);
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(kind) = self.kind {
            item.kind = kind;
        }
        if let Some(size) = self.size {
            item.size = size;
        }
        if let Some(condition) = self.condition {
            item.condition = condition;
        }
        if let Some(is_available) = self.is_available {
            item.is_available = is_available;
        }
        Ok(())
    }
}

impl NewItem {
    // Checks fields and builds the stored record. New listings wait for moderation.
    pub(crate) fn validate_into(
        self,
        id: String,
        uploader: String,
        default_point_value: u64,
    ) -> Result<Item> {
        Ok(Item {
            id,
            title: check_title(&self.title)?,
            description: check_description(&self.description)?,
            category: self.category,
            kind: self.kind,
            size: self.size,
            condition: self.condition,
            tags: clean_tags(self.tags),
            images: check_images(self.images)?,
            uploader,
            is_available: true,
            is_approved: false,
            point_value: check_point_value(self.point_value.unwrap_or(default_point_value))?,
            created_at: TimeStamp::new(),
        })
    }
}

fn check_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::Missing("Title").into());
    }
    if title.chars().count() > TITLE_MAX {
        return Err(ValidationError::TooLong {
            field: "Title",
            max: TITLE_MAX,
        }
        .into());
    }
    Ok(title.to_string())
}

fn check_description(description: &str) -> Result<String> {
    if description.trim().is_empty() {
        return Err(ValidationError::Missing("Description").into());
    }
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(ValidationError::TooLong {
            field: "Description",
            max: DESCRIPTION_MAX,
        }
        .into());
    }
    Ok(description.to_string())
}

fn check_images(images: Vec<String>) -> Result<Vec<String>> {
    let images: Vec<String> = images
        .into_iter()
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .collect();
    if images.is_empty() {
        return Err(ValidationError::NoImages.into());
    }
    Ok(images)
}

fn check_point_value(point_value: u64) -> Result<u64> {
    if point_value == 0 {
        return Err(ValidationError::ZeroPointValue.into());
    }
    Ok(point_value)
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}
