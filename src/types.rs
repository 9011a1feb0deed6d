//! Shared value types: timestamps and the closed enumerations stored on records
use super::error::{MarketError, Result, ValidationError};
use chrono::{DateTime, TimeZone, Utc};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

// ordered by instant
impl PartialOrd for TimeStamp<Utc> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeStamp<Utc> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> std::result::Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _: &mut C,
    ) -> std::result::Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Rejected,
    #[n(3)]
    Completed,
}

impl SwapStatus {
    pub const ALL: [SwapStatus; 4] = [
        SwapStatus::Pending,
        SwapStatus::Approved,
        SwapStatus::Rejected,
        SwapStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Approved => "approved",
            SwapStatus::Rejected => "rejected",
            SwapStatus::Completed => "completed",
        }
    }

    /// The four permitted edges; `rejected` and `completed` are terminal.
    pub fn can_move_to(&self, next: SwapStatus) -> bool {
        matches!(
            (self, next),
            (SwapStatus::Pending, SwapStatus::Approved)
                | (SwapStatus::Pending, SwapStatus::Rejected)
                | (SwapStatus::Approved, SwapStatus::Completed)
                | (SwapStatus::Approved, SwapStatus::Rejected)
        )
    }

    pub fn check_transition(&self, next: SwapStatus) -> Result<()> {
        if self.can_move_to(next) {
            return Ok(());
        }
        Err(MarketError::InvalidTransition(format!(
            "cannot move a swap request from {self} to {next}"
        )))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapStatus::Rejected | SwapStatus::Completed)
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| MarketError::InvalidStatus(s.to_string()))
    }
}

/// How the requester pays for the target item.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapKind {
    #[n(0)]
    Swap,
    #[n(1)]
    Points,
}

impl SwapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapKind::Swap => "swap",
            SwapKind::Points => "points",
        }
    }
}

impl fmt::Display for SwapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "swap" => Ok(SwapKind::Swap),
            "points" => Ok(SwapKind::Points),
            other => Err(ValidationError::UnknownLabel {
                what: "swap type",
                value: other.to_string(),
            }
            .into()),
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    #[n(0)]
    Men,
    #[n(1)]
    Women,
    #[n(2)]
    Kids,
    #[n(3)]
    Unisex,
    #[n(4)]
    Accessories,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Men,
        Category::Women,
        Category::Kids,
        Category::Unisex,
        Category::Accessories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Men => "Men",
            Category::Women => "Women",
            Category::Kids => "Kids",
            Category::Unisex => "Unisex",
            Category::Accessories => "Accessories",
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClothingType {
    #[n(0)]
    Tops,
    #[n(1)]
    Bottoms,
    #[n(2)]
    Dresses,
    #[n(3)]
    Outerwear,
    #[n(4)]
    Footwear,
    #[n(5)]
    Accessories,
    #[n(6)]
    Other,
}

impl ClothingType {
    pub const ALL: [ClothingType; 7] = [
        ClothingType::Tops,
        ClothingType::Bottoms,
        ClothingType::Dresses,
        ClothingType::Outerwear,
        ClothingType::Footwear,
        ClothingType::Accessories,
        ClothingType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingType::Tops => "Tops",
            ClothingType::Bottoms => "Bottoms",
            ClothingType::Dresses => "Dresses",
            ClothingType::Outerwear => "Outerwear",
            ClothingType::Footwear => "Footwear",
            ClothingType::Accessories => "Accessories",
            ClothingType::Other => "Other",
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Size {
    #[n(0)]
    XS,
    #[n(1)]
    S,
    #[n(2)]
    M,
    #[n(3)]
    L,
    #[n(4)]
    XL,
    #[n(5)]
    XXL,
    #[n(6)]
    XXXL,
    #[n(7)]
    OneSize,
    #[n(8)]
    Other,
}

impl Size {
    pub const ALL: [Size; 9] = [
        Size::XS,
        Size::S,
        Size::M,
        Size::L,
        Size::XL,
        Size::XXL,
        Size::XXXL,
        Size::OneSize,
        Size::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::XS => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::XL => "XL",
            Size::XXL => "XXL",
            Size::XXXL => "XXXL",
            Size::OneSize => "One Size",
            Size::Other => "Other",
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Condition {
    #[n(0)]
    NewWithTags,
    #[n(1)]
    LikeNew,
    #[n(2)]
    Good,
    #[n(3)]
    Fair,
    #[n(4)]
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::NewWithTags,
        Condition::LikeNew,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::NewWithTags => "New with tags",
            Condition::LikeNew => "Like new",
            Condition::Good => "Good",
            Condition::Fair => "Fair",
            Condition::Poor => "Poor",
        }
    }
}

// listing enums parse from their display labels, e.g. "One Size" or "New with tags"
macro_rules! labelled {
    ($($ty:ident => $what:literal),+ $(,)?) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = MarketError;

            fn from_str(s: &str) -> Result<Self> {
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        ValidationError::UnknownLabel {
                            what: $what,
                            value: s.to_string(),
                        }
                        .into()
                    })
            }
        }
    )+};
}

labelled! {
    Category => "category",
    ClothingType => "clothing type",
    Size => "size",
    Condition => "condition",
}
