use super::error::{Result, ValidationError};
use super::types::TimeStamp;
use chrono::Utc;

pub const NAME_MAX: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct User {
    #[n(0)]
    pub id: String, // bech32, `user_` prefix
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub email: String, // stored lower-cased
    #[n(3)]
    pub points: u64,
    #[n(4)]
    pub is_admin: bool,
    #[n(5)]
    pub created_at: TimeStamp<Utc>,
}

/// The verified caller of an operation, resolved by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn is(&self, user_id: &str) -> bool {
        self.id == user_id
    }
    /// The caller is `user_id` or holds administrative privilege.
    pub fn is_or_admin(&self, user_id: &str) -> bool {
        self.is_admin || self.is(user_id)
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
}

/// Fields an administrator may change on any account.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub points: Option<u64>,
    pub is_admin: Option<bool>,
}

pub(crate) fn normalise_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Missing("Name").into());
    }
    if name.chars().count() > NAME_MAX {
        return Err(ValidationError::TooLong {
            field: "Name",
            max: NAME_MAX,
        }
        .into());
    }
    Ok(name.to_string())
}

// local@domain.tld, nothing fancier
pub(crate) fn normalise_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::Missing("Email").into());
    }
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !well_formed {
        return Err(ValidationError::MalformedEmail(email).into());
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarketError;

    #[test]
    fn emails_are_lowercased_and_checked() {
        assert_eq!(normalise_email(" Ann@Example.COM ").unwrap(), "ann@example.com");
        for bad in ["", "ann", "ann@", "@example.com", "ann@example", "a b@example.com"] {
            assert!(
                matches!(normalise_email(bad), Err(MarketError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(normalise_name("  Ann ").unwrap(), "Ann");
        assert!(normalise_name("   ").is_err());
        assert!(normalise_name(&"x".repeat(NAME_MAX + 1)).is_err());
    }

    #[test]
    fn actor_privileges() {
        let member = Actor {
            id: "user_a".into(),
            is_admin: false,
        };
        let admin = Actor {
            id: "user_b".into(),
            is_admin: true,
        };

        assert!(member.is_or_admin("user_a"));
        assert!(!member.is_or_admin("user_c"));
        assert!(admin.is_or_admin("user_c"));
    }
}
