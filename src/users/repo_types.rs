use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_PASSWORD: &str = "defaultPassword";
pub const DEFAULT_ROLE: &str = "user";

/// User record as stored and as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i64,
    pub password: String,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

/// Validated input for a create. Optional fields fall back to defaults in the service.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i64,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Fields to overwrite on update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, user: &mut User, updated_at: OffsetDateTime) {
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.email {
            user.email = v;
        }
        if let Some(v) = self.age {
            user.age = v;
        }
        if let Some(v) = self.password {
            user.password = v;
        }
        if let Some(v) = self.role {
            user.role = v;
        }
        user.updated_at = Some(updated_at);
    }
}

/// Case-insensitive substring match on first OR last name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub search: Option<String>,
}

impl UserFilter {
    pub fn search(term: impl Into<String>) -> Self {
        let term = term.into();
        Self {
            search: (!term.is_empty()).then_some(term),
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let term = term.to_lowercase();
        user.first_name.to_lowercase().contains(&term)
            || user.last_name.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    Id,
    FirstName,
    LastName,
    Email,
    Age,
    Password,
    Role,
    CreatedAt,
    UpdatedAt,
    /// Not a user field; there is nothing to compare, so natural order is kept.
    Unknown(String),
}

impl SortField {
    pub fn parse(name: &str) -> Self {
        match name {
            "id" | "_id" => Self::Id,
            "firstName" => Self::FirstName,
            "lastName" => Self::LastName,
            "email" => Self::Email,
            "age" => Self::Age,
            "password" => Self::Password,
            "role" => Self::Role,
            "createdAt" => Self::CreatedAt,
            "updatedAt" => Self::UpdatedAt,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// SQL expression to order by. Text columns use the "C" collation so the
    /// order is byte-wise, same as the in-memory store.
    pub fn column(&self) -> Option<&'static str> {
        match self {
            Self::Id => Some("id"),
            Self::FirstName => Some(r#"first_name COLLATE "C""#),
            Self::LastName => Some(r#"last_name COLLATE "C""#),
            Self::Email => Some(r#"email COLLATE "C""#),
            Self::Age => Some("age"),
            Self::Password => Some(r#"password COLLATE "C""#),
            Self::Role => Some(r#"role COLLATE "C""#),
            Self::CreatedAt => Some("created_at"),
            Self::UpdatedAt => Some("updated_at"),
            Self::Unknown(_) => None,
        }
    }

    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::FirstName => a.first_name.cmp(&b.first_name),
            Self::LastName => a.last_name.cmp(&b.last_name),
            Self::Email => a.email.cmp(&b.email),
            Self::Age => a.age.cmp(&b.age),
            Self::Password => a.password.cmp(&b.password),
            Self::Role => a.role.cmp(&b.role),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            // None < Some: records never updated come first ascending
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            Self::Unknown(_) => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Only the exact value `desc` sorts descending.
    pub fn parse(order: Option<&str>) -> Self {
        match order {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn from_params(sort_by: Option<&str>, order: Option<&str>) -> Option<Self> {
        let field = sort_by.filter(|s| !s.is_empty())?;
        Some(Self {
            field: SortField::parse(field),
            order: SortOrder::parse(order),
        })
    }

    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        let ord = self.field.compare(a, b);
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user(first: &str, last: &str, age: i64) -> User {
    User {
        id: Uuid::new_v4(),
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        age,
        password: DEFAULT_PASSWORD.into(),
        role: DEFAULT_ROLE.into(),
        created_at: OffsetDateTime::now_utc(),
        updated_at: None,
    }
}
