use serde::{Deserialize, Serialize};

use super::error::{UserError, UserResult};
use super::repo_types::{NewUser, UserPatch};

/// `age` as clients send it: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AgeInput {
    Number(serde_json::Number),
    Text(String),
}

impl AgeInput {
    /// Zero and the empty string count as "not given".
    pub fn is_truthy(&self) -> bool {
        match self {
            AgeInput::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            AgeInput::Text(s) => !s.is_empty(),
        }
    }

    /// Leading-integer coercion: `"42abc"` is 42, `30.9` is 30.
    pub fn to_age(&self) -> UserResult<i64> {
        let parsed = match self {
            AgeInput::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            AgeInput::Text(s) => leading_integer(s),
        };
        parsed.ok_or_else(|| UserError::Validation("age must be an integer".into()))
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn truthy(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub age: Option<AgeInput>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(self) -> UserResult<NewUser> {
        let (Some(first_name), Some(last_name), Some(email), Some(age)) = (
            truthy(self.first_name),
            truthy(self.last_name),
            truthy(self.email),
            self.age.filter(AgeInput::is_truthy),
        ) else {
            return Err(UserError::Validation(
                "firstName, lastName, email, and age are required".into(),
            ));
        };

        Ok(NewUser {
            first_name,
            last_name,
            email,
            age: age.to_age()?,
            password: truthy(self.password),
            role: truthy(self.role),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub age: Option<AgeInput>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    /// Absent, null, empty and zero fields are dropped: they never overwrite.
    pub fn into_patch(self) -> UserResult<UserPatch> {
        let age = match self.age.filter(AgeInput::is_truthy) {
            Some(a) => Some(a.to_age()?),
            None => None,
        };
        Ok(UserPatch {
            first_name: truthy(self.first_name),
            last_name: truthy(self.last_name),
            email: truthy(self.email),
            age,
            password: truthy(self.password),
            role: truthy(self.role),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    pub message: String,
    pub deleted_count: u64,
}
