use anyhow::Context;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::repo::UserStore;
use super::repo_types::User;

// (first, last, email, age, role); all share the same demo password
const DEFAULT_USERS: &[(&str, &str, &str, i64, &str)] = &[
    ("John", "Doe", "john.doe@email.com", 28, "user"),
    ("Jane", "Smith", "jane.smith@email.com", 32, "admin"),
    ("Alice", "Johnson", "alice.j@email.com", 25, "user"),
    ("Bob", "Williams", "bob.w@email.com", 45, "user"),
    ("Charlie", "Brown", "charlie.b@email.com", 38, "moderator"),
    ("Diana", "Davis", "diana.d@email.com", 29, "user"),
    ("Eve", "Martinez", "eve.m@email.com", 41, "user"),
    ("Frank", "Garcia", "frank.g@email.com", 35, "admin"),
    ("Grace", "Wilson", "grace.w@email.com", 27, "user"),
    ("Henry", "Anderson", "henry.a@email.com", 50, "user"),
];

const DEMO_PASSWORD: &str = "password123";

/// Inserts the demo users when the store is empty. Returns how many were added.
pub async fn seed_if_empty(store: &dyn UserStore) -> anyhow::Result<usize> {
    let existing = store.count().await.context("count users before seeding")?;
    if existing > 0 {
        info!(existing, "store not empty; skipping seed");
        return Ok(0);
    }

    for (first_name, last_name, email, age, role) in DEFAULT_USERS {
        let user = User {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            age: *age,
            password: DEMO_PASSWORD.to_string(),
            role: role.to_string(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        store
            .insert(user)
            .await
            .with_context(|| format!("seed user {email}"))?;
    }

    info!(count = DEFAULT_USERS.len(), "default users inserted");
    Ok(DEFAULT_USERS.len())
}
