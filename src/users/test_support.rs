use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::StoreError;
use super::repo::{StoreResult, UserStore};
use super::repo_types::{SortSpec, User, UserFilter, UserPatch};

/// Reads fail as if the connection dropped; `count` reports an empty store
/// and every insert trips the email constraint.
pub(crate) struct BrokenStore;

#[async_trait]
impl UserStore for BrokenStore {
    async fn list(&self, _: &UserFilter, _: Option<&SortSpec>) -> StoreResult<Vec<User>> {
        Err(anyhow::anyhow!("connection refused").into())
    }
    async fn find_by_id(&self, _: Uuid) -> StoreResult<Option<User>> {
        Err(anyhow::anyhow!("connection refused").into())
    }
    async fn find_by_email(&self, _: &str) -> StoreResult<Option<User>> {
        Ok(None)
    }
    async fn insert(&self, _: User) -> StoreResult<User> {
        Err(StoreError::DuplicateEmail)
    }
    async fn update(&self, _: Uuid, _: UserPatch, _: OffsetDateTime) -> StoreResult<Option<User>> {
        Err(anyhow::anyhow!("connection refused").into())
    }
    async fn delete(&self, _: Uuid) -> StoreResult<u64> {
        Err(anyhow::anyhow!("connection refused").into())
    }
    async fn count(&self) -> StoreResult<u64> {
        Ok(0)
    }
    async fn close(&self) {}
}
