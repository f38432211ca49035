use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::StoreError;
use super::repo::{StoreResult, UserStore};
use super::repo_types::{SortSpec, User, UserFilter, UserPatch};

/// In-process store. Records are kept in insertion order, which is the
/// natural order returned by unsorted listings. Writes take the lock for the
/// whole check-then-modify step, so the email constraint cannot race.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self, filter: &UserFilter, sort: Option<&SortSpec>) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut out: Vec<User> = users.iter().filter(|u| filter.matches(u)).cloned().collect();
        if let Some(spec) = sort {
            // stable, so ties keep insertion order
            out.sort_by(|a, b| spec.compare(a, b));
        }
        Ok(out)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: UserPatch,
        updated_at: OffsetDateTime,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(email) = &patch.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        patch.apply(user, updated_at);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<u64> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok((before - users.len()) as u64)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.users.read().await.len() as u64)
    }

    async fn close(&self) {}
}
