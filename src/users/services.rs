use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{UserError, UserResult};
use super::repo::UserStore;
use super::repo_types::{
    NewUser, SortField, SortSpec, User, UserFilter, UserPatch, DEFAULT_PASSWORD, DEFAULT_ROLE,
};

/// Parses a path token into a record id.
pub fn parse_id(raw: &str) -> UserResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| UserError::InvalidIdentifier(raw.to_string()))
}

pub async fn list_users(
    store: &dyn UserStore,
    filter: &UserFilter,
    sort: Option<&SortSpec>,
) -> UserResult<Vec<User>> {
    if let Some(SortSpec {
        field: SortField::Unknown(name),
        ..
    }) = sort
    {
        debug!(sort_by = %name, "unknown sort field; keeping natural order");
    }
    store
        .list(filter, sort)
        .await
        .map_err(UserError::store("Failed to fetch users"))
}

pub async fn get_user(store: &dyn UserStore, id: &str) -> UserResult<User> {
    let id = parse_id(id)?;
    store
        .find_by_id(id)
        .await
        .map_err(UserError::store("Failed to fetch user"))?
        .ok_or(UserError::NotFound)
}

pub async fn create_user(store: &dyn UserStore, new: NewUser) -> UserResult<User> {
    const CONTEXT: &str = "Failed to create user";

    if store
        .find_by_email(&new.email)
        .await
        .map_err(UserError::store(CONTEXT))?
        .is_some()
    {
        return Err(UserError::DuplicateEmail);
    }

    let user = User {
        id: Uuid::new_v4(),
        first_name: new.first_name,
        last_name: new.last_name,
        email: new.email,
        age: new.age,
        password: new.password.unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
        role: new.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        created_at: OffsetDateTime::now_utc(),
        updated_at: None,
    };

    // the store's own unique constraint still catches a concurrent insert
    let user = store.insert(user).await.map_err(UserError::store(CONTEXT))?;
    info!(user_id = %user.id, email = %user.email, "user created");
    Ok(user)
}

/// Merges `patch` into the stored record and stamps `updatedAt`.
/// Email uniqueness is left to the store's constraint.
pub async fn update_user(store: &dyn UserStore, id: &str, patch: UserPatch) -> UserResult<User> {
    let id = parse_id(id)?;
    if patch.is_empty() {
        debug!(user_id = %id, "update carries no field changes; stamping updatedAt only");
    }
    let user = store
        .update(id, patch, OffsetDateTime::now_utc())
        .await
        .map_err(UserError::store("Failed to update user"))?
        .ok_or(UserError::NotFound)?;
    info!(user_id = %user.id, "user updated");
    Ok(user)
}

pub async fn delete_user(store: &dyn UserStore, id: &str) -> UserResult<u64> {
    let id = parse_id(id)?;
    let deleted = store
        .delete(id)
        .await
        .map_err(UserError::store("Failed to delete user"))?;
    if deleted == 0 {
        return Err(UserError::NotFound);
    }
    info!(user_id = %id, "user deleted");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::MemoryUserStore;
    use crate::users::test_support::BrokenStore;

    fn new_user(first: &str, last: &str, email: &str, age: i64) -> NewUser {
        NewUser {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            age,
            password: None,
            role: None,
        }
    }

    #[tokio::test]
    async fn create_fills_defaults_and_get_returns_same_record() {
        let store = MemoryUserStore::new();
        let created = create_user(&store, new_user("Ann", "Lee", "a@x.com", 30))
            .await
            .unwrap();

        assert_eq!(created.first_name, "Ann");
        assert_eq!(created.last_name, "Lee");
        assert_eq!(created.email, "a@x.com");
        assert_eq!(created.age, 30);
        assert_eq!(created.role, "user");
        assert_eq!(created.password, "defaultPassword");
        assert!(created.updated_at.is_none());

        let fetched = get_user(&store, &created.id.to_string()).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_keeps_given_password_and_role() {
        let store = MemoryUserStore::new();
        let mut input = new_user("Ann", "Lee", "a@x.com", 30);
        input.password = Some("hunter22".into());
        input.role = Some("moderator".into());
        let created = create_user(&store, input).await.unwrap();
        assert_eq!(created.password, "hunter22");
        assert_eq!(created.role, "moderator");
    }

    #[tokio::test]
    async fn second_create_with_same_email_is_rejected() {
        let store = MemoryUserStore::new();
        create_user(&store, new_user("Ann", "Lee", "a@x.com", 30))
            .await
            .unwrap();
        let err = create_user(&store, new_user("Other", "Name", "a@x.com", 40))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail));

        // comparison is exact, so a different case is a different email
        create_user(&store, new_user("Ann", "Lee", "A@x.com", 30))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let store = MemoryUserStore::new();
        let created = create_user(&store, new_user("Ann", "Lee", "a@x.com", 30))
            .await
            .unwrap();
        let id = created.id.to_string();

        let patch = UserPatch {
            last_name: Some("X".into()),
            ..Default::default()
        };
        let updated = update_user(&store, &id, patch).await.unwrap();

        assert_eq!(updated.last_name, "X");
        assert!(updated.updated_at.is_some());
        assert_eq!(
            User {
                last_name: created.last_name.clone(),
                updated_at: None,
                ..updated.clone()
            },
            created
        );
    }

    #[tokio::test]
    async fn update_with_zero_age_keeps_age() {
        let store = MemoryUserStore::new();
        let created = create_user(&store, new_user("Ann", "Lee", "a@x.com", 30))
            .await
            .unwrap();

        let request: crate::users::dto::UpdateUserRequest =
            serde_json::from_value(serde_json::json!({ "age": 0 })).unwrap();
        let updated = update_user(&store, &created.id.to_string(), request.into_patch().unwrap())
            .await
            .unwrap();
        assert_eq!(updated.age, 30);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn update_always_stamps_updated_at() {
        let store = MemoryUserStore::new();
        let created = create_user(&store, new_user("Ann", "Lee", "a@x.com", 30))
            .await
            .unwrap();
        let first = update_user(&store, &created.id.to_string(), UserPatch::default())
            .await
            .unwrap();
        let second = update_user(&store, &created.id.to_string(), UserPatch::default())
            .await
            .unwrap();
        assert!(first.updated_at.is_some());
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.created_at, created.created_at);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let store = MemoryUserStore::new();
        let missing = Uuid::new_v4().to_string();

        assert!(matches!(get_user(&store, &missing).await, Err(UserError::NotFound)));
        assert!(matches!(
            update_user(&store, &missing, UserPatch::default()).await,
            Err(UserError::NotFound)
        ));
        assert!(matches!(delete_user(&store, &missing).await, Err(UserError::NotFound)));

        assert!(matches!(
            get_user(&store, "not-an-id").await,
            Err(UserError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            delete_user(&store, "123").await,
            Err(UserError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = MemoryUserStore::new();
        let created = create_user(&store, new_user("Ann", "Lee", "a@x.com", 30))
            .await
            .unwrap();
        let id = created.id.to_string();
        assert_eq!(delete_user(&store, &id).await.unwrap(), 1);
        assert!(matches!(get_user(&store, &id).await, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn list_search_and_sort() {
        let store = MemoryUserStore::new();
        for (first, last, email, age) in [
            ("John", "Doe", "john@x.com", 28),
            ("Jane", "Smith", "jane@x.com", 32),
            ("Janet", "Brown", "janet@x.com", 41),
            ("Bob", "Williams", "bob@x.com", 45),
        ] {
            create_user(&store, new_user(first, last, email, age))
                .await
                .unwrap();
        }

        let found = list_users(&store, &UserFilter::search("jan"), None)
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|u| u.first_name.as_str()).collect();
        assert_eq!(names, ["Jane", "Janet"]);

        let spec = SortSpec::from_params(Some("age"), Some("desc"));
        let sorted = list_users(&store, &UserFilter::default(), spec.as_ref())
            .await
            .unwrap();
        assert_eq!(sorted.len(), 4);
        assert!(sorted.windows(2).all(|w| w[0].age >= w[1].age));

        let spec = SortSpec::from_params(Some("nonsense"), None);
        let unsorted = list_users(&store, &UserFilter::default(), spec.as_ref())
            .await
            .unwrap();
        assert_eq!(unsorted.len(), 4);
    }

    #[tokio::test]
    async fn store_failures_surface_as_unavailable() {
        let store = BrokenStore;
        let err = list_users(&store, &UserFilter::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::StoreUnavailable { .. }));
        assert_eq!(err.to_string(), "Failed to fetch users");

        let id = Uuid::new_v4().to_string();
        let err = delete_user(&store, &id).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to delete user");
    }

    #[tokio::test]
    async fn constraint_violation_at_insert_is_duplicate_email() {
        // pre-check passes, the store's constraint fires: a lost race
        let err = create_user(&BrokenStore, new_user("Ann", "Lee", "a@x.com", 30))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail));
    }
}
