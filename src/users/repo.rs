use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::StoreError;
use super::repo_types::{SortOrder, SortSpec, User, UserFilter, UserPatch};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent collection of user records.
///
/// Every method is a single atomic operation against the backing store.
/// Implementations must keep `email` unique across all records and report a
/// collision as [`StoreError::DuplicateEmail`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Records matching `filter`, ordered by `sort` or by insertion order.
    async fn list(&self, filter: &UserFilter, sort: Option<&SortSpec>) -> StoreResult<Vec<User>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert(&self, user: User) -> StoreResult<User>;
    /// Applies `patch` and stamps `updated_at`; `None` when no record has `id`.
    async fn update(
        &self,
        id: Uuid,
        patch: UserPatch,
        updated_at: OffsetDateTime,
    ) -> StoreResult<Option<User>>;
    /// Number of records removed (0 or 1).
    async fn delete(&self, id: Uuid) -> StoreResult<u64>;
    async fn count(&self) -> StoreResult<u64>;
    /// Releases connections. The store must not be used afterwards.
    async fn close(&self);
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, age, password, role, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self, filter: &UserFilter, sort: Option<&SortSpec>) -> StoreResult<Vec<User>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        qb.push(USER_COLUMNS).push(" FROM users");

        // lower() follows the database's ctype; on a C-locale database only
        // ASCII letters fold, unlike str::to_lowercase in the memory store.
        if let Some(term) = &filter.search {
            qb.push(" WHERE strpos(lower(first_name), lower(")
                .push_bind(term.clone())
                .push(")) > 0 OR strpos(lower(last_name), lower(")
                .push_bind(term.clone())
                .push(")) > 0");
        }

        qb.push(" ORDER BY ");
        if let Some((column, order)) = sort.and_then(|s| s.field.column().map(|c| (c, s.order))) {
            qb.push(column);
            qb.push(match order {
                SortOrder::Asc => " ASC NULLS FIRST, ",
                SortOrder::Desc => " DESC NULLS LAST, ",
            });
        }
        qb.push("seq ASC");

        let rows = qb
            .build_query_as::<User>()
            .fetch_all(&self.db)
            .await
            .context("list users")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn insert(&self, user: User) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, first_name, last_name, email, age, password, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.age)
        .bind(&user.password)
        .bind(&user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: UserPatch,
        updated_at: OffsetDateTime,
    ) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET first_name = COALESCE($2, first_name),
                   last_name  = COALESCE($3, last_name),
                   email      = COALESCE($4, email),
                   age        = COALESCE($5, age),
                   password   = COALESCE($6, password),
                   role       = COALESCE($7, role),
                   updated_at = $8
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.email)
        .bind(patch.age)
        .bind(patch.password)
        .bind(patch.role)
        .bind(updated_at)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> StoreResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await
            .context("count users")?;
        Ok(n as u64)
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
