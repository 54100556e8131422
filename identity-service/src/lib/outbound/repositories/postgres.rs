use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::UserId;
use crate::domain::user::models::UserRecord;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserStore;
use crate::user::errors::UserError;

pub struct PostgresUserStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserRecord {
            id: UserId(row.id),
            username: Username::new(row.username)?,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn lookup(&self, username: &Username) -> Result<Option<UserRecord>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn save(&self, record: UserRecord) -> Result<UserRecord, UserError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.id.0)
        .bind(record.username.as_str())
        .bind(&record.password_hash)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("users_username_key")
                {
                    return UserError::UsernameAlreadyExists(record.username.as_str().to_string());
                }
            }
            UserError::DatabaseError(e.to_string())
        })?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(username: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_into_record() {
        let row = row("alice");
        let id = row.id;

        let record = UserRecord::try_from(row).unwrap();

        assert_eq!(record.id, UserId(id));
        assert_eq!(record.username.as_str(), "alice");
    }

    #[test]
    fn test_row_with_invalid_username_rejected() {
        assert!(matches!(
            UserRecord::try_from(row("")),
            Err(UserError::InvalidUsername(_))
        ));
    }
}
