use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement,
    TransactionTrait,
};
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;
use crate::repository::UserRepository;

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_one(&self, sql: &str, value: sea_orm::Value) -> UserResult<Option<User>> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [value]);

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(row.map(Into::into))
    }
}

/// Helper struct for deserializing user rows from the database
#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    auth_token: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            auth_token: row.auth_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn db_error(e: DbErr) -> UserError {
    UserError::Internal(format!("Database error: {}", e))
}

fn is_unique_violation(e: &DbErr) -> bool {
    let err_str = e.to_string();
    err_str.contains("duplicate key") || err_str.contains("unique constraint")
}

/// Dependent rows first, the user last
const DELETE_CASCADE: [&str; 5] = [
    "DELETE FROM placements WHERE order_id IN (SELECT id FROM orders WHERE user_id = $1)",
    "DELETE FROM placements WHERE product_id IN (SELECT id FROM products WHERE user_id = $1)",
    "DELETE FROM orders WHERE user_id = $1",
    "DELETE FROM products WHERE user_id = $1",
    "DELETE FROM users WHERE id = $1",
];

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let sql = r#"
            INSERT INTO users (id, email, password_hash, auth_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, password_hash, auth_token, created_at, updated_at
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.id.into(),
                user.email.clone().into(),
                user.password_hash.clone().into(),
                user.auth_token.clone().into(),
                user.created_at.into(),
                user.updated_at.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserError::DuplicateEmail(user.email.clone())
                } else {
                    db_error(e)
                }
            })?
            .ok_or_else(|| UserError::Internal("Failed to create user".to_string()))?;

        tracing::info!(user_id = %row.id, "Created user");
        Ok(row.into())
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        self.find_one(
            "SELECT id, email, password_hash, auth_token, created_at, updated_at FROM users WHERE id = $1",
            id.into(),
        )
        .await
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.find_one(
            "SELECT id, email, password_hash, auth_token, created_at, updated_at FROM users WHERE email = $1",
            email.into(),
        )
        .await
    }

    async fn get_by_token(&self, token: &str) -> UserResult<Option<User>> {
        self.find_one(
            "SELECT id, email, password_hash, auth_token, created_at, updated_at FROM users WHERE auth_token = $1",
            token.into(),
        )
        .await
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let sql = r#"
            UPDATE users
            SET email = $2, password_hash = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, email, password_hash, auth_token, created_at, updated_at
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.id.into(),
                user.email.clone().into(),
                user.password_hash.clone().into(),
                user.updated_at.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserError::DuplicateEmail(user.email.clone())
                } else {
                    db_error(e)
                }
            })?;

        tracing::info!(user_id = %user.id, "Updated user");
        row.map(Into::into).ok_or(UserError::NotFound(user.id))
    }

    async fn token_exists(&self, token: &str) -> UserResult<bool> {
        let sql = "SELECT EXISTS(SELECT 1 FROM users WHERE auth_token = $1) as exists";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [token.into()]);

        #[derive(FromQueryResult)]
        struct ExistsResult {
            exists: bool,
        }

        let result = ExistsResult::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(result.map(|r| r.exists).unwrap_or(false))
    }

    async fn set_token(&self, id: Uuid, token: &str) -> UserResult<()> {
        let sql = "UPDATE users SET auth_token = $2 WHERE id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into(), token.into()]);

        let result = self.db.execute_raw(stmt).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserError::TokenTaken
            } else {
                db_error(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    async fn product_ids(&self, id: Uuid) -> UserResult<Vec<Uuid>> {
        let sql = "SELECT id FROM products WHERE user_id = $1 ORDER BY created_at, id";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        #[derive(FromQueryResult)]
        struct IdRow {
            id: Uuid,
        }

        let rows = IdRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let mut deleted_user = false;
        for sql in DELETE_CASCADE {
            let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);
            let result = txn.execute_raw(stmt).await.map_err(db_error)?;
            deleted_user = result.rows_affected() > 0;
        }

        if !deleted_user {
            txn.rollback().await.map_err(db_error)?;
            return Ok(false);
        }

        txn.commit().await.map_err(db_error)?;

        tracing::info!(user_id = %id, "Deleted user");
        Ok(true)
    }
}
