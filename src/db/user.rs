//! User model and repository for filedock.
//!
//! Users come from identity-provider sign-ins: a row is created on the
//! first successful sign-in and its display attributes are refreshed on
//! every subsequent one.

use sqlx::SqlitePool;

use crate::identity::IdentityClaims;
use crate::{FiledockError, Result};

/// A registered user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Email address (unique).
    pub email: String,
    /// Display name.
    pub name: String,
    /// Identity-provider subject (unique).
    pub external_id: String,
    /// Profile image URL (optional).
    pub picture: Option<String>,
    /// Account creation timestamp.
    pub created_at: String,
    /// Last profile refresh timestamp.
    pub updated_at: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Identity-provider subject.
    pub external_id: String,
    /// Profile image URL (optional).
    pub picture: Option<String>,
}

impl NewUser {
    /// Create a new user record with the required fields.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        external_id: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            external_id: external_id.into(),
            picture: None,
        }
    }

    /// Set the profile image URL.
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }
}

const USER_COLUMNS: &str = "id, email, name, external_id, picture, created_at, updated_at";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, name, external_id, picture) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.external_id)
        .bind(&new_user.picture)
        .execute(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a user by email address (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a user by identity-provider subject.
    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = ?"
        ))
        .bind(external_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Insert or refresh a user from verified identity claims.
    ///
    /// First sign-in creates the row; later sign-ins refresh the display
    /// name and picture. The upsert serializes on the external_id UNIQUE
    /// constraint so concurrent sign-ins cannot create duplicates.
    pub async fn upsert_identity(&self, claims: &IdentityClaims) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (email, name, external_id, picture) VALUES (?, ?, ?, ?)
             ON CONFLICT(external_id) DO UPDATE SET
                 name = excluded.name,
                 picture = excluded.picture,
                 updated_at = datetime('now')",
        )
        .bind(&claims.email)
        .bind(&claims.name)
        .bind(&claims.subject)
        .bind(&claims.picture)
        .execute(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        self.get_by_external_id(&claims.subject)
            .await?
            .ok_or_else(|| FiledockError::NotFound("user".to_string()))
    }
}
