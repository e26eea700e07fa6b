use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::info;

use crate::links::ProjectLink;

/// Represents a bot user in the database
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A project ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub avatar_url: Option<String>,
    pub links: Vec<ProjectLink>,
}

/// A project row as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedProject {
    pub project_id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub avatar_url: Option<String>,
    pub links: Vec<ProjectLink>,
    pub created_at: DateTime<Utc>,
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            telegram_id BIGINT UNIQUE NOT NULL,
            display_name TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS projects (
            project_id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id),
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            avatar_url TEXT,
            links JSONB NOT NULL DEFAULT '[]'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create projects table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS projects_user_id_idx ON projects(user_id)")
        .execute(pool)
        .await
        .context("Failed to create projects user index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        telegram_id: row.try_get("telegram_id")?,
        display_name: row.try_get("display_name")?,
        created_at: row.try_get("created_at")?,
    })
}

fn project_from_row(row: &PgRow) -> Result<PersistedProject> {
    let links: Json<Vec<ProjectLink>> = row.try_get("links")?;
    Ok(PersistedProject {
        project_id: row.try_get("project_id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        slug: row.try_get("slug")?,
        avatar_url: row.try_get("avatar_url")?,
        links: links.0,
        created_at: row.try_get("created_at")?,
    })
}

/// Get a user by Telegram id, creating it on first contact
pub async fn get_or_create_user(
    pool: &PgPool,
    telegram_id: i64,
    display_name: Option<&str>,
) -> Result<User> {
    if let Some(user) = get_user_by_telegram_id(pool, telegram_id).await? {
        return Ok(user);
    }

    info!(telegram_id, "Creating new user");

    // Concurrent first contacts resolve to the same row
    let row = sqlx::query(
        "INSERT INTO users (telegram_id, display_name) VALUES ($1, $2)
         ON CONFLICT (telegram_id) DO UPDATE SET telegram_id = EXCLUDED.telegram_id
         RETURNING id, telegram_id, display_name, created_at",
    )
    .bind(telegram_id)
    .bind(display_name)
    .fetch_one(pool)
    .await
    .context("Failed to insert user")?;

    user_from_row(&row)
}

/// Read a user by Telegram id
pub async fn get_user_by_telegram_id(pool: &PgPool, telegram_id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, telegram_id, display_name, created_at FROM users WHERE telegram_id = $1",
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read user")?;

    row.as_ref().map(user_from_row).transpose()
}

/// Insert a project and return the stored row
pub async fn create_project(pool: &PgPool, project: &NewProject) -> Result<Option<PersistedProject>> {
    info!(user_id = project.user_id, slug = %project.slug, "Creating new project");

    let row = sqlx::query(
        "INSERT INTO projects (user_id, title, description, slug, avatar_url, links)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING project_id, user_id, title, description, slug, avatar_url, links, created_at",
    )
    .bind(project.user_id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.slug)
    .bind(&project.avatar_url)
    .bind(Json(&project.links))
    .fetch_optional(pool)
    .await
    .context("Failed to insert project")?;

    let project = row.as_ref().map(project_from_row).transpose()?;
    if let Some(ref project) = project {
        info!(project_id = project.project_id, "Project created");
    }
    Ok(project)
}

/// Read a project by id
pub async fn read_project(pool: &PgPool, project_id: i64) -> Result<Option<PersistedProject>> {
    let row = sqlx::query(
        "SELECT project_id, user_id, title, description, slug, avatar_url, links, created_at
         FROM projects WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read project")?;

    row.as_ref().map(project_from_row).transpose()
}

/// Read a project by slug
pub async fn read_project_by_slug(pool: &PgPool, slug: &str) -> Result<Option<PersistedProject>> {
    let row = sqlx::query(
        "SELECT project_id, user_id, title, description, slug, avatar_url, links, created_at
         FROM projects WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to read project by slug")?;

    row.as_ref().map(project_from_row).transpose()
}

/// List a user's projects, newest first
pub async fn list_projects_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<PersistedProject>> {
    let rows = sqlx::query(
        "SELECT project_id, user_id, title, description, slug, avatar_url, links, created_at
         FROM projects WHERE user_id = $1 ORDER BY created_at DESC, project_id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list projects")?;

    rows.iter().map(project_from_row).collect()
}

/// Persistence operations the new-project flow depends on
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Resolve the initiating user, creating the account on first contact
    async fn ensure_user(&self, telegram_id: i64, display_name: Option<&str>) -> Result<User>;

    /// Insert a project; `None` means the insert returned no row
    async fn insert_project(&self, project: &NewProject) -> Result<Option<PersistedProject>>;
}

/// Postgres-backed project store
#[derive(Debug, Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn ensure_user(&self, telegram_id: i64, display_name: Option<&str>) -> Result<User> {
        get_or_create_user(&self.pool, telegram_id, display_name).await
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Option<PersistedProject>> {
        create_project(&self.pool, project).await
    }
}
