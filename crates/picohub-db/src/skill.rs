use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, Utc};
use picohub_core::{AppError, NewSkill, ScanStatus, Skill};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

const SKILL_COLUMNS: &str = "id, author_id, name, slug, version, description, category, tags, \
     entry_point, file_path, file_size, sha256, scan_status, downloads, created_at, updated_at";

/// Trait for skill persistence
/// This abstracts the database implementation (SQLite)
#[async_trait::async_trait]
pub trait SkillStore: Send + Sync {
    /// Insert a skill row. A duplicate slug yields `AppError::Conflict`.
    async fn create(&self, skill: NewSkill) -> Result<Skill, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Skill>, AppError>;

    /// Bump the download counter; missing slugs are ignored.
    async fn increment_download(&self, slug: &str) -> Result<(), AppError>;
}

/// Open a SQLite pool and apply pending migrations
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL: {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Repository for managing skills
#[derive(Clone)]
pub struct SqliteSkillStore {
    pool: SqlitePool,
}

impl SqliteSkillStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn map_skill_row(row: &SqliteRow) -> Result<Skill, AppError> {
    let tags: String = row.try_get("tags")?;
    let scan_status: String = row.try_get("scan_status")?;

    Ok(Skill {
        id: row.try_get("id")?,
        author_id: row.try_get("author_id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        version: row.try_get("version")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        tags: serde_json::from_str(&tags)
            .map_err(|e| AppError::Internal(format!("Corrupt tags column: {}", e)))?,
        entry_point: row.try_get("entry_point")?,
        file_path: row.try_get("file_path")?,
        file_size: row.try_get("file_size")?,
        sha256: row.try_get("sha256")?,
        scan_status: ScanStatus::from_str(&scan_status).map_err(AppError::Internal)?,
        downloads: row.try_get("downloads")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait::async_trait]
impl SkillStore for SqliteSkillStore {
    #[tracing::instrument(skip(self, skill), fields(db.table = "skills", db.operation = "insert", slug = %skill.slug))]
    async fn create(&self, skill: NewSkill) -> Result<Skill, AppError> {
        let now = Utc::now();
        let tags = serde_json::to_string(&skill.tags)?;

        let result = sqlx::query(
            r#"
            INSERT INTO skills (
                author_id, name, slug, version, description, category, tags,
                entry_point, file_path, file_size, sha256, scan_status,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(skill.author_id)
        .bind(&skill.name)
        .bind(&skill.slug)
        .bind(&skill.version)
        .bind(&skill.description)
        .bind(&skill.category)
        .bind(&tags)
        .bind(&skill.entry_point)
        .bind(&skill.file_path)
        .bind(skill.file_size)
        .bind(&skill.sha256)
        .bind(skill.scan_status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(
                    "skill with this slug already exists".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Skill {
            id: result.last_insert_rowid(),
            author_id: skill.author_id,
            name: skill.name,
            slug: skill.slug,
            version: skill.version,
            description: skill.description,
            category: skill.category,
            tags: skill.tags,
            entry_point: skill.entry_point,
            file_path: skill.file_path,
            file_size: skill.file_size,
            sha256: skill.sha256,
            scan_status: skill.scan_status,
            downloads: 0,
            created_at: now,
            updated_at: now,
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "skills", db.operation = "select"))]
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Skill>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM skills WHERE slug = ?", SKILL_COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_skill_row).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "skills", db.operation = "update"))]
    async fn increment_download(&self, slug: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE skills SET downloads = downloads + 1 WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
