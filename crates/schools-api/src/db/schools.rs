//! School persistence on PostgreSQL.
//!
//! All statements operate on the `schools` table. Server-assigned columns
//! (`id`, `created_at`, `version`) come back through `RETURNING` so a write
//! never needs a follow-up read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schools_core::{calculate_metadata, Filters, Metadata, School};
use sqlx::PgPool;

use super::{bounded, RepositoryError, SchoolRepository};

const SCHOOL_COLUMNS: &str =
    "id, created_at, name, level, contact, phone, email, website, address, mode, version";

/// [`SchoolRepository`] backed by a shared [`PgPool`].
#[derive(Debug, Clone)]
pub struct PgSchoolRepository {
    pool: PgPool,
}

impl PgSchoolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchoolRepository for PgSchoolRepository {
    async fn insert(&self, school: &School) -> Result<School, RepositoryError> {
        let (id, created_at, version): (i64, DateTime<Utc>, i32) = bounded(
            sqlx::query_as(
                "INSERT INTO schools (name, level, contact, phone, email, website, address, mode)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING id, created_at, version",
            )
            .bind(&school.name)
            .bind(&school.level)
            .bind(&school.contact)
            .bind(&school.phone)
            .bind(&school.email)
            .bind(&school.website)
            .bind(&school.address)
            .bind(&school.mode)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(School {
            id,
            created_at,
            version,
            ..school.clone()
        })
    }

    async fn get(&self, id: i64) -> Result<School, RepositoryError> {
        if id < 1 {
            return Err(RepositoryError::NotFound);
        }

        let query = format!("SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1");
        let row = bounded(
            sqlx::query_as::<_, SchoolRow>(&query)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.map(SchoolRow::into_record)
            .ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, school: &School) -> Result<i32, RepositoryError> {
        let version: Option<i32> = bounded(
            sqlx::query_scalar(
                "UPDATE schools
                 SET name = $1, level = $2, contact = $3, phone = $4, email = $5,
                     website = $6, address = $7, mode = $8, version = version + 1
                 WHERE id = $9 AND version = $10
                 RETURNING version",
            )
            .bind(&school.name)
            .bind(&school.level)
            .bind(&school.contact)
            .bind(&school.phone)
            .bind(&school.email)
            .bind(&school.website)
            .bind(&school.address)
            .bind(&school.mode)
            .bind(school.id)
            .bind(school.version)
            .fetch_optional(&self.pool),
        )
        .await?;

        // Zero rows: either the id is gone or another writer got there first.
        version.ok_or(RepositoryError::EditConflict)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        if id < 1 {
            return Err(RepositoryError::NotFound);
        }

        let result = bounded(
            sqlx::query("DELETE FROM schools WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_all(
        &self,
        name: &str,
        level: &str,
        mode: &[String],
        filters: &Filters,
    ) -> Result<(Vec<School>, Metadata), RepositoryError> {
        let column = filters.sort_column()?;
        let direction = filters.sort_direction();

        // The sort column is interpolated only after the allow-list check above.
        let query = format!(
            "SELECT COUNT(*) OVER() AS total_records, {SCHOOL_COLUMNS}
             FROM schools
             WHERE (to_tsvector('simple', name) @@ plainto_tsquery('simple', $1) OR $1 = '')
               AND (to_tsvector('simple', level) @@ plainto_tsquery('simple', $2) OR $2 = '')
               AND (mode @> $3 OR $3 = '{{}}')
             ORDER BY {column} {direction}, id ASC
             LIMIT $4 OFFSET $5"
        );

        let rows = bounded(
            sqlx::query_as::<_, CountedSchoolRow>(&query)
                .bind(name)
                .bind(level)
                .bind(mode)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool),
        )
        .await?;

        let total_records = rows.first().map_or(0, |row| row.total_records);
        let schools = rows
            .into_iter()
            .map(|row| row.school.into_record())
            .collect();

        Ok((
            schools,
            calculate_metadata(total_records, filters.page, filters.page_size),
        ))
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct SchoolRow {
    id: i64,
    created_at: DateTime<Utc>,
    name: String,
    level: String,
    contact: String,
    phone: String,
    email: String,
    website: String,
    address: String,
    mode: Vec<String>,
    version: i32,
}

impl SchoolRow {
    fn into_record(self) -> School {
        School {
            id: self.id,
            created_at: self.created_at,
            name: self.name,
            level: self.level,
            contact: self.contact,
            phone: self.phone,
            email: self.email,
            website: self.website,
            address: self.address,
            mode: self.mode,
            version: self.version,
        }
    }
}

/// A listing row carrying the windowed total alongside the record.
#[derive(sqlx::FromRow)]
struct CountedSchoolRow {
    total_records: i64,
    #[sqlx(flatten)]
    school: SchoolRow,
}
