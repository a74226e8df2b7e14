//! In-process [`SchoolRepository`].
//!
//! Mirrors the PostgreSQL store closely enough for the handler tests and for
//! running the service without a database. Each operation takes the lock
//! exactly once and never holds it across an `.await`, so the version check
//! and the write in [`SchoolRepository::update`] are a single atomic step.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use schools_core::{calculate_metadata, FilterError, Filters, Metadata, School, SortDirection};

use super::{RepositoryError, SchoolRepository};

#[derive(Debug, Default)]
struct MemoryTable {
    rows: BTreeMap<i64, School>,
    next_id: i64,
}

/// Cloneable handle to a shared in-memory table.
#[derive(Debug, Clone, Copy)]
enum SortKey {
    Id,
    Name,
    Level,
}

#[derive(Debug, Clone, Default)]
pub struct MemorySchoolRepository {
    table: Arc<RwLock<MemoryTable>>,
}

impl MemorySchoolRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchoolRepository for MemorySchoolRepository {
    async fn insert(&self, school: &School) -> Result<School, RepositoryError> {
        let mut table = self.table.write();
        table.next_id += 1;
        let record = School {
            id: table.next_id,
            created_at: Utc::now(),
            version: 1,
            ..school.clone()
        };
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<School, RepositoryError> {
        if id < 1 {
            return Err(RepositoryError::NotFound);
        }
        self.table
            .read()
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, school: &School) -> Result<i32, RepositoryError> {
        let mut table = self.table.write();
        let Some(stored) = table.rows.get_mut(&school.id) else {
            return Err(RepositoryError::EditConflict);
        };
        if stored.version != school.version {
            return Err(RepositoryError::EditConflict);
        }

        let version = stored.version + 1;
        *stored = School {
            id: stored.id,
            created_at: stored.created_at,
            version,
            ..school.clone()
        };
        Ok(version)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        if id < 1 {
            return Err(RepositoryError::NotFound);
        }
        self.table
            .write()
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_all(
        &self,
        name: &str,
        level: &str,
        mode: &[String],
        filters: &Filters,
    ) -> Result<(Vec<School>, Metadata), RepositoryError> {
        let key = match filters.sort_column()? {
            "id" => SortKey::Id,
            "name" => SortKey::Name,
            "level" => SortKey::Level,
            other => return Err(FilterError::UnsafeSort(other.to_string()).into()),
        };

        let mut matched: Vec<School> = self
            .table
            .read()
            .rows
            .values()
            .filter(|s| text_matches(&s.name, name))
            .filter(|s| text_matches(&s.level, level))
            .filter(|s| mode.iter().all(|m| s.mode.contains(m)))
            .cloned()
            .collect();

        let descending = filters.sort_direction() == SortDirection::Desc;
        matched.sort_by(|a, b| {
            let primary = match key {
                SortKey::Id => a.id.cmp(&b.id),
                SortKey::Name => a.name.cmp(&b.name),
                SortKey::Level => a.level.cmp(&b.level),
            };
            let primary = if descending { primary.reverse() } else { primary };
            primary.then(a.id.cmp(&b.id))
        });

        let total_records = matched.len() as i64;
        let page: Vec<School> = matched
            .into_iter()
            .skip(usize::try_from(filters.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(filters.limit()).unwrap_or(0))
            .collect();

        // Same shape as the windowed count: a page past the end sees no rows.
        let metadata = if page.is_empty() {
            Metadata::default()
        } else {
            calculate_metadata(total_records, filters.page, filters.page_size)
        };
        Ok((page, metadata))
    }
}

/// Lower-cased words of `text`, split on anything that is not alphanumeric.
fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Every word of `query` occurs in `column`. An empty query matches all rows;
/// a query with no words at all (only punctuation) matches none.
fn text_matches(column: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let wanted = tokens(query);
    if wanted.is_empty() {
        return false;
    }
    let have = tokens(column);
    wanted.is_subset(&have)
}
