//! Property suggestion repository
//!
//! The payload is stored as two columns: `request_type` and the JSON
//! `request_body`. Status transitions are compare-and-swap on
//! `(status = 'pending', version)` so that two concurrent decisions on the
//! same suggestion cannot both succeed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use super::{format_timestamp, parse_optional_uuid, parse_timestamp, parse_uuid};
use crate::models::{
    Pagination, PropertySuggestion, RequestType, SuggestionPayload, SuggestionStatus,
};

#[derive(Debug, FromRow)]
struct PropertySuggestionRow {
    id: String,
    property_id: String,
    employee_id: Option<String>,
    request_type: String,
    request_body: String,
    status: String,
    feedback: Option<String>,
    version: i64,
    created_at: String,
    last_updated_at: String,
}

const SELECT_SUGGESTION: &str = r#"
    SELECT id, property_id, employee_id, request_type, request_body, status, feedback,
           version, created_at, last_updated_at
    FROM property_suggestions
"#;

/// Suggestion list filter
#[derive(Debug, Clone, Default)]
pub struct SuggestionFilter {
    pub employee_id: Option<Uuid>,
    pub status: Option<SuggestionStatus>,
}

pub struct PropertySuggestionRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PropertySuggestionRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, suggestion: &PropertySuggestion) -> Result<()> {
        let body = suggestion
            .payload
            .body_json()
            .context("Failed to serialize suggestion payload")?;

        sqlx::query(
            r#"
            INSERT INTO property_suggestions (id, property_id, employee_id, request_type,
                                              request_body, status, feedback, version,
                                              created_at, last_updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(suggestion.id.to_string())
        .bind(suggestion.property_id.to_string())
        .bind(suggestion.employee_id.map(|id| id.to_string()))
        .bind(suggestion.payload.request_type().as_str())
        .bind(body)
        .bind(suggestion.status.as_str())
        .bind(&suggestion.feedback)
        .bind(suggestion.version)
        .bind(format_timestamp(&suggestion.created_at))
        .bind(format_timestamp(&suggestion.last_updated_at))
        .execute(&mut *self.conn)
        .await
        .context("Failed to create property suggestion")?;

        Ok(())
    }

    pub async fn get(&mut self, property_id: Uuid, id: Uuid) -> Result<Option<PropertySuggestion>> {
        let row = sqlx::query_as::<_, PropertySuggestionRow>(&format!(
            "{} WHERE property_id = ? AND id = ?",
            SELECT_SUGGESTION
        ))
        .bind(property_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&mut *self.conn)
        .await
        .context("Failed to get property suggestion")?;

        row.map(row_to_suggestion).transpose()
    }

    pub async fn list(
        &mut self,
        property_id: Uuid,
        filter: &SuggestionFilter,
        pagination: Pagination,
    ) -> Result<(Vec<PropertySuggestion>, u64)> {
        let mut count: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM property_suggestions");
        push_filter(&mut count, property_id, filter);
        let (total,): (i64,) = count
            .build_query_as()
            .fetch_one(&mut *self.conn)
            .await
            .context("Failed to count property suggestions")?;

        let mut select: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_SUGGESTION);
        push_filter(&mut select, property_id, filter);
        select.push(" ORDER BY created_at DESC, id LIMIT ");
        select.push_bind(pagination.limit());
        select.push(" OFFSET ");
        select.push_bind(pagination.offset());

        let rows = select
            .build_query_as::<PropertySuggestionRow>()
            .fetch_all(&mut *self.conn)
            .await
            .context("Failed to list property suggestions")?;

        let suggestions = rows
            .into_iter()
            .map(row_to_suggestion)
            .collect::<Result<Vec<_>>>()?;
        Ok((suggestions, total.max(0) as u64))
    }

    /// Persist a status decision taken on a suggestion loaded at `expected_version`.
    ///
    /// Returns `false` when the row is no longer pending at that version.
    pub async fn transition(
        &mut self,
        suggestion: &PropertySuggestion,
        expected_version: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE property_suggestions
            SET status = ?, feedback = ?, version = version + 1, last_updated_at = ?
            WHERE id = ? AND status = 'pending' AND version = ?
            "#,
        )
        .bind(suggestion.status.as_str())
        .bind(&suggestion.feedback)
        .bind(format_timestamp(&suggestion.last_updated_at))
        .bind(suggestion.id.to_string())
        .bind(expected_version)
        .execute(&mut *self.conn)
        .await
        .context("Failed to update suggestion status")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&mut self, property_id: Uuid, id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM property_suggestions WHERE property_id = ? AND id = ?")
                .bind(property_id.to_string())
                .bind(id.to_string())
                .execute(&mut *self.conn)
                .await
                .context("Failed to delete property suggestion")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete approved and declined suggestions created before `cutoff`.
    /// Pending suggestions are never touched.
    pub async fn delete_closed_before(&mut self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM property_suggestions
            WHERE status IN ('approved', 'declined') AND created_at < ?
            "#,
        )
        .bind(format_timestamp(&cutoff))
        .execute(&mut *self.conn)
        .await
        .context("Failed to delete closed suggestions")?;

        Ok(result.rows_affected())
    }
}

fn push_filter(
    builder: &mut QueryBuilder<'_, Sqlite>,
    property_id: Uuid,
    filter: &SuggestionFilter,
) {
    builder.push(" WHERE property_id = ");
    builder.push_bind(property_id.to_string());

    if let Some(employee_id) = filter.employee_id {
        builder.push(" AND employee_id = ");
        builder.push_bind(employee_id.to_string());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
}

fn row_to_suggestion(row: PropertySuggestionRow) -> Result<PropertySuggestion> {
    let request_type = RequestType::parse(&row.request_type)
        .with_context(|| format!("Unknown suggestion request type: {}", row.request_type))?;
    let payload = SuggestionPayload::from_parts(request_type, &row.request_body)
        .with_context(|| format!("Corrupt payload for suggestion {}", row.id))?;
    let status = SuggestionStatus::parse(&row.status)
        .with_context(|| format!("Unknown suggestion status: {}", row.status))?;

    Ok(PropertySuggestion {
        id: parse_uuid(&row.id),
        property_id: parse_uuid(&row.property_id),
        employee_id: parse_optional_uuid(row.employee_id.as_deref()),
        payload,
        status,
        feedback: row.feedback,
        version: row.version,
        created_at: parse_timestamp(&row.created_at),
        last_updated_at: parse_timestamp(&row.last_updated_at),
    })
}
