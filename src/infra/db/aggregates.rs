//! Grouping queries behind the aggregation engine.
//!
//! All windowed predicates use `occurred_at >= since` so an event
//! stamped exactly at the window edge is included.

use async_trait::async_trait;
use feedpulse_api_types::{ActionType, DeviceClass};
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    ActionCountRow, AggregatesRepo, DeviceCountRow, HourCountRow, PostActionCountRow,
    PostCountRow, RepoError, ScrollSummaryRow,
};

use super::{PostgresRepositories, map_sqlx_error};

// Guarded by `jsonb_typeof`: a stray string or null payload must not
// poison the `::float8` cast for the whole aggregate.
const SCROLL_METRIC_EXPR: &str =
    "CASE WHEN jsonb_typeof(additional_data->'max_scroll_percentage') = 'number' \
     THEN (additional_data->>'max_scroll_percentage')::float8 END";

#[async_trait]
impl AggregatesRepo for PostgresRepositories {
    async fn count_interactions(&self, since: OffsetDateTime) -> Result<u64, RepoError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM interactions WHERE occurred_at >= $1")
                .bind(since)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        convert_count(count)
    }

    async fn count_distinct_visitor_ips(&self, since: OffsetDateTime) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT ip_address) FROM interactions WHERE occurred_at >= $1",
        )
        .bind(since)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        convert_count(count)
    }

    async fn action_breakdown(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<ActionCountRow>, RepoError> {
        let rows = sqlx::query(
            "SELECT action_type, COUNT(*) AS count FROM interactions \
             WHERE occurred_at >= $1 GROUP BY action_type ORDER BY count DESC",
        )
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(ActionCountRow {
                    action_type: ActionType::from(row.try_get::<String, _>("action_type").map_err(map_sqlx_error)?),
                    count: convert_count(row.try_get::<i64, _>("count").map_err(map_sqlx_error)?)?,
                })
            })
            .collect()
    }

    async fn top_posts(
        &self,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<PostCountRow>, RepoError> {
        let rows = sqlx::query(
            "SELECT post_id, post_username, COUNT(*) AS count FROM interactions \
             WHERE occurred_at >= $1 AND post_id IS NOT NULL AND post_username IS NOT NULL \
             GROUP BY post_id, post_username ORDER BY count DESC LIMIT $2",
        )
        .bind(since)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(PostCountRow {
                    post_id: row.try_get("post_id").map_err(map_sqlx_error)?,
                    post_username: row.try_get("post_username").map_err(map_sqlx_error)?,
                    count: convert_count(row.try_get::<i64, _>("count").map_err(map_sqlx_error)?)?,
                })
            })
            .collect()
    }

    async fn device_breakdown(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<DeviceCountRow>, RepoError> {
        let rows = sqlx::query(
            "SELECT device_type, COUNT(*) AS count FROM interactions \
             WHERE occurred_at >= $1 GROUP BY device_type ORDER BY count DESC",
        )
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let device: String = row.try_get("device_type").map_err(map_sqlx_error)?;
                Ok(DeviceCountRow {
                    device_type: parse_device_class(&device)?,
                    count: convert_count(row.try_get::<i64, _>("count").map_err(map_sqlx_error)?)?,
                })
            })
            .collect()
    }

    async fn hourly_activity(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<HourCountRow>, RepoError> {
        let rows = sqlx::query(
            "SELECT CAST(EXTRACT(HOUR FROM occurred_at AT TIME ZONE 'UTC') AS INT4) AS hour, \
             COUNT(*) AS count FROM interactions WHERE occurred_at >= $1 \
             GROUP BY hour ORDER BY hour ASC",
        )
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let hour: i32 = row.try_get("hour").map_err(map_sqlx_error)?;
                Ok(HourCountRow {
                    hour: u8::try_from(hour).map_err(|_| {
                        RepoError::from_persistence(format!("hour `{hour}` outside 0-23"))
                    })?,
                    count: convert_count(row.try_get::<i64, _>("count").map_err(map_sqlx_error)?)?,
                })
            })
            .collect()
    }

    async fn post_action_counts(
        &self,
        post_ids: &[String],
    ) -> Result<Vec<PostActionCountRow>, RepoError> {
        let rows = sqlx::query(
            "SELECT post_id, action_type, COUNT(*) AS count FROM interactions \
             WHERE post_id = ANY($1) GROUP BY post_id, action_type",
        )
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(PostActionCountRow {
                    post_id: row.try_get("post_id").map_err(map_sqlx_error)?,
                    action_type: ActionType::from(
                        row.try_get::<String, _>("action_type").map_err(map_sqlx_error)?,
                    ),
                    count: convert_count(row.try_get::<i64, _>("count").map_err(map_sqlx_error)?)?,
                })
            })
            .collect()
    }

    async fn scroll_summary(&self) -> Result<Option<ScrollSummaryRow>, RepoError> {
        let row = sqlx::query(&format!(
            "SELECT AVG({expr}) AS average, MAX({expr}) AS highest, COUNT(*) AS total, \
             ARRAY_AGG(DISTINCT uuid) AS uuids \
             FROM interactions WHERE action_type = 'final_max_scroll'",
            expr = SCROLL_METRIC_EXPR,
        ))
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let total: i64 = row.try_get("total").map_err(map_sqlx_error)?;
        if total == 0 {
            return Ok(None);
        }

        Ok(Some(ScrollSummaryRow {
            average_max_scroll: row
                .try_get::<Option<f64>, _>("average")
                .map_err(map_sqlx_error)?
                .unwrap_or(0.0),
            highest_max_scroll: row
                .try_get::<Option<f64>, _>("highest")
                .map_err(map_sqlx_error)?
                .unwrap_or(0.0),
            total_events: convert_count(total)?,
            uuids: row
                .try_get::<Option<Vec<Uuid>>, _>("uuids")
                .map_err(map_sqlx_error)?
                .unwrap_or_default(),
        }))
    }
}

fn parse_device_class(value: &str) -> Result<DeviceClass, RepoError> {
    match value {
        "mobile" => Ok(DeviceClass::Mobile),
        "desktop" => Ok(DeviceClass::Desktop),
        other => Err(RepoError::from_persistence(format!(
            "unexpected device_type `{other}`"
        ))),
    }
}

fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}
