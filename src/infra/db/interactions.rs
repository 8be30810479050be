use async_trait::async_trait;
use serde_json::Value;

use crate::application::repos::{InteractionsRepo, RepoError};
use crate::domain::entities::InteractionRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl InteractionsRepo for PostgresRepositories {
    async fn insert_interaction(&self, record: InteractionRecord) -> Result<(), RepoError> {
        let additional_data = Value::Object(record.additional_data);
        let (view_duration, scroll_percentage, media_type) = match &record.view {
            Some(view) => (
                Some(view.view_duration),
                Some(view.scroll_percentage),
                Some(view.media_type.as_str()),
            ),
            None => (None, None, None),
        };

        sqlx::query(
            "INSERT INTO interactions \
             (uuid, ip_address, action_type, post_id, post_username, session_id, occurred_at, \
              additional_data, view_duration, scroll_percentage, media_type, user_agent, \
              is_mobile, browser, device_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(record.uuid)
        .bind(&record.ip_address)
        .bind(record.action_type.as_str())
        .bind(&record.post_id)
        .bind(&record.post_username)
        .bind(&record.session_id)
        .bind(record.occurred_at)
        .bind(additional_data)
        .bind(view_duration)
        .bind(scroll_percentage)
        .bind(media_type)
        .bind(&record.device.user_agent)
        .bind(record.device.is_mobile)
        .bind(&record.device.browser)
        .bind(record.device.device_type.as_str())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
