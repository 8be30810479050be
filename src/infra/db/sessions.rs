use async_trait::async_trait;

use crate::application::repos::{RepoError, SessionsRepo};
use crate::domain::entities::SessionRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl SessionsRepo for PostgresRepositories {
    async fn insert_session(&self, record: SessionRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO sessions \
             (session_id, uuid, ip_address, page_url, user_agent, is_mobile, browser, \
              device_type, started_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&record.session_id)
        .bind(record.uuid)
        .bind(&record.ip_address)
        .bind(&record.page_url)
        .bind(&record.device.user_agent)
        .bind(record.device.is_mobile)
        .bind(&record.device.browser)
        .bind(record.device.device_type.as_str())
        .bind(record.started_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
