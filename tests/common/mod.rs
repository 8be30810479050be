use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use feedpulse::application::analytics::AnalyticsService;
use feedpulse::application::repos::{
    ActionCountRow, AggregatesRepo, DeviceCountRow, HealthRepo, HourCountRow, InteractionsRepo,
    PostActionCountRow, PostCountRow, RepoError, ScrollSummaryRow, SessionsRepo,
};
use feedpulse::application::tracking::TrackingService;
use feedpulse::domain::entities::{InteractionRecord, SessionRecord};
use feedpulse::infra::http::{ApiState, build_router};
use feedpulse_api_types::{ActionType, DeviceClass};

/// In-memory stand-in for the Postgres adapters, grouping with plain
/// iterators instead of SQL.
#[derive(Default)]
pub struct MemoryEventStore {
    pub sessions: Mutex<Vec<SessionRecord>>,
    pub interactions: Mutex<Vec<InteractionRecord>>,
    healthy: AtomicBool,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            interactions: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionsRepo for MemoryEventStore {
    async fn insert_session(&self, record: SessionRecord) -> Result<(), RepoError> {
        self.sessions.lock().await.push(record);
        Ok(())
    }
}

#[async_trait]
impl InteractionsRepo for MemoryEventStore {
    async fn insert_interaction(&self, record: InteractionRecord) -> Result<(), RepoError> {
        self.interactions.lock().await.push(record);
        Ok(())
    }
}

#[async_trait]
impl HealthRepo for MemoryEventStore {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepoError::Persistence("connection refused".to_string()))
        }
    }
}

#[async_trait]
impl AggregatesRepo for MemoryEventStore {
    async fn count_interactions(&self, since: OffsetDateTime) -> Result<u64, RepoError> {
        let interactions = self.interactions.lock().await;
        Ok(interactions
            .iter()
            .filter(|i| i.occurred_at >= since)
            .count() as u64)
    }

    async fn count_distinct_visitor_ips(&self, since: OffsetDateTime) -> Result<u64, RepoError> {
        let interactions = self.interactions.lock().await;
        let ips: HashSet<&str> = interactions
            .iter()
            .filter(|i| i.occurred_at >= since)
            .map(|i| i.ip_address.as_str())
            .collect();
        Ok(ips.len() as u64)
    }

    async fn action_breakdown(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<ActionCountRow>, RepoError> {
        let interactions = self.interactions.lock().await;
        let mut counts: HashMap<ActionType, u64> = HashMap::new();
        for record in interactions.iter().filter(|i| i.occurred_at >= since) {
            *counts.entry(record.action_type.clone()).or_default() += 1;
        }
        let mut rows: Vec<ActionCountRow> = counts
            .into_iter()
            .map(|(action_type, count)| ActionCountRow { action_type, count })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(rows)
    }

    async fn top_posts(
        &self,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<PostCountRow>, RepoError> {
        let interactions = self.interactions.lock().await;
        let mut counts: HashMap<(String, String), u64> = HashMap::new();
        for record in interactions.iter().filter(|i| i.occurred_at >= since) {
            if let (Some(post_id), Some(post_username)) = (&record.post_id, &record.post_username)
            {
                *counts
                    .entry((post_id.clone(), post_username.clone()))
                    .or_default() += 1;
            }
        }
        let mut rows: Vec<PostCountRow> = counts
            .into_iter()
            .map(|((post_id, post_username), count)| PostCountRow {
                post_id,
                post_username,
                count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn device_breakdown(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<DeviceCountRow>, RepoError> {
        let interactions = self.interactions.lock().await;
        let mut mobile = 0u64;
        let mut desktop = 0u64;
        for record in interactions.iter().filter(|i| i.occurred_at >= since) {
            match record.device.device_type {
                DeviceClass::Mobile => mobile += 1,
                DeviceClass::Desktop => desktop += 1,
            }
        }
        let mut rows = Vec::new();
        if mobile > 0 {
            rows.push(DeviceCountRow {
                device_type: DeviceClass::Mobile,
                count: mobile,
            });
        }
        if desktop > 0 {
            rows.push(DeviceCountRow {
                device_type: DeviceClass::Desktop,
                count: desktop,
            });
        }
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(rows)
    }

    async fn hourly_activity(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<HourCountRow>, RepoError> {
        let interactions = self.interactions.lock().await;
        let mut buckets = [0u64; 24];
        for record in interactions.iter().filter(|i| i.occurred_at >= since) {
            buckets[record.occurred_at.hour() as usize] += 1;
        }
        Ok(buckets
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(hour, count)| HourCountRow {
                hour: hour as u8,
                count: *count,
            })
            .collect())
    }

    async fn post_action_counts(
        &self,
        post_ids: &[String],
    ) -> Result<Vec<PostActionCountRow>, RepoError> {
        let interactions = self.interactions.lock().await;
        let wanted: HashSet<&str> = post_ids.iter().map(String::as_str).collect();
        let mut counts: HashMap<(String, ActionType), u64> = HashMap::new();
        for record in &*interactions {
            let Some(post_id) = &record.post_id else {
                continue;
            };
            if !wanted.contains(post_id.as_str()) {
                continue;
            }
            *counts
                .entry((post_id.clone(), record.action_type.clone()))
                .or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|((post_id, action_type), count)| PostActionCountRow {
                post_id,
                action_type,
                count,
            })
            .collect())
    }

    async fn scroll_summary(&self) -> Result<Option<ScrollSummaryRow>, RepoError> {
        let interactions = self.interactions.lock().await;
        let events: Vec<&InteractionRecord> = interactions
            .iter()
            .filter(|i| i.action_type == ActionType::FinalMaxScroll)
            .collect();
        if events.is_empty() {
            return Ok(None);
        }

        // Events with a non-numeric payload still count, but only
        // numeric depths feed the average and the maximum.
        let depths: Vec<f64> = events
            .iter()
            .filter_map(|i| {
                i.additional_data
                    .get("max_scroll_percentage")
                    .and_then(|v| v.as_f64())
            })
            .collect();
        let average = if depths.is_empty() {
            0.0
        } else {
            depths.iter().sum::<f64>() / depths.len() as f64
        };
        let highest = depths.iter().copied().fold(0.0, f64::max);
        let mut seen = HashSet::new();
        let uuids: Vec<Uuid> = events
            .iter()
            .map(|i| i.uuid)
            .filter(|uuid| seen.insert(*uuid))
            .collect();

        Ok(Some(ScrollSummaryRow {
            average_max_scroll: average,
            highest_max_scroll: highest,
            total_events: events.len() as u64,
            uuids,
        }))
    }
}

pub fn build_state(store: Arc<MemoryEventStore>) -> ApiState {
    ApiState {
        tracking: Arc::new(TrackingService::new(store.clone(), store.clone())),
        analytics: Arc::new(AnalyticsService::new(store.clone(), 10)),
        health: store,
    }
}

pub fn build_test_router(store: Arc<MemoryEventStore>) -> axum::Router {
    build_router(build_state(store))
}
