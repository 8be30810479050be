//! Aggregation engine: turns raw event streams into dashboard metrics.
//!
//! Every request recomputes from scratch; at demo-scale event volume
//! that is cheaper than keeping materialized views coherent.

use std::sync::Arc;
use std::time::Instant;

use feedpulse_api_types::{
    ActionCount, ActionType, DashboardData, DeviceCount, HourCount, PostActivity, PostStats,
    ScrollStats, Timeframe,
};
use metrics::histogram;
use time::OffsetDateTime;

use crate::application::repos::{AggregatesRepo, HourCountRow, RepoError};

pub struct AnalyticsService {
    aggregates: Arc<dyn AggregatesRepo>,
    top_posts_limit: u32,
}

impl AnalyticsService {
    pub fn new(aggregates: Arc<dyn AggregatesRepo>, top_posts_limit: u32) -> Self {
        Self {
            aggregates,
            top_posts_limit,
        }
    }

    /// Compute the full dashboard for one time window. The six
    /// grouping queries are independent, so they are dispatched
    /// concurrently and joined, never serialized.
    pub async fn dashboard(&self, timeframe: Timeframe) -> Result<DashboardData, RepoError> {
        let since = OffsetDateTime::now_utc() - timeframe.window();
        let started = Instant::now();

        let (total_interactions, unique_users, breakdown, popular, devices, hours) = tokio::try_join!(
            self.aggregates.count_interactions(since),
            self.aggregates.count_distinct_visitor_ips(since),
            self.aggregates.action_breakdown(since),
            self.aggregates.top_posts(since, self.top_posts_limit),
            self.aggregates.device_breakdown(since),
            self.aggregates.hourly_activity(since),
        )?;

        histogram!("feedpulse_dashboard_query_ms").record(started.elapsed().as_millis() as f64);

        Ok(DashboardData {
            total_interactions,
            unique_users,
            interaction_breakdown: breakdown
                .into_iter()
                .map(|row| ActionCount {
                    action_type: row.action_type,
                    count: row.count,
                })
                .collect(),
            popular_posts: popular
                .into_iter()
                .map(|row| PostActivity {
                    post_id: row.post_id,
                    post_username: row.post_username,
                    count: row.count,
                })
                .collect(),
            device_breakdown: devices
                .into_iter()
                .map(|row| DeviceCount {
                    device_type: row.device_type,
                    count: row.count,
                })
                .collect(),
            hourly_activity: fill_hours(hours),
            timeframe,
        })
    }

    /// Per-post action counts for a set of post ids, zero-filled and
    /// returned in input order.
    pub async fn post_stats(&self, post_ids: &[String]) -> Result<Vec<PostStats>, RepoError> {
        let rows = self.aggregates.post_action_counts(post_ids).await?;

        let mut stats: Vec<PostStats> = post_ids
            .iter()
            .map(|id| PostStats::empty(id.clone()))
            .collect();

        for row in rows {
            let Some(entry) = stats.iter_mut().find(|s| s.post_id == row.post_id) else {
                continue;
            };
            match row.action_type {
                ActionType::PostView => entry.views = row.count,
                ActionType::Like => entry.likes = row.count,
                ActionType::Save => entry.saves = row.count,
                ActionType::Share => entry.shares = row.count,
                ActionType::Comment => entry.comments = row.count,
                _ => {}
            }
        }

        Ok(stats)
    }

    /// Scroll-depth summary across every recorded `final_max_scroll`
    /// event. Duplicate teardown emissions collapse in the distinct
    /// visitor set but still count toward the event total.
    pub async fn scroll_stats(&self) -> Result<ScrollStats, RepoError> {
        let summary = self.aggregates.scroll_summary().await?;

        Ok(match summary {
            Some(row) => ScrollStats {
                average_max_scroll: row.average_max_scroll,
                highest_max_scroll: row.highest_max_scroll,
                total_sessions: row.total_events,
                uuids: row.uuids,
            },
            None => ScrollStats {
                average_max_scroll: 0.0,
                highest_max_scroll: 0.0,
                total_sessions: 0,
                uuids: Vec::new(),
            },
        })
    }
}

/// Expand sparse hour counts into all 24 hours, sorted ascending.
fn fill_hours(rows: Vec<HourCountRow>) -> Vec<HourCount> {
    let mut hours: Vec<HourCount> = (0..24).map(|hour| HourCount { hour, count: 0 }).collect();
    for row in rows {
        if let Some(slot) = hours.get_mut(row.hour as usize) {
            slot.count = row.count;
        }
    }
    hours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_hours_synthesizes_missing_hours() {
        let rows = vec![
            HourCountRow { hour: 23, count: 4 },
            HourCountRow { hour: 2, count: 7 },
        ];
        let filled = fill_hours(rows);
        assert_eq!(filled.len(), 24);
        assert_eq!(filled[2], HourCount { hour: 2, count: 7 });
        assert_eq!(filled[23], HourCount { hour: 23, count: 4 });
        assert_eq!(filled[0], HourCount { hour: 0, count: 0 });
        assert!(filled.windows(2).all(|w| w[0].hour < w[1].hour));
    }

    #[test]
    fn fill_hours_ignores_out_of_range_rows() {
        let filled = fill_hours(vec![HourCountRow { hour: 24, count: 9 }]);
        assert!(filled.iter().all(|h| h.count == 0));
    }
}
