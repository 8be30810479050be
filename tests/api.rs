mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use common::{MemoryEventStore, build_test_router};
use feedpulse_api_types::ActionType;

const CLIENT_IP: &str = "203.0.113.7";
const MOBILE_UA: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", CLIENT_IP)
        .header(header::USER_AGENT, MOBILE_UA)
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
        .body(Body::empty())
        .expect("request")
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn session_creation_mints_ip_and_millis_key() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    let response = router
        .oneshot(post_json(
            "/track/session",
            json!({
                "page_url": "https://feed.example/",
                "uuid": Uuid::new_v4(),
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));

    let session_id = body["session_id"].as_str().expect("session_id");
    let suffix = session_id
        .strip_prefix(&format!("{CLIENT_IP}_"))
        .expect("ip-prefixed session id");
    suffix.parse::<i64>().expect("millisecond suffix");

    let sessions = store.sessions.lock().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, session_id);
    assert_eq!(sessions[0].ip_address, CLIENT_IP);
    assert!(sessions[0].device.is_mobile);
}

#[tokio::test]
async fn interaction_is_acknowledged_and_counted() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    let response = router
        .clone()
        .oneshot(post_json(
            "/track/interaction",
            json!({
                "action_type": "like",
                "post_id": "ines_golden_hour",
                "post_username": "ines",
                "uuid": Uuid::new_v4(),
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Interaction tracked successfully"));

    let response = router
        .oneshot(get("/posts/stats?ids=ines_golden_hour"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(
        body["data"],
        json!([{
            "post_id": "ines_golden_hour",
            "views": 0,
            "likes": 1,
            "saves": 0,
            "shares": 0,
            "comments": 0,
        }])
    );
}

#[tokio::test]
async fn interaction_with_unpaired_post_fields_is_rejected() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    let response = router
        .oneshot(post_json(
            "/track/interaction",
            json!({
                "action_type": "like",
                "post_id": "orphaned",
                "uuid": Uuid::new_v4(),
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(store.interactions.lock().await.is_empty());
}

#[tokio::test]
async fn post_view_normalizes_negative_scroll_position() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    let response = router
        .oneshot(post_json(
            "/track/post-view",
            json!({
                "post_id": "sam_hi",
                "post_username": "sam",
                "view_duration": 3.5,
                "scroll_percentage": -42,
                "media_type": "video",
                "uuid": Uuid::new_v4(),
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], json!("Post view tracked successfully"));

    let interactions = store.interactions.lock().await;
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].action_type, ActionType::PostView);
    let view = interactions[0].view.as_ref().expect("view metrics");
    assert_eq!(view.scroll_percentage, 42);
}

#[tokio::test]
async fn post_view_survives_extreme_scroll_position() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    let response = router
        .oneshot(post_json(
            "/track/post-view",
            json!({
                "post_id": "sam_hi",
                "post_username": "sam",
                "view_duration": 1.0,
                "scroll_percentage": i64::MIN,
                "media_type": "image",
                "uuid": Uuid::new_v4(),
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let interactions = store.interactions.lock().await;
    let view = interactions[0].view.as_ref().expect("view metrics");
    assert_eq!(view.scroll_percentage, i64::MAX);
}

#[tokio::test]
async fn post_view_rejects_negative_duration() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store);

    let response = router
        .oneshot(post_json(
            "/track/post-view",
            json!({
                "post_id": "sam_hi",
                "post_username": "sam",
                "view_duration": -1.0,
                "scroll_percentage": 10,
                "media_type": "image",
                "uuid": Uuid::new_v4(),
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_stats_zero_fill_preserves_input_order() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    router
        .clone()
        .oneshot(post_json(
            "/track/interaction",
            json!({
                "action_type": "save",
                "post_id": "b_post",
                "post_username": "b",
                "uuid": Uuid::new_v4(),
            }),
        ))
        .await
        .expect("response");

    let response = router
        .oneshot(get("/posts/stats?ids=never_seen,%20b_post%20,a_post"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    let data = body["data"].as_array().expect("stats array");
    let ids: Vec<&str> = data
        .iter()
        .map(|entry| entry["post_id"].as_str().expect("post_id"))
        .collect();
    assert_eq!(ids, vec!["never_seen", "b_post", "a_post"]);
    assert_eq!(data[0]["saves"], json!(0));
    assert_eq!(data[1]["saves"], json!(1));
    assert_eq!(data[2]["saves"], json!(0));
}

#[tokio::test]
async fn post_stats_without_ids_is_a_bad_request() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store);

    for uri in ["/posts/stats", "/posts/stats?ids=", "/posts/stats?ids=%2C%20%2C"] {
        let response = router
            .clone()
            .oneshot(get(uri))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
        let body = read_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Missing or invalid post IDs"));
    }
}

#[tokio::test]
async fn dashboard_zero_fills_all_hours_and_counts_distinct_visitors() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    for _ in 0..2 {
        router
            .clone()
            .oneshot(post_json(
                "/track/interaction",
                json!({
                    "action_type": "like",
                    "uuid": Uuid::new_v4(),
                }),
            ))
            .await
            .expect("response");
    }

    let response = router
        .oneshot(get("/analytics/dashboard?timeframe=7d"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));

    let data = &body["data"];
    assert_eq!(data["total_interactions"], json!(2));
    // Both events came from the same forwarded IP.
    assert_eq!(data["unique_users"], json!(1));
    assert_eq!(data["timeframe"], json!("7d"));

    let hours = data["hourly_activity"].as_array().expect("hours");
    assert_eq!(hours.len(), 24);
    let total_hour_events: u64 = hours
        .iter()
        .map(|h| h["count"].as_u64().expect("count"))
        .sum();
    assert_eq!(total_hour_events, 2);
    for (index, entry) in hours.iter().enumerate() {
        assert_eq!(entry["hour"], json!(index));
    }

    assert_eq!(
        data["interaction_breakdown"],
        json!([{"action_type": "like", "count": 2}])
    );
    assert_eq!(
        data["device_breakdown"],
        json!([{"device_type": "mobile", "count": 2}])
    );
}

#[tokio::test]
async fn dashboard_rejects_unknown_timeframe() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store);

    let response = router
        .oneshot(get("/analytics/dashboard?timeframe=90d"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn scroll_stats_deduplicate_visitors_but_not_events() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    let visitor = Uuid::new_v4();
    for depth in [40.0, 80.0] {
        router
            .clone()
            .oneshot(post_json(
                "/track/interaction",
                json!({
                    "action_type": "final_max_scroll",
                    "additional_data": {"max_scroll_percentage": depth},
                    "uuid": visitor,
                }),
            ))
            .await
            .expect("response");
    }

    let response = router
        .oneshot(get("/session/scroll-stats"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    let data = &body["data"];
    assert_eq!(data["total_sessions"], json!(2));
    assert_eq!(data["average_max_scroll"], json!(60.0));
    assert_eq!(data["highest_max_scroll"], json!(80.0));
    assert_eq!(data["uuids"].as_array().expect("uuids").len(), 1);
}

#[tokio::test]
async fn scroll_stats_skip_non_numeric_depths_in_the_averages() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    for depth in [json!(80.0), json!("85")] {
        router
            .clone()
            .oneshot(post_json(
                "/track/interaction",
                json!({
                    "action_type": "final_max_scroll",
                    "additional_data": {"max_scroll_percentage": depth},
                    "uuid": Uuid::new_v4(),
                }),
            ))
            .await
            .expect("response");
    }

    let response = router
        .oneshot(get("/session/scroll-stats"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    // The malformed event still counts, but only the numeric depth
    // feeds average and highest.
    let data = &body["data"];
    assert_eq!(data["total_sessions"], json!(2));
    assert_eq!(data["average_max_scroll"], json!(80.0));
    assert_eq!(data["highest_max_scroll"], json!(80.0));
}

#[tokio::test]
async fn scroll_stats_default_to_zero_without_events() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store);

    let response = router
        .oneshot(get("/session/scroll-stats"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    assert_eq!(
        body["data"],
        json!({
            "average_max_scroll": 0.0,
            "highest_max_scroll": 0.0,
            "total_sessions": 0,
            "uuids": [],
        })
    );
}

#[tokio::test]
async fn window_lower_bound_is_inclusive() {
    use feedpulse::application::repos::AggregatesRepo;
    use feedpulse::domain::device::DeviceInfo;
    use feedpulse::domain::entities::InteractionRecord;
    use serde_json::Map;
    use time::{Duration, OffsetDateTime};

    let store = MemoryEventStore::new();
    let since = OffsetDateTime::now_utc() - Duration::hours(24);
    let record = |occurred_at| InteractionRecord {
        uuid: Uuid::new_v4(),
        ip_address: CLIENT_IP.to_string(),
        action_type: ActionType::Like,
        post_id: None,
        post_username: None,
        session_id: None,
        occurred_at,
        additional_data: Map::new(),
        view: None,
        device: DeviceInfo::from_user_agent(MOBILE_UA),
    };
    {
        let mut interactions = store.interactions.lock().await;
        // Exactly on the window edge, and a hair before it.
        interactions.push(record(since));
        interactions.push(record(since - Duration::nanoseconds(1)));
    }

    assert_eq!(store.count_interactions(since).await.expect("count"), 1);
    assert_eq!(
        store
            .count_distinct_visitor_ips(since)
            .await
            .expect("count"),
        1
    );
}

#[tokio::test]
async fn health_stays_200_when_storage_is_down() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    let response = router
        .clone()
        .oneshot(get("/health"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["database_connected"], json!(true));

    store.set_healthy(false);
    let response = router.oneshot(get("/health")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["database_connected"], json!(false));
}

#[tokio::test]
async fn nested_additional_data_is_rejected() {
    let store = Arc::new(MemoryEventStore::new());
    let router = build_test_router(store.clone());

    let response = router
        .oneshot(post_json(
            "/track/interaction",
            json!({
                "action_type": "comment",
                "additional_data": {"thread": {"depth": 3}},
                "uuid": Uuid::new_v4(),
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.interactions.lock().await.is_empty());
}
