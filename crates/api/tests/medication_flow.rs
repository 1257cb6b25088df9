//! End-to-end tests for the medication lifecycle: creation seeds the
//! schedule horizon, rule changes regenerate it, and stats aggregate the
//! outcomes.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Timelike, Utc};
use common::{json_request, register_user, request_json, test_app, test_state};
use medtrack_db::models::schedule::STATUS_PENDING;
use medtrack_db::repositories::ScheduleRepo;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn creating_a_medication_seeds_the_horizon(pool: PgPool) {
    let app = test_app(test_state(pool.clone()));
    let token = register_user(&app, "ana@example.com").await;

    let (status, json) = request_json(
        &app,
        json_request(
            "POST",
            "/api/v1/medications",
            Some(&token),
            Some(serde_json::json!({
                "name": "Ibuprofen",
                "dosage": "200mg",
                "frequency_hours": 6.0,
                "start_time": "08:00",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    let medication_id = json["data"]["id"].as_i64().unwrap();
    // Continuous treatment: no progress view.
    assert!(json["data"]["progress"].is_null());
    assert_eq!(json["data"]["treatment_status"], "continuous");

    let entries = ScheduleRepo::list_for_medication(&pool, medication_id, 100)
        .await
        .unwrap();
    // 7-day horizon at 6h spacing: 28 doses, +/-1 depending on time of day.
    assert!(
        (27..=29).contains(&entries.len()),
        "expected ~28 entries, got {}",
        entries.len()
    );
    let horizon_end = Utc::now() + Duration::days(7);
    for entry in &entries {
        assert_eq!(entry.status, STATUS_PENDING);
        assert!(entry.scheduled_time >= Utc::now());
        assert!(entry.scheduled_time <= horizon_end);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_rules_are_rejected(pool: PgPool) {
    let app = test_app(test_state(pool));
    let token = register_user(&app, "ana@example.com").await;

    for (frequency, start_time) in [(6.0, "25:00"), (6.0, "noonish"), (0.1, "08:00"), (9000.0, "08:00")]
    {
        let (status, json) = request_json(
            &app,
            json_request(
                "POST",
                "/api/v1/medications",
                Some(&token),
                Some(serde_json::json!({
                    "name": "Ibuprofen",
                    "frequency_hours": frequency,
                    "start_time": start_time,
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{json}");
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn backfill_records_history_and_continues_the_chain(pool: PgPool) {
    let app = test_app(test_state(pool.clone()));
    let token = register_user(&app, "ana@example.com").await;

    // Whole-second precision so round-tripping through timestamptz compares
    // exactly.
    let last_taken = (Utc::now() - Duration::hours(2)).with_nanosecond(0).unwrap();
    let (status, json) = request_json(
        &app,
        json_request(
            "POST",
            "/api/v1/medications",
            Some(&token),
            Some(serde_json::json!({
                "name": "Amoxicillin",
                "frequency_hours": 8.0,
                "start_time": "08:00",
                "duration_days": 10,
                "doses_already_taken": 3,
                "last_taken_time": last_taken,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    let medication_id = json["data"]["id"].as_i64().unwrap();
    // duration_days stamps started_at, so the treatment reports as active.
    assert_eq!(json["data"]["treatment_status"], "active");

    let entries = ScheduleRepo::list_for_medication(&pool, medication_id, 100)
        .await
        .unwrap();
    let taken: Vec<_> = entries.iter().filter(|e| e.status == "taken").collect();
    let pending: Vec<_> = entries.iter().filter(|e| e.status == "pending").collect();

    assert_eq!(taken.len(), 3);
    assert!(taken.iter().all(|e| e.taken_at == Some(e.scheduled_time)));

    // Forward chain continues from last_taken + 8h.
    let first_pending = pending.iter().map(|e| e.scheduled_time).min().unwrap();
    assert_eq!(first_pending, last_taken + Duration::hours(8));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rule_change_regenerates_future_pending(pool: PgPool) {
    let app = test_app(test_state(pool.clone()));
    let token = register_user(&app, "ana@example.com").await;

    let (_, json) = request_json(
        &app,
        json_request(
            "POST",
            "/api/v1/medications",
            Some(&token),
            Some(serde_json::json!({
                "name": "Ibuprofen",
                "frequency_hours": 6.0,
                "start_time": "08:00",
            })),
        ),
    )
    .await;
    let medication_id = json["data"]["id"].as_i64().unwrap();

    let before = ScheduleRepo::list_for_medication(&pool, medication_id, 100)
        .await
        .unwrap();

    // Widen the frequency; the horizon must shrink accordingly.
    let (status, json) = request_json(
        &app,
        json_request(
            "PUT",
            &format!("/api/v1/medications/{medication_id}"),
            Some(&token),
            Some(serde_json::json!({ "frequency_hours": 24.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["frequency_hours"], 24.0);

    let after = ScheduleRepo::list_for_medication(&pool, medication_id, 100)
        .await
        .unwrap();
    // 7-day horizon at 24h spacing: 7 entries, all regenerated.
    assert!(after.len() < before.len());
    assert!((6..=8).contains(&after.len()), "got {}", after.len());
    for pair in after.windows(2) {
        // Listing is most recent first.
        assert_eq!(pair[0].scheduled_time - pair[1].scheduled_time, Duration::hours(24));
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ownership_is_enforced(pool: PgPool) {
    let app = test_app(test_state(pool));
    let owner = register_user(&app, "ana@example.com").await;
    let intruder = register_user(&app, "mallory@example.com").await;

    let (_, json) = request_json(
        &app,
        json_request(
            "POST",
            "/api/v1/medications",
            Some(&owner),
            Some(serde_json::json!({
                "name": "Ibuprofen",
                "frequency_hours": 6.0,
                "start_time": "08:00",
            })),
        ),
    )
    .await;
    let medication_id = json["data"]["id"].as_i64().unwrap();

    let (status, _) = request_json(
        &app,
        json_request(
            "GET",
            &format!("/api/v1/medications/{medication_id}"),
            Some(&intruder),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request_json(
        &app,
        json_request(
            "DELETE",
            &format!("/api/v1/medications/{medication_id}"),
            Some(&intruder),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stats_report_adherence(pool: PgPool) {
    let app = test_app(test_state(pool.clone()));
    let token = register_user(&app, "ana@example.com").await;

    let (_, json) = request_json(
        &app,
        json_request(
            "POST",
            "/api/v1/medications",
            Some(&token),
            Some(serde_json::json!({
                "name": "Ibuprofen",
                "frequency_hours": 8.0,
                "start_time": "08:00",
                "doses_already_taken": 8,
                "last_taken_time": Utc::now() - Duration::hours(1),
            })),
        ),
    )
    .await;
    let medication_id = json["data"]["id"].as_i64().unwrap();

    // Report two recent doses as missed via the API.
    let extra = [
        Utc::now() - Duration::hours(30),
        Utc::now() - Duration::hours(40),
    ];
    ScheduleRepo::insert_missing(&pool, medication_id, &extra)
        .await
        .unwrap();
    let entries = ScheduleRepo::list_for_medication(&pool, medication_id, 100)
        .await
        .unwrap();
    for entry in entries
        .iter()
        .filter(|e| e.status == "pending" && e.scheduled_time < Utc::now())
    {
        let (status, _) = request_json(
            &app,
            json_request(
                "POST",
                &format!("/api/v1/schedules/{}/missed", entry.id),
                Some(&token),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = request_json(
        &app,
        json_request("GET", "/api/v1/medications/stats?days=30", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["taken"], 8);
    assert_eq!(json["data"]["missed"], 2);
    // 8 / (8 + 2) = 80%
    assert_eq!(json["data"]["adherence_rate"], 80);
    assert_eq!(json["data"]["period"], 30);
}
