//! Reconciliation and aggregation through the public API

use chrono::{FixedOffset, NaiveDate, Utc};
use serde_json::json;

use openhouse::db::schemas::{EntryStatus, Lead};
use openhouse::schedule::{
    bucket_by_date, compute_metrics, flatten_tasks, reconcile, CalendarMirror, ShowingDraft,
};

fn jan(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

#[test]
fn authoritative_wins_and_result_is_time_sorted() {
    let authoritative = vec![json!({ "_id": "1", "date": "2024-01-25", "time": "09:00" })];
    let cached = vec![
        json!({ "id": "1", "date": "2024-01-25", "time": "09:00", "status": "cancelled" }),
        json!({ "id": "2", "date": "2024-01-25", "time": "08:00" }),
    ];

    let merged = reconcile(authoritative, cached, &Utc);

    let view: Vec<(&str, &str)> = merged
        .iter()
        .map(|e| (e.id.as_deref().unwrap(), e.time.as_str()))
        .collect();
    assert_eq!(view, vec![("2", "08:00"), ("1", "09:00")]);
    assert_eq!(merged[1].status, EntryStatus::Scheduled);
}

#[test]
fn drafted_showing_survives_until_server_copy_arrives() {
    let mut mirror = CalendarMirror::new();
    let draft: ShowingDraft = serde_json::from_value(json!({
        "date": "2024-01-26",
        "time": "15:00",
        "property": "456 Oak Street",
        "type": "open-house"
    }))
    .unwrap();
    let entry = draft.into_entry(&Utc).unwrap();
    mirror.append(&entry).unwrap();

    // before the server knows about it, the cached draft is shown
    let merged = reconcile(vec![], mirror.items().to_vec(), &Utc);
    assert_eq!(merged, vec![entry.clone()]);

    // once the server holds an item with the same id, that copy wins
    let id = entry.id.clone().unwrap();
    let server = vec![json!({
        "_id": id,
        "date": "2024-01-26",
        "time": "15:30",
        "title": "Open house (confirmed)"
    })];
    let merged = reconcile(server, mirror.into_items(), &Utc);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].time, "15:30");
}

#[test]
fn day_bucket_uses_local_calendar() {
    let plus_eight = FixedOffset::east_opt(8 * 3600).unwrap();
    // 17:00Z on the 25th is 01:00 on the 26th at UTC+8
    let merged = reconcile(
        vec![
            json!({ "_id": "late", "date": "2024-01-25T17:00:00Z" }),
            json!({ "_id": "noon", "date": "2024-01-26", "time": "12:00" }),
        ],
        vec![],
        &plus_eight,
    );

    let on_26th = bucket_by_date(&merged, jan(26));
    let ids: Vec<_> = on_26th.iter().filter_map(|e| e.id.as_deref()).collect();
    assert_eq!(ids, vec!["late", "noon"]);
    assert_eq!(on_26th[0].time, "01:00");
    assert!(bucket_by_date(&merged, jan(25)).is_empty());
}

#[test]
fn dashboard_metrics_from_leads() {
    let leads: Vec<Lead> = serde_json::from_value(json!([
        {
            "name": "Sarah Johnson",
            "tasks": [
                { "id": "1", "title": "Follow up on viewing", "date": "2024-01-25T09:00:00", "status": "pending" },
                { "id": "2", "title": "Discuss financing", "date": "2024-02-01", "status": "pending" },
                { "id": "3", "title": "Send contract", "date": "2024-01-25", "status": "completed" }
            ]
        },
        { "name": "Michael Chen" },
        {
            "name": "Emily Rodriguez",
            "tasks": [
                { "id": "4", "title": "Lease review", "date": "2024-03-01", "status": "pending" },
                { "id": "5", "title": "Old task", "date": "2024-01-20", "status": "pending" }
            ]
        }
    ]))
    .unwrap();

    let tasks = flatten_tasks(&leads);
    let metrics = compute_metrics(&tasks, leads.len(), jan(25), &Utc);

    assert_eq!(metrics.total_tasks, 4);
    assert_eq!(metrics.total_leads, 3);
    assert_eq!(metrics.todays_tasks, 1);
    assert_eq!(metrics.upcoming_tasks, 2);

    let body = serde_json::to_value(metrics).unwrap();
    assert_eq!(
        body,
        json!({ "totalTasks": 4, "totalLeads": 3, "todaysTasks": 1, "upcomingTasks": 2 })
    );
}
