//! Dashboard endpoint
//!
//! `GET /dashboard?date=YYYY-MM-DD` returns the operator metrics together
//! with the tasks and events on the selected day (today when omitted).
//! Metrics always describe today; only the lists follow `date`.

use chrono::{Local, NaiveDate};
use hyper::Response;
use serde::Serialize;
use serde_json::Value;

use super::{query_param, respond, FullBody};
use crate::db::schemas::Task;
use crate::repo::LeadFilter;
use crate::schedule::{
    bucket_by_date, compute_metrics_within, flatten_tasks, reconcile, tasks_on, CalendarEntry,
    DashboardMetrics,
};
use crate::server::AppState;
use crate::types::{CrmError, Result};

#[derive(Serialize, Debug)]
pub struct DashboardResponse {
    pub date: NaiveDate,
    pub metrics: DashboardMetrics,
    pub tasks: Vec<Task>,
    pub events: Vec<CalendarEntry>,
}

pub async fn dashboard(state: &AppState, query: Option<&str>) -> Response<FullBody> {
    respond(build_dashboard(state, query).await)
}

async fn build_dashboard(state: &AppState, query: Option<&str>) -> Result<DashboardResponse> {
    let today = Local::now().date_naive();
    let selected = match query_param(query, "date") {
        Some(raw) if !raw.is_empty() => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| CrmError::Validation(format!("Invalid date: {}", raw)))?,
        _ => today,
    };

    let leads = state
        .timed(state.leads.list_leads(&LeadFilter::default()))
        .await?;
    let events = state.timed(state.events.list_events()).await?;

    let tasks = flatten_tasks(&leads);
    let metrics = compute_metrics_within(
        &tasks,
        leads.len(),
        today,
        &Local,
        state.args.upcoming_window_days,
    );

    let items: Vec<Value> = events
        .iter()
        .filter_map(|event| serde_json::to_value(event).ok())
        .collect();
    let calendar = reconcile(items, Vec::new(), &Local);

    Ok(DashboardResponse {
        date: selected,
        metrics,
        tasks: tasks_on(&tasks, selected, &Local),
        events: bucket_by_date(&calendar, selected),
    })
}
