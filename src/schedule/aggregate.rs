//! Dashboard metrics and date buckets

use chrono::{Days, NaiveDate, NaiveDateTime, TimeZone};
use serde::Serialize;

use super::calendar::{parse_local_datetime, CalendarEntry};
use crate::db::schemas::{Lead, Task};

/// Default length of the upcoming-tasks window
pub const DEFAULT_UPCOMING_DAYS: u64 = 7;

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    /// Pending tasks across all leads
    pub total_tasks: usize,
    pub total_leads: usize,
    /// Pending tasks on today's local date
    pub todays_tasks: usize,
    /// Pending tasks from today's midnight through midnight N days later
    pub upcoming_tasks: usize,
}

/// Every lead's tasks, in lead order
pub fn flatten_tasks(leads: &[Lead]) -> Vec<Task> {
    leads.iter().flat_map(|l| l.tasks().iter().cloned()).collect()
}

/// Metrics with the default seven-day upcoming window
pub fn compute_metrics<Tz: TimeZone>(
    tasks: &[Task],
    total_leads: usize,
    today: NaiveDate,
    tz: &Tz,
) -> DashboardMetrics {
    compute_metrics_within(tasks, total_leads, today, tz, DEFAULT_UPCOMING_DAYS)
}

/// Metrics with an explicit upcoming window of `window_days`.
///
/// Both window bounds are inclusive, so a task at exactly midnight of the
/// last day still counts. Tasks whose date cannot be parsed count toward
/// `total_tasks` only.
pub fn compute_metrics_within<Tz: TimeZone>(
    tasks: &[Task],
    total_leads: usize,
    today: NaiveDate,
    tz: &Tz,
    window_days: u64,
) -> DashboardMetrics {
    let start = midnight(today);
    let end = today
        .checked_add_days(Days::new(window_days))
        .map(midnight)
        .unwrap_or(NaiveDateTime::MAX);

    let mut metrics = DashboardMetrics {
        total_leads,
        ..Default::default()
    };

    for task in tasks.iter().filter(|t| t.is_pending()) {
        metrics.total_tasks += 1;
        let Some(at) = task_time(task, tz) else {
            continue;
        };
        if at.date() == today {
            metrics.todays_tasks += 1;
        }
        if at >= start && at <= end {
            metrics.upcoming_tasks += 1;
        }
    }

    metrics
}

fn task_time<Tz: TimeZone>(task: &Task, tz: &Tz) -> Option<NaiveDateTime> {
    parse_local_datetime(task.date.as_deref()?, tz)
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::default())
}

/// Entries on local day `date`, ordered by time (stable)
pub fn bucket_by_date(items: &[CalendarEntry], date: NaiveDate) -> Vec<CalendarEntry> {
    let mut bucket: Vec<CalendarEntry> = items.iter().filter(|e| e.date == date).cloned().collect();
    bucket.sort_by(|a, b| a.time.cmp(&b.time));
    bucket
}

/// Pending tasks on local day `date`, ordered by their local time
pub fn tasks_on<Tz: TimeZone>(tasks: &[Task], date: NaiveDate, tz: &Tz) -> Vec<Task> {
    let mut dated: Vec<(NaiveDateTime, &Task)> = tasks
        .iter()
        .filter(|t| t.is_pending())
        .filter_map(|t| task_time(t, tz).map(|at| (at, t)))
        .filter(|(at, _)| at.date() == date)
        .collect();
    dated.sort_by_key(|(at, _)| *at);
    dated.into_iter().map(|(_, t)| t.clone()).collect()
}
