//! Scheduling and aggregation core
//!
//! - [`calendar`]: local-calendar parsing and the calendar entry shape
//! - [`reconcile`]: merge of authoritative items with the cached mirror
//! - [`mirror`]: the cached mirror and optimistic showing drafts
//! - [`aggregate`]: dashboard metrics and date buckets

pub mod aggregate;
pub mod calendar;
pub mod mirror;
pub mod reconcile;

pub use aggregate::{
    bucket_by_date, compute_metrics, compute_metrics_within, flatten_tasks, tasks_on,
    DashboardMetrics, DEFAULT_UPCOMING_DAYS,
};
pub use calendar::{normalize_time, parse_local_date, parse_local_datetime, CalendarEntry};
pub use mirror::{CalendarMirror, ShowingDraft, MIRROR_KEY};
pub use reconcile::{lead_showings, reconcile};
