//! Calendar endpoints
//!
//! - `POST /calendar/reconcile` - merged view of server-held events and
//!   lead showings with a cached mirror, optionally limited to one day
//! - `POST /calendar/showings` - draft a showing and append it to the mirror
//!
//! The mirror comes from the request body (`cached`). When the body has
//! none and `MIRROR_DIR` is configured, the server-side copy is used
//! instead, and `/calendar/showings` writes it back.

use chrono::{Local, NaiveDate};
use hyper::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{error_response, parse_body, respond, FullBody};
use crate::repo::LeadFilter;
use crate::schedule::{
    bucket_by_date, lead_showings, reconcile, CalendarEntry, CalendarMirror, ShowingDraft,
};
use crate::server::AppState;
use crate::types::{CrmError, Result};

#[derive(Deserialize, Debug, Default)]
pub struct ReconcileRequest {
    /// Cached `calendar_events` items
    #[serde(default)]
    pub cached: Option<Vec<Value>>,
    /// Limit the result to this local day (`YYYY-MM-DD`)
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ReconcileResponse {
    pub entries: Vec<CalendarEntry>,
}

#[derive(Deserialize, Debug)]
pub struct ShowingRequest {
    pub showing: ShowingDraft,
    #[serde(default)]
    pub cached: Option<Vec<Value>>,
}

#[derive(Serialize, Debug)]
pub struct ShowingResponse {
    pub entry: CalendarEntry,
    /// The mirror after the append
    pub cached: Vec<Value>,
}

/// Mirror from the request, else the server-side copy, else empty
async fn resolve_mirror(state: &AppState, cached: Option<Vec<Value>>) -> Result<CalendarMirror> {
    match (cached, &state.args.mirror_dir) {
        (Some(items), _) => Ok(CalendarMirror::from_items(items)),
        (None, Some(dir)) => CalendarMirror::load(dir).await,
        (None, None) => Ok(CalendarMirror::new()),
    }
}

pub async fn reconcile_calendar(state: &AppState, body: &[u8]) -> Response<FullBody> {
    // an empty body asks for the server-held view only
    let request: ReconcileRequest = if body.is_empty() {
        ReconcileRequest::default()
    } else {
        match parse_body(body) {
            Ok(request) => request,
            Err(e) => return error_response(&e),
        }
    };
    respond(build_reconciled(state, request).await)
}

async fn build_reconciled(state: &AppState, request: ReconcileRequest) -> Result<ReconcileResponse> {
    let day = request
        .date
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|_| CrmError::Validation(format!("Invalid date: {}", d)))
        })
        .transpose()?;

    let events = state.timed(state.events.list_events()).await?;
    let leads = state
        .timed(state.leads.list_leads(&LeadFilter::default()))
        .await?;

    let mut authoritative: Vec<Value> = events
        .iter()
        .filter_map(|event| serde_json::to_value(event).ok())
        .collect();
    authoritative.extend(lead_showings(&leads));

    let mirror = resolve_mirror(state, request.cached).await?;
    let merged = reconcile(authoritative, mirror.into_items(), &Local);

    let entries = match day {
        Some(day) => bucket_by_date(&merged, day),
        None => merged,
    };
    Ok(ReconcileResponse { entries })
}

pub async fn add_showing(state: &AppState, body: &[u8]) -> Response<FullBody> {
    let request: ShowingRequest = match parse_body(body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };
    respond(append_showing(state, request).await)
}

async fn append_showing(state: &AppState, request: ShowingRequest) -> Result<ShowingResponse> {
    let entry = request.showing.into_entry(&Local)?;

    let persist = request.cached.is_none();
    let mut mirror = resolve_mirror(state, request.cached).await?;
    mirror.append(&entry)?;

    if let (true, Some(dir)) = (persist, &state.args.mirror_dir) {
        mirror.save(dir).await?;
    }
    info!(id = ?entry.id, date = %entry.date, time = %entry.time, "Drafted showing");

    Ok(ShowingResponse {
        entry,
        cached: mirror.into_items(),
    })
}
