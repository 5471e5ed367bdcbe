//! Lead endpoints
//!
//! - `GET /leads?assignedTo=` - leads, optionally for one agent
//! - `POST /leads` - create; name, email, phone and property are required
//! - `PUT /leads` - shallow update of the lead named by `_id`
//! - `DELETE /leads/{id}` - delete one lead

use hyper::Response;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{error_response, parse_body, path_id, query_param, respond, FullBody};
use crate::db::schemas::Lead;
use crate::repo::LeadFilter;
use crate::server::AppState;

#[derive(Serialize)]
struct LeadResponse {
    success: bool,
    lead: Lead,
}

pub async fn list_leads(state: &AppState, query: Option<&str>) -> Response<FullBody> {
    let filter = LeadFilter {
        assigned_to: query_param(query, "assignedTo"),
    };
    respond(state.timed(state.leads.list_leads(&filter)).await)
}

pub async fn create_lead(state: &AppState, body: &[u8]) -> Response<FullBody> {
    let lead: Lead = match parse_body(body) {
        Ok(lead) => lead,
        Err(e) => return error_response(&e),
    };
    respond(
        state
            .timed(state.leads.create_lead(lead))
            .await
            .map(|lead| LeadResponse {
                success: true,
                lead,
            }),
    )
}

pub async fn update_lead(state: &AppState, body: &[u8]) -> Response<FullBody> {
    let mut partial: Map<String, Value> = match parse_body(body) {
        Ok(partial) => partial,
        Err(e) => return error_response(&e),
    };
    // a body without a usable `_id` names no lead
    let id = match partial.remove("_id") {
        Some(Value::String(id)) => id,
        _ => String::new(),
    };
    respond(
        state
            .timed(state.leads.update_lead(&id, partial))
            .await
            .map(|lead| LeadResponse {
                success: true,
                lead,
            }),
    )
}

pub async fn delete_lead(state: &AppState, id: &str) -> Response<FullBody> {
    let id = path_id(id);
    respond(
        state
            .timed(state.leads.delete_lead(&id))
            .await
            .map(|()| json!({ "success": true })),
    )
}
