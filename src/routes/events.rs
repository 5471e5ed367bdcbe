//! Event endpoints
//!
//! - `GET /events` - every event
//! - `POST /events` - create (status defaults to `scheduled`)
//! - `PUT /events` - `$set` the supplied fields of the event named by `_id`
//! - `DELETE /events/{id}` - delete one event

use hyper::Response;
use serde_json::{json, Map, Value};

use super::{error_response, parse_body, path_id, respond, FullBody};
use crate::server::AppState;

pub async fn list_events(state: &AppState) -> Response<FullBody> {
    respond(state.timed(state.events.list_events()).await)
}

pub async fn create_event(state: &AppState, body: &[u8]) -> Response<FullBody> {
    let input: Map<String, Value> = match parse_body(body) {
        Ok(input) => input,
        Err(e) => return error_response(&e),
    };
    respond(state.timed(state.events.create_event(input)).await)
}

pub async fn update_event(state: &AppState, body: &[u8]) -> Response<FullBody> {
    let input: Map<String, Value> = match parse_body(body) {
        Ok(input) => input,
        Err(e) => return error_response(&e),
    };
    respond(state.timed(state.events.update_event(input)).await)
}

pub async fn delete_event(state: &AppState, id: &str) -> Response<FullBody> {
    let id = path_id(id);
    respond(
        state
            .timed(state.events.delete_event(&id))
            .await
            .map(|()| json!({ "success": true })),
    )
}
