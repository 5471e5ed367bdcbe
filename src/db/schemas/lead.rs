//! Lead document schema
//!
//! A lead owns its call history, documents, offers, showings and tasks;
//! those arrays change only through a lead update.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::event::{EntryStatus, EventType};
use crate::db::mongo::IntoIndexes;

/// Collection name for leads
pub const LEAD_COLLECTION: &str = "leads";

/// Unrecognized attributes, preserved but never interpreted
pub type Extensions = BTreeMap<String, Value>;

/// Lead document at the REST boundary
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Store-assigned identifier (string form)
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Date the lead came in (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Identifier of the agent the lead is assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_history: Option<Vec<CallHistory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<LeadDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offers: Option<Vec<Offer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showings: Option<Vec<Showing>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_preferences: Option<PropertyPreferences>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(flatten)]
    pub extra: Extensions,
}

impl Lead {
    /// Names of required creation fields that are absent or blank
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("property", &self.property),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(field, _)| field)
        .collect()
    }

    /// Embedded tasks, empty when the lead has none
    pub fn tasks(&self) -> &[Task] {
        self.tasks.as_deref().unwrap_or_default()
    }

    /// Embedded showings, empty when the lead has none
    pub fn showings(&self) -> &[Showing] {
        self.showings.as_deref().unwrap_or_default()
    }
}

impl IntoIndexes for Lead {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "assignedTo": 1 },
            Some(
                IndexOptions::builder()
                    .name("assigned_to_index".to_string())
                    .build(),
            ),
        )]
    }
}

/// A recognized value, or the stored one kept verbatim when it is not
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Lenient<T> {
    Known(T),
    Other(Value),
}

impl<T> Lenient<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Other(_) => None,
        }
    }
}

/// Embedded identifiers arrive as strings or as millisecond timestamps
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Call length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<String>,
    #[serde(flatten)]
    pub extra: Extensions,
}

/// Document attached to a lead (id, pre-approval, offer, agreement, ...)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadDocument {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_uploaded: Option<String>,
    #[serde(flatten)]
    pub extra: Extensions,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_date: Option<String>,
    /// pending, accepted, rejected, countered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_date: Option<String>,
    #[serde(flatten)]
    pub extra: Extensions,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BudgetRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(flatten)]
    pub extra: Extensions,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Extensions,
}

/// Property viewing embedded in a lead
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Showing {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Lenient<EntryStatus>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<Lenient<EventType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extensions,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// Task embedded in a lead
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// ISO-8601 date or date-time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Lenient<TaskStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Lenient<TaskPriority>>,
    #[serde(flatten)]
    pub extra: Extensions,
}

impl Task {
    /// Only an explicit `pending` status counts as open work
    pub fn is_pending(&self) -> bool {
        matches!(self.status, Some(Lenient::Known(TaskStatus::Pending)))
    }

    pub fn status(&self) -> Option<TaskStatus> {
        self.status.as_ref().and_then(Lenient::known).copied()
    }

    pub fn priority(&self) -> Option<TaskPriority> {
        self.priority.as_ref().and_then(Lenient::known).copied()
    }
}
