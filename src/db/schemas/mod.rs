//! Typed document models for the CRM collections

pub mod event;
pub mod lead;

pub use event::{CalendarEvent, EntryStatus, EventType, EVENT_COLLECTION};
pub use lead::{
    BudgetRange, CallHistory, Extensions, Lead, LeadDocument, Lenient, Offer, PropertyPreferences,
    Showing, Task, TaskPriority, TaskStatus, LEAD_COLLECTION,
};
