use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Domain facts recorded for asynchronous delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    BookingCreated,
    BookingCompleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::BookingCreated => "BOOKING_CREATED",
            EventType::BookingCompleted => "BOOKING_COMPLETED",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOKING_CREATED" => Ok(EventType::BookingCreated),
            "BOOKING_COMPLETED" => Ok(EventType::BookingCompleted),
            _ => Err(format!("Unknown event type: {}", s)),
        }
    }
}

/// Delivery state of an outbox event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Pending,
    Processed,
    Skipped,
    Failed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "PENDING",
            EventStatus::Processed => "PROCESSED",
            EventStatus::Skipped => "SKIPPED",
            EventStatus::Failed => "FAILED",
        }
    }
}

/// Database model for outbox events
#[derive(Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::outbox_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct OutboxEvent {
    pub id: String,
    pub event_type: String,
    pub aggregate_id: String,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: NaiveDateTime,
    pub processed_at: Option<NaiveDateTime>,
}

/// Model for enqueuing a new outbox event
#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::outbox_events)]
pub struct NewOutboxEvent {
    pub id: String,
    pub event_type: String,
    pub aggregate_id: String,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub created_at: NaiveDateTime,
}

impl NewOutboxEvent {
    fn new(event_type: EventType, aggregate_id: &str) -> Self {
        NewOutboxEvent {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: event_type.as_str().to_string(),
            aggregate_id: aggregate_id.to_string(),
            payload: json!({ "bookingId": aggregate_id }).to_string(),
            status: EventStatus::Pending.as_str().to_string(),
            attempts: 0,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn booking_created(booking_id: &str) -> Self {
        NewOutboxEvent::new(EventType::BookingCreated, booking_id)
    }

    pub fn booking_completed(booking_id: &str) -> Self {
        NewOutboxEvent::new(EventType::BookingCompleted, booking_id)
    }
}
