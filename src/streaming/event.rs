//! Typed server-sent events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event tag; unknown tags are passed through verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Output,
    Logs,
    Error,
    Done,
    Other(String),
}

impl EventType {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "output" => EventType::Output,
            "logs" => EventType::Logs,
            "error" => EventType::Error,
            "done" => EventType::Done,
            other => EventType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Output => "output",
            EventType::Logs => "logs",
            EventType::Error => "error",
            EventType::Done => "done",
            EventType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dispatched event block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSentEvent {
    pub event: EventType,
    pub data: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Reconnection hint in milliseconds
    #[serde(default)]
    pub retry: Option<u64>,
}

impl ServerSentEvent {
    pub fn new(event: EventType, data: impl Into<String>) -> Self {
        Self {
            event,
            data: data.into(),
            id: None,
            retry: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.event == EventType::Done
    }
}

/// Output events print as their payload, everything else with its tag
impl fmt::Display for ServerSentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event {
            EventType::Output => f.write_str(&self.data),
            _ => write!(f, "[{}] {}", self.event, self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parse() {
        assert_eq!(EventType::parse("output"), EventType::Output);
        assert_eq!(EventType::parse("done"), EventType::Done);
        assert_eq!(EventType::parse("heartbeat"), EventType::Other("heartbeat".to_string()));
        assert_eq!(EventType::parse("heartbeat").as_str(), "heartbeat");
    }

    #[test]
    fn test_event_display() {
        assert_eq!(ServerSentEvent::new(EventType::Output, "Hello").to_string(), "Hello");
        assert_eq!(
            ServerSentEvent::new(EventType::Logs, "step 1").to_string(),
            "[logs] step 1"
        );
    }
}
