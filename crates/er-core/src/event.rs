//! # Events
//!
//! Events are opaque JSON documents. The core only ever looks at two
//! fields: the identity (`meta.id`) and the type (`meta.type`), which
//! backends use to route documents into partitions.

use serde_json::{Map, Value};

/// An event document, passed through unmodified.
pub type Event = Map<String, Value>;

/// Dotted path of the event identifier.
pub const ID_FIELD: &str = "meta.id";

/// Dotted path of the event type.
pub const TYPE_FIELD: &str = "meta.type";

/// Resolve a dot-namespaced path (`meta.id`) inside an event.
pub fn field<'a>(event: &'a Event, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = event.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

pub fn event_id(event: &Event) -> Option<&str> {
    field(event, ID_FIELD).and_then(Value::as_str)
}

pub fn event_type(event: &Event) -> Option<&str> {
    field(event, TYPE_FIELD).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity() -> Event {
        json!({
            "data": { "name": "Test activity" },
            "links": [],
            "meta": {
                "id": "e04cf9d3-4d57-471e-bd65-f8fc20d21d84",
                "time": 1629449650361u64,
                "type": "EiffelActivityTriggeredEvent",
                "version": "3.0.0"
            }
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_field_walks_nested_objects() {
        let event = activity();
        assert_eq!(field(&event, "data.name"), Some(&json!("Test activity")));
        assert_eq!(field(&event, "meta.time"), Some(&json!(1629449650361u64)));
    }

    #[test]
    fn test_field_missing_path() {
        let event = activity();
        assert_eq!(field(&event, "meta.missing"), None);
        assert_eq!(field(&event, "links.0"), None);
        assert_eq!(field(&event, "data.name.deeper"), None);
    }

    #[test]
    fn test_identity_fields() {
        let event = activity();
        assert_eq!(
            event_id(&event),
            Some("e04cf9d3-4d57-471e-bd65-f8fc20d21d84")
        );
        assert_eq!(event_type(&event), Some("EiffelActivityTriggeredEvent"));
    }
}
