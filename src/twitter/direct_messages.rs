//! Direct message events.

use serde_json::json;

use crate::request::RequestDescriptor;

/// `GET direct_messages/events/list`. The `cursor` here is the string
/// cursor from a previous [`DirectMessageEvents`](super::types::DirectMessageEvents).
pub fn list_events(count: Option<u32>, cursor: Option<&str>) -> RequestDescriptor {
    RequestDescriptor::get("direct_messages/events/list.json")
        .optional("count", count)
        .optional("cursor", cursor)
        .build()
}

/// `POST direct_messages/events/new` with a plain text message.
pub fn send_message(recipient_id: u64, text: &str) -> RequestDescriptor {
    RequestDescriptor::post("direct_messages/events/new.json")
        .json(json!({
            "event": {
                "type": "message_create",
                "message_create": {
                    "target": { "recipient_id": recipient_id.to_string() },
                    "message_data": { "text": text }
                }
            }
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn send_message_uses_json_body() {
        let descriptor = send_message(42, "hello");
        let (content_type, body) = descriptor.body().unwrap().unwrap();
        assert_eq!(content_type, "application/json");

        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["event"]["type"], "message_create");
        assert_eq!(
            body["event"]["message_create"]["target"]["recipient_id"],
            "42"
        );
        assert_eq!(
            body["event"]["message_create"]["message_data"]["text"],
            "hello"
        );
    }

    #[test]
    fn list_events_passes_string_cursor() {
        let base = url::Url::parse("https://api.twitter.com/1.1").unwrap();
        let url = list_events(Some(50), Some("MTA0NjA2")).url(&base).unwrap();
        assert_eq!(url.query(), Some("count=50&cursor=MTA0NjA2"));
    }
}
