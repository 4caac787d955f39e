//! Timelines and status updates.
//!
//! Timelines are paged with `since_id`/`max_id` rather than cursors; these
//! are ordinary parameters and need no traversal support.

use crate::request::{RequestDescriptor, ResponseShape};

use super::types::UserRef;

/// Window parameters shared by the timeline endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineWindow {
    pub count: Option<u32>,
    pub since_id: Option<u64>,
    pub max_id: Option<u64>,
}

impl TimelineWindow {
    /// Newest `count` tweets.
    pub fn count(count: u32) -> Self {
        Self {
            count: Some(count),
            ..Self::default()
        }
    }

    /// Window for the page of tweets older than `oldest_seen`.
    pub fn older_than(self, oldest_seen: u64) -> Self {
        Self {
            max_id: oldest_seen.checked_sub(1),
            ..self
        }
    }
}

/// `GET statuses/user_timeline`
pub fn user_timeline(user: &UserRef, window: TimelineWindow) -> RequestDescriptor {
    let (name, value) = user.as_param();
    RequestDescriptor::get("statuses/user_timeline.json")
        .required(name, value)
        .optional("count", window.count)
        .optional("since_id", window.since_id)
        .optional("max_id", window.max_id)
        .optional("tweet_mode", Some("extended"))
        .shape(ResponseShape::List)
        .build()
}

/// `GET statuses/home_timeline`
pub fn home_timeline(window: TimelineWindow) -> RequestDescriptor {
    RequestDescriptor::get("statuses/home_timeline.json")
        .optional("count", window.count)
        .optional("since_id", window.since_id)
        .optional("max_id", window.max_id)
        .optional("tweet_mode", Some("extended"))
        .shape(ResponseShape::List)
        .build()
}

/// `POST statuses/update`, optionally as a reply.
pub fn update_status(text: &str, in_reply_to: Option<u64>) -> RequestDescriptor {
    RequestDescriptor::post("statuses/update.json")
        .required("status", text)
        .optional("in_reply_to_status_id", in_reply_to)
        .optional("auto_populate_reply_metadata", in_reply_to.map(|_| true))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_of(descriptor: &RequestDescriptor) -> String {
        let base = url::Url::parse("https://api.twitter.com/1.1").unwrap();
        descriptor.url(&base).unwrap().to_string()
    }

    #[test]
    fn older_than_moves_max_id_below_oldest_seen() {
        let window = TimelineWindow::count(50).older_than(1000);
        assert_eq!(window.count, Some(50));
        assert_eq!(window.max_id, Some(999));
        assert_eq!(window.since_id, None);

        assert_eq!(TimelineWindow::default().older_than(0).max_id, None);
    }

    #[test]
    fn user_timeline_binds_window() {
        let window = TimelineWindow {
            count: Some(10),
            since_id: Some(5),
            max_id: None,
        };
        assert_eq!(
            url_of(&user_timeline(&UserRef::Id(3), window)),
            "https://api.twitter.com/1.1/statuses/user_timeline.json?user_id=3&count=10&since_id=5&tweet_mode=extended"
        );
    }

    #[test]
    fn reply_adds_reply_metadata() {
        let descriptor = update_status("hi", Some(77));
        let (_, body) = descriptor.body().unwrap().unwrap();
        assert_eq!(
            body,
            "status=hi&in_reply_to_status_id=77&auto_populate_reply_metadata=true"
        );

        let (_, body) = update_status("hi", None).body().unwrap().unwrap();
        assert_eq!(body, "status=hi");
    }
}
