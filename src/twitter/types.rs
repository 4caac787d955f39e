//! Entities returned by the REST API.
//!
//! Only the fields this crate's callers commonly need are modelled; unknown
//! fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Twitter's `created_at` format, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

fn twitter_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_str(&raw, TWITTER_DATE_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

/// Identifies a user either by numeric id or by screen name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(u64),
    ScreenName(String),
}

impl UserRef {
    /// A screen-name reference; a leading `@` is dropped.
    pub fn screen_name(name: impl Into<String>) -> Self {
        UserRef::ScreenName(name.into().trim_start_matches('@').to_string())
    }

    /// Parameter name and value this reference binds to.
    pub fn as_param(&self) -> (&'static str, String) {
        match self {
            UserRef::Id(id) => ("user_id", id.to_string()),
            UserRef::ScreenName(name) => ("screen_name", name.clone()),
        }
    }
}

impl From<u64> for UserRef {
    fn from(id: u64) -> Self {
        UserRef::Id(id)
    }
}

impl From<&str> for UserRef {
    fn from(name: &str) -> Self {
        UserRef::screen_name(name)
    }
}

/// Identifies a list either by id or by owner and slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRef {
    Id(u64),
    Slug { owner: UserRef, slug: String },
}

/// A user account (`users/show`, `followers/list`, list members).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: u64,
    pub screen_name: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub friends_count: u64,
    #[serde(default)]
    pub protected: bool,
    #[serde(deserialize_with = "twitter_date")]
    pub created_at: DateTime<Utc>,
}

/// A status. Extended-mode `full_text` is read into `text`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tweet {
    pub id: u64,
    #[serde(alias = "full_text")]
    pub text: String,
    #[serde(deserialize_with = "twitter_date")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub in_reply_to_status_id: Option<u64>,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub favorite_count: u64,
}

/// A curated list (`lists/memberships`, `lists/list`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TwitterList {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub member_count: u64,
    #[serde(default)]
    pub mode: Option<String>,
}

/// Paging hints returned with search results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchMetadata {
    pub max_id: u64,
    pub since_id: u64,
    pub count: u32,
    #[serde(default)]
    pub next_results: Option<String>,
}

/// Page-based (not cursored) search results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResults {
    pub statuses: Vec<Tweet>,
    pub search_metadata: SearchMetadata,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageData {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageTarget {
    pub recipient_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageCreate {
    pub target: MessageTarget,
    pub sender_id: String,
    pub message_data: MessageData,
}

/// One `message_create` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectMessageEvent {
    pub id: String,
    pub created_timestamp: String,
    pub message_create: MessageCreate,
}

/// Direct message events use a string cursor of their own, not [`Cursor`](crate::Cursor).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectMessageEvents {
    pub events: Vec<DirectMessageEvent>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A geo place (`geo/id`, `geo/search`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub country_code: Option<String>,
    pub place_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceResults {
    pub places: Vec<Place>,
}

/// Body of `geo/search`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoSearchResult {
    pub result: PlaceResults,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn user_parses_twitter_timestamp() {
        let user: User = serde_json::from_str(
            r#"{"id":6253282,"screen_name":"TwitterAPI","name":"Twitter API",
                "followers_count":6133636,"created_at":"Wed May 23 06:01:13 +0000 2007",
                "unknown_field":true}"#,
        )
        .unwrap();
        assert_eq!(user.id, 6253282);
        assert_eq!(user.created_at.year(), 2007);
        assert_eq!(user.friends_count, 0);
    }

    #[test]
    fn tweet_accepts_full_text() {
        let tweet: Tweet = serde_json::from_str(
            r#"{"id":1,"full_text":"hello","created_at":"Wed Oct 10 20:19:24 +0000 2018"}"#,
        )
        .unwrap();
        assert_eq!(tweet.text, "hello");
        assert!(tweet.user.is_none());
    }

    #[test]
    fn search_results_with_metadata() {
        let results: SearchResults = serde_json::from_str(
            r#"{"statuses":[{"id":1050118621198921728,"text":"Rust 1.30 is out",
                 "created_at":"Wed Oct 10 20:19:24 +0000 2018",
                 "user":{"id":165262325,"screen_name":"rustlang","name":"Rust Language",
                         "created_at":"Sun Jul 11 00:39:13 +0000 2010"},
                 "retweet_count":120}],
                "search_metadata":{"max_id":1050118621198921728,"since_id":0,"count":15,
                 "next_results":"?max_id=1050118621198921727&q=rustlang"}}"#,
        )
        .unwrap();

        assert_eq!(results.statuses.len(), 1);
        let tweet = &results.statuses[0];
        assert_eq!(tweet.retweet_count, 120);
        assert_eq!(tweet.user.as_ref().unwrap().screen_name, "rustlang");
        assert_eq!(results.search_metadata.count, 15);
        assert!(results.search_metadata.next_results.is_some());
    }

    #[test]
    fn direct_message_events_keep_string_cursor() {
        let events: DirectMessageEvents = serde_json::from_str(
            r#"{"events":[{"type":"message_create","id":"110","created_timestamp":"5300",
                 "message_create":{"target":{"recipient_id":"1234"},"sender_id":"3805104374",
                                   "message_data":{"text":"Blue Bird","entities":{}}}}],
                "next_cursor":"AB345dkfC"}"#,
        )
        .unwrap();

        assert_eq!(events.next_cursor.as_deref(), Some("AB345dkfC"));
        let event = &events.events[0];
        assert_eq!(event.message_create.target.recipient_id, "1234");
        assert_eq!(event.message_create.message_data.text, "Blue Bird");

        let last: DirectMessageEvents = serde_json::from_str(r#"{"events":[]}"#).unwrap();
        assert!(last.next_cursor.is_none());
    }

    #[test]
    fn geo_search_result_lists_places() {
        let result: GeoSearchResult = serde_json::from_str(
            r#"{"query":{"type":"reverse_geocode"},
                "result":{"places":[{"id":"5a110d312052166f","name":"San Francisco",
                  "full_name":"San Francisco, CA","country_code":"US","place_type":"city"}]}}"#,
        )
        .unwrap();

        let place = &result.result.places[0];
        assert_eq!(place.full_name, "San Francisco, CA");
        assert_eq!(place.country_code.as_deref(), Some("US"));
        assert_eq!(place.place_type, "city");
    }

    #[test]
    fn screen_name_strips_at_sign() {
        assert_eq!(
            UserRef::from("@rustlang").as_param(),
            ("screen_name", "rustlang".to_string())
        );
        assert_eq!(UserRef::from(42u64).as_param(), ("user_id", "42".to_string()));
    }
}
