//! Tweet search.

use crate::request::RequestDescriptor;

use super::timelines::TimelineWindow;

/// `GET search/tweets` for `query` (for example `#rustlang -filter:retweets`).
pub fn search_tweets(query: &str, window: TimelineWindow) -> RequestDescriptor {
    RequestDescriptor::get("search/tweets.json")
        .required("q", query)
        .optional("count", window.count)
        .optional("since_id", window.since_id)
        .optional("max_id", window.max_id)
        .optional("result_type", Some("recent"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_form_encoded() {
        let base = url::Url::parse("https://api.twitter.com/1.1").unwrap();
        let window = TimelineWindow::count(100).older_than(500);
        let url = search_tweets("#rustlang -filter:retweets", window)
            .url(&base)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.twitter.com/1.1/search/tweets.json?q=%23rustlang+-filter%3Aretweets&count=100&max_id=499&result_type=recent"
        );
    }
}
