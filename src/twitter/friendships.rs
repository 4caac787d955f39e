//! Follower and friend graphs.
//!
//! The `ids` endpoints return up to 5,000 ids per page and the `list`
//! endpoints up to 200 hydrated users; both are cursored.

use crate::cursor::Cursor;
use crate::request::RequestDescriptor;

use super::types::UserRef;

/// `GET followers/ids`: ids of users following `user`.
///
/// # Parameters
///
/// - `user`: Whose followers to list
/// - `cursor`: Input cursor; [`Cursor::FIRST`] for the first page
/// - `count`: Page size, at most 5,000
///
/// # Example
///
/// ```rust
/// use twitter_rest::twitter::friendships;
/// use twitter_rest::{Cursor, UserRef};
///
/// let descriptor = friendships::followers_ids(&UserRef::screen_name("rustlang"), Cursor::FIRST, None);
/// assert_eq!(descriptor.path_template(), "followers/ids.json");
/// ```
pub fn followers_ids(user: &UserRef, cursor: Cursor, count: Option<u32>) -> RequestDescriptor {
    graph_ids("followers/ids.json", user, cursor, count)
}

/// `GET friends/ids`: ids of users `user` follows.
pub fn friends_ids(user: &UserRef, cursor: Cursor, count: Option<u32>) -> RequestDescriptor {
    graph_ids("friends/ids.json", user, cursor, count)
}

/// `GET followers/list`: hydrated followers of `user`.
pub fn followers_list(user: &UserRef, cursor: Cursor, count: Option<u32>) -> RequestDescriptor {
    graph_users("followers/list.json", user, cursor, count)
}

/// `GET friends/list`: hydrated friends of `user`.
pub fn friends_list(user: &UserRef, cursor: Cursor, count: Option<u32>) -> RequestDescriptor {
    graph_users("friends/list.json", user, cursor, count)
}

/// `POST friendships/create`: follow `user`.
pub fn create_friendship(user: &UserRef, enable_notifications: bool) -> RequestDescriptor {
    let (name, value) = user.as_param();
    RequestDescriptor::post("friendships/create.json")
        .required(name, value)
        .optional("follow", enable_notifications.then_some(true))
        .build()
}

/// `POST friendships/destroy`: unfollow `user`.
pub fn destroy_friendship(user: &UserRef) -> RequestDescriptor {
    let (name, value) = user.as_param();
    RequestDescriptor::post("friendships/destroy.json")
        .required(name, value)
        .build()
}

fn graph_ids(path: &str, user: &UserRef, cursor: Cursor, count: Option<u32>) -> RequestDescriptor {
    let (name, value) = user.as_param();
    RequestDescriptor::get(path)
        .required(name, value)
        .cursor(cursor)
        .optional("count", count)
        .cursored("ids")
        .build()
}

fn graph_users(path: &str, user: &UserRef, cursor: Cursor, count: Option<u32>) -> RequestDescriptor {
    let (name, value) = user.as_param();
    RequestDescriptor::get(path)
        .required(name, value)
        .cursor(cursor)
        .optional("count", count)
        .optional("skip_status", Some(true))
        .cursored("users")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Method, ResponseShape};

    fn url_of(descriptor: &RequestDescriptor) -> String {
        let base = url::Url::parse("https://api.twitter.com/1.1").unwrap();
        descriptor.url(&base).unwrap().to_string()
    }

    #[test]
    fn graph_endpoints_are_cursored() {
        let user = UserRef::Id(12);
        let ids = friends_ids(&user, Cursor::from_raw(5000), Some(5000));
        assert_eq!(
            url_of(&ids),
            "https://api.twitter.com/1.1/friends/ids.json?user_id=12&cursor=5000&count=5000"
        );
        assert_eq!(ids.shape(), &ResponseShape::CursoredPage { items_key: "ids" });

        let users = followers_list(&user, Cursor::FIRST, Some(200));
        assert_eq!(
            url_of(&users),
            "https://api.twitter.com/1.1/followers/list.json?user_id=12&cursor=-1&count=200&skip_status=true"
        );
        assert_eq!(users.shape(), &ResponseShape::CursoredPage { items_key: "users" });
    }

    #[test]
    fn destroy_posts_the_user_as_form_body() {
        let descriptor = destroy_friendship(&UserRef::screen_name("@rustlang"));
        assert_eq!(descriptor.method(), Method::Post);
        assert_eq!(
            url_of(&descriptor),
            "https://api.twitter.com/1.1/friendships/destroy.json"
        );
        assert_eq!(
            descriptor.body().unwrap(),
            Some((
                "application/x-www-form-urlencoded",
                "screen_name=rustlang".to_string()
            ))
        );
    }
}
