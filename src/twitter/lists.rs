//! List membership endpoints.

use crate::cursor::Cursor;
use crate::request::{RequestBuilder, RequestDescriptor, ResponseShape};

use super::types::{ListRef, UserRef};

fn bind_list(builder: RequestBuilder, list: &ListRef) -> RequestBuilder {
    match list {
        ListRef::Id(id) => builder.required("list_id", id),
        ListRef::Slug { owner, slug } => {
            let builder = match owner {
                UserRef::Id(id) => builder.required("owner_id", id),
                UserRef::ScreenName(name) => builder.required("owner_screen_name", name),
            };
            builder.required("slug", slug)
        }
    }
}

/// `GET lists/members`: users in `list`, cursored.
///
/// # Parameters
///
/// - `list`: The list, by id or by owner and slug
/// - `cursor`: Input cursor; [`Cursor::FIRST`] for the first page
/// - `count`: Page size, at most 5,000
pub fn members(list: &ListRef, cursor: Cursor, count: Option<u32>) -> RequestDescriptor {
    bind_list(RequestDescriptor::get("lists/members.json"), list)
        .cursor(cursor)
        .optional("count", count)
        .optional("skip_status", Some(true))
        .cursored("users")
        .build()
}

/// `GET lists/memberships`: lists `user` has been added to, cursored.
pub fn memberships(user: &UserRef, cursor: Cursor, count: Option<u32>) -> RequestDescriptor {
    let (name, value) = user.as_param();
    RequestDescriptor::get("lists/memberships.json")
        .required(name, value)
        .cursor(cursor)
        .optional("count", count)
        .cursored("lists")
        .build()
}

/// `GET lists/list`: lists `user` subscribes to or owns (not cursored).
pub fn subscribed(user: &UserRef) -> RequestDescriptor {
    let (name, value) = user.as_param();
    RequestDescriptor::get("lists/list.json")
        .required(name, value)
        .shape(ResponseShape::List)
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
    fn members_by_owner_screen_name_and_slug() {
        let list = ListRef::Slug {
            owner: UserRef::screen_name("a"),
            slug: "s".to_string(),
        };
        assert_eq!(
            url_of(&members(&list, Cursor::FIRST, Some(5))),
            "https://api.twitter.com/1.1/lists/members.json?owner_screen_name=a&slug=s&cursor=-1&count=5&skip_status=true"
        );
    }

    #[test]
    fn members_by_owner_id_or_list_id() {
        let by_owner = ListRef::Slug {
            owner: UserRef::Id(783214),
            slug: "team".to_string(),
        };
        assert_eq!(
            url_of(&members(&by_owner, Cursor::from_raw(99), None)),
            "https://api.twitter.com/1.1/lists/members.json?owner_id=783214&slug=team&cursor=99&skip_status=true"
        );
        let descriptor = members(&ListRef::Id(1234), Cursor::FIRST, None);
        assert_eq!(
            url_of(&descriptor),
            "https://api.twitter.com/1.1/lists/members.json?list_id=1234&cursor=-1&skip_status=true"
        );
        assert_eq!(
            descriptor.shape(),
            &ResponseShape::CursoredPage { items_key: "users" }
        );
    }

    #[test]
    fn memberships_and_subscribed() {
        let user = UserRef::screen_name("rustlang");
        let descriptor = memberships(&user, Cursor::FIRST, Some(20));
        assert_eq!(
            url_of(&descriptor),
            "https://api.twitter.com/1.1/lists/memberships.json?screen_name=rustlang&cursor=-1&count=20"
        );
        assert_eq!(
            descriptor.shape(),
            &ResponseShape::CursoredPage { items_key: "lists" }
        );

        let descriptor = subscribed(&UserRef::Id(7));
        assert_eq!(
            url_of(&descriptor),
            "https://api.twitter.com/1.1/lists/list.json?user_id=7"
        );
        assert_eq!(descriptor.shape(), &ResponseShape::List);
    }
}
