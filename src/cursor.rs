//! Cursor-paginated collections.
//!
//! Twitter walks large relationship graphs (followers, friends, list members)
//! with an opaque, server-issued cursor. A request starts at [`Cursor::FIRST`]
//! and each response carries the cursors of its neighbouring pages. A cursor
//! equal to [`Cursor::TERMINAL`] means there is no page in that direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque position in a server-maintained ordered sequence.
///
/// The client never interprets a cursor beyond checking whether it is
/// terminal. Cursors are passed back to the server verbatim, so this type
/// deliberately offers no ordering or arithmetic.
///
/// A cursor returned for one direction is only meaningful as input for a
/// request in that same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(i64);

impl Cursor {
    /// Requests the first page in the forward direction.
    pub const FIRST: Cursor = Cursor(-1);

    /// Marks the end of the sequence in the direction it was returned for.
    pub const TERMINAL: Cursor = Cursor(0);

    /// Wraps a raw value received from the server or read back from storage.
    pub fn from_raw(raw: i64) -> Self {
        Cursor(raw)
    }

    /// Returns `true` if no further page exists in this cursor's direction.
    pub fn is_terminal(&self) -> bool {
        self.0 == 0
    }

    /// The wire form used for the `cursor` request parameter.
    pub fn to_param(self) -> String {
        self.0.to_string()
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::FIRST
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a cursor previously persisted with its `Display` form.
impl FromStr for Cursor {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Cursor)
    }
}

/// Which neighbouring page a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Follow `next_cursor`.
    #[default]
    Forward,
    /// Follow `previous_cursor`.
    Backward,
}

/// One page of a cursored collection.
///
/// Items are kept in the order the server returned them (typically
/// reverse-chronological). A page is built once per response and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CursoredPage<T> {
    items: Vec<T>,
    #[serde(default = "terminal")]
    previous_cursor: Cursor,
    next_cursor: Cursor,
}

fn terminal() -> Cursor {
    Cursor::TERMINAL
}

impl<T> CursoredPage<T> {
    /// Builds a page from already decoded parts.
    pub fn new(items: Vec<T>, previous_cursor: Cursor, next_cursor: Cursor) -> Self {
        Self {
            items,
            previous_cursor,
            next_cursor,
        }
    }

    /// Items of this page, in server order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consumes the page, keeping only its items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Number of items on this page. May be zero on a non-final page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// An empty page does not imply the collection is exhausted; check
    /// [`has_more`](Self::has_more) instead.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Input cursor for the following page; terminal when this is the last one.
    pub fn next_cursor(&self) -> Cursor {
        self.next_cursor
    }

    /// Input cursor for the preceding page; terminal on the first page.
    pub fn previous_cursor(&self) -> Cursor {
        self.previous_cursor
    }

    /// The cursor to request for the adjacent page in `direction`.
    pub fn cursor_toward(&self, direction: Direction) -> Cursor {
        match direction {
            Direction::Forward => self.next_cursor,
            Direction::Backward => self.previous_cursor,
        }
    }

    /// Returns `true` if the server signalled another page in `direction`.
    pub fn has_more(&self, direction: Direction) -> bool {
        !self.cursor_toward(direction).is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_values() {
        assert!(Cursor::TERMINAL.is_terminal());
        assert!(!Cursor::FIRST.is_terminal());
        assert_eq!(Cursor::FIRST.to_param(), "-1");
        assert_eq!(Cursor::default(), Cursor::FIRST);
    }

    #[test]
    fn persisted_cursor_reads_back() {
        let cursor = Cursor::from_raw(1_374_004_777_531_007_833);
        let restored: Cursor = cursor.to_string().parse().unwrap();
        assert_eq!(restored, cursor);
        assert!("not-a-cursor".parse::<Cursor>().is_err());
    }

    #[test]
    fn empty_page_can_still_have_more() {
        let page: CursoredPage<u64> =
            CursoredPage::new(Vec::new(), Cursor::TERMINAL, Cursor::from_raw(123));
        assert!(page.is_empty());
        assert!(page.has_more(Direction::Forward));
        assert!(!page.has_more(Direction::Backward));
        assert_eq!(page.cursor_toward(Direction::Forward), Cursor::from_raw(123));
    }

    #[test]
    fn page_deserializes_with_missing_previous_cursor() {
        let page: CursoredPage<u64> =
            serde_json::from_str(r#"{"items":[4,5],"next_cursor":77}"#).unwrap();
        assert_eq!(page.items(), &[4, 5]);
        assert_eq!(page.next_cursor(), Cursor::from_raw(77));
        assert!(page.previous_cursor().is_terminal());
    }
}
