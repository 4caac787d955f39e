//! Twitter/X REST API surface.
//!
//! Each submodule builds [`RequestDescriptor`](crate::RequestDescriptor)s for
//! one endpoint family. They only assemble parameters; execution goes
//! through the [`Dispatcher`](crate::Dispatcher), usually via
//! [`TwitterClient`].

mod client;
pub mod direct_messages;
pub mod friendships;
pub mod geo;
pub mod lists;
pub mod search;
pub mod timelines;
pub mod types;
pub mod users;

pub use client::TwitterClient;
pub use timelines::TimelineWindow;
pub use types::{
    DirectMessageEvent, DirectMessageEvents, GeoSearchResult, ListRef, Place, SearchResults,
    Tweet, TwitterList, User, UserRef,
};
