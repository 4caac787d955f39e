//! High-level client over the dispatcher.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::runtime::Handle;

use crate::config::ClientConfig;
use crate::cursor::Cursor;
use crate::dispatcher::{Dispatched, Dispatcher, InvocationMode, TokioSpawner};
use crate::error::ApiError;
use crate::request::RequestDescriptor;
use crate::transport::ReqwestTransport;
use crate::traversal::CursorTraversal;

use super::types::{ListRef, TwitterList, User, UserRef};
use super::{friendships, lists};

/// Largest page the `ids` endpoints accept.
const MAX_IDS_PER_PAGE: u32 = 5000;
/// Largest page the hydrated user/list endpoints accept.
const MAX_USERS_PER_PAGE: u32 = 200;

/// Twitter REST API client.
///
/// Single calls go through [`call`](Self::call) with any
/// [`InvocationMode`]; cursored collections are exposed as
/// [`CursorTraversal`]s.
#[derive(Debug, Clone)]
pub struct TwitterClient {
    dispatcher: Dispatcher,
}

impl TwitterClient {
    /// Wraps an existing dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Builds a `reqwest`-backed client whose async work runs on `runtime`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use twitter_rest::{ClientConfig, TwitterClient, UserRef};
    ///
    /// let runtime = tokio::runtime::Runtime::new().unwrap();
    /// let config = ClientConfig::from_env().unwrap();
    /// let client = TwitterClient::from_config(&config, runtime.handle().clone()).unwrap();
    ///
    /// for id in client.followers_ids(UserRef::screen_name("rustlang")).items_blocking() {
    ///     println!("{}", id.unwrap());
    /// }
    /// ```
    pub fn from_config(config: &ClientConfig, runtime: Handle) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config, runtime.clone())?;
        let dispatcher = Dispatcher::new(
            Arc::new(transport),
            Arc::new(TokioSpawner::new(runtime)),
            config.base_url.clone(),
        );
        Ok(Self::new(dispatcher))
    }

    /// The dispatcher behind this client, for endpoints without a helper.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Dispatches any descriptor in the given mode.
    pub fn call<T>(&self, descriptor: RequestDescriptor, mode: InvocationMode<T>) -> Dispatched<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.dispatcher.dispatch(descriptor, mode)
    }

    /// Every follower id of `user`.
    pub fn followers_ids(
        &self,
        user: UserRef,
    ) -> CursorTraversal<u64, impl FnMut(Cursor) -> RequestDescriptor + Send + 'static> {
        CursorTraversal::new(self.dispatcher.clone(), move |cursor| {
            friendships::followers_ids(&user, cursor, Some(MAX_IDS_PER_PAGE))
        })
    }

    /// Every id `user` follows.
    pub fn friends_ids(
        &self,
        user: UserRef,
    ) -> CursorTraversal<u64, impl FnMut(Cursor) -> RequestDescriptor + Send + 'static> {
        CursorTraversal::new(self.dispatcher.clone(), move |cursor| {
            friendships::friends_ids(&user, cursor, Some(MAX_IDS_PER_PAGE))
        })
    }

    /// Every follower of `user`, hydrated.
    pub fn followers(
        &self,
        user: UserRef,
    ) -> CursorTraversal<User, impl FnMut(Cursor) -> RequestDescriptor + Send + 'static> {
        CursorTraversal::new(self.dispatcher.clone(), move |cursor| {
            friendships::followers_list(&user, cursor, Some(MAX_USERS_PER_PAGE))
        })
    }

    /// Every user `user` follows, hydrated.
    pub fn friends(
        &self,
        user: UserRef,
    ) -> CursorTraversal<User, impl FnMut(Cursor) -> RequestDescriptor + Send + 'static> {
        CursorTraversal::new(self.dispatcher.clone(), move |cursor| {
            friendships::friends_list(&user, cursor, Some(MAX_USERS_PER_PAGE))
        })
    }

    /// Every member of `list`.
    pub fn list_members(
        &self,
        list: ListRef,
    ) -> CursorTraversal<User, impl FnMut(Cursor) -> RequestDescriptor + Send + 'static> {
        CursorTraversal::new(self.dispatcher.clone(), move |cursor| {
            lists::members(&list, cursor, Some(MAX_USERS_PER_PAGE))
        })
    }

    /// Every list `user` is a member of.
    pub fn list_memberships(
        &self,
        user: UserRef,
    ) -> CursorTraversal<TwitterList, impl FnMut(Cursor) -> RequestDescriptor + Send + 'static>
    {
        CursorTraversal::new(self.dispatcher.clone(), move |cursor| {
            lists::memberships(&user, cursor, Some(MAX_USERS_PER_PAGE))
        })
    }
}
