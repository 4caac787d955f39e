//! Walking a cursored collection page by page.
//!
//! [`CursorTraversal`] re-invokes a descriptor builder with each new cursor
//! until the server returns the terminal cursor or the caller stops
//! consuming. Pages are requested strictly one after another.
//!
//! A traversal cannot be restarted from the middle. To resume later, keep
//! [`resume_cursor`](CursorTraversal::resume_cursor) and start a new
//! traversal with [`starting_at`](CursorTraversal::starting_at).

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;

use futures::stream::{self, Stream, TryStreamExt};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use crate::cursor::{Cursor, CursoredPage, Direction};
use crate::dispatcher::{Dispatcher, Outcome};
use crate::error::{ApiError, TransportError};
use crate::request::RequestDescriptor;

#[derive(Debug)]
struct TraversalState {
    direction: Direction,
    next: Option<Cursor>,
    done: bool,
    pages: usize,
    max_pages: Option<usize>,
    visited: Option<HashSet<Cursor>>,
    deferred_error: Option<ApiError>,
}

impl TraversalState {
    /// Cursor for the next request, or `None` once the traversal is over.
    fn begin_page(&mut self) -> Option<Cursor> {
        if self.done {
            return None;
        }
        if self.max_pages.is_some_and(|max| self.pages >= max) {
            info!("Reached page limit ({}), stopping traversal", self.pages);
            self.done = true;
            return None;
        }
        let cursor = self.next?;
        if let Some(visited) = self.visited.as_mut() {
            visited.insert(cursor);
        }
        Some(cursor)
    }

    fn accept<T>(&mut self, page: &CursoredPage<T>) {
        self.pages += 1;
        let cursor = page.cursor_toward(self.direction);
        debug!(
            "Page {} returned {} items, next cursor {}",
            self.pages,
            page.len(),
            cursor
        );

        if cursor.is_terminal() {
            info!("Traversal finished after {} pages", self.pages);
            self.next = None;
            self.done = true;
            return;
        }

        if self.visited.as_ref().is_some_and(|v| v.contains(&cursor)) {
            warn!("Server returned previously visited cursor {}", cursor);
            self.deferred_error = Some(ApiError::Transport(TransportError::Protocol(format!(
                "cursor {} was already visited",
                cursor
            ))));
        }
        self.next = Some(cursor);
    }

    fn fail(&mut self, err: &ApiError) {
        warn!("Traversal stopped after {} pages: {}", self.pages, err);
        self.done = true;
    }
}

/// Lazy walk over a cursored remote collection.
///
/// `build` receives the input cursor for each page and returns the
/// descriptor to dispatch. Items are yielded in page order; an error ends
/// the sequence after it is yielded.
pub struct CursorTraversal<T, F> {
    dispatcher: Dispatcher,
    build: F,
    state: TraversalState,
    _items: PhantomData<fn() -> T>,
}

impl<T, F> fmt::Debug for CursorTraversal<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorTraversal")
            .field("state", &self.state)
            .finish()
    }
}

impl<T, F> CursorTraversal<T, F>
where
    F: FnMut(Cursor) -> RequestDescriptor,
{
    /// Forward traversal from the first page.
    pub fn new(dispatcher: Dispatcher, build: F) -> Self {
        Self {
            dispatcher,
            build,
            state: TraversalState {
                direction: Direction::Forward,
                next: Some(Cursor::FIRST),
                done: false,
                pages: 0,
                max_pages: None,
                visited: None,
                deferred_error: None,
            },
            _items: PhantomData,
        }
    }

    /// Continues a forward traversal from a previously stored cursor.
    pub fn starting_at(mut self, cursor: Cursor) -> Self {
        self.state.next = Some(cursor);
        self.state.done = cursor.is_terminal();
        self
    }

    /// Walks toward earlier pages, following `previous_cursor` from `from`.
    ///
    /// `from` must be a `previous_cursor` obtained from an earlier page.
    pub fn backward(mut self, from: Cursor) -> Self {
        self.state.direction = Direction::Backward;
        self.state.next = Some(from);
        self.state.done = from.is_terminal();
        self
    }

    /// Stops with a protocol error if the server hands back a cursor that
    /// was already requested. Off by default.
    pub fn with_cycle_guard(mut self) -> Self {
        self.state.visited = Some(HashSet::new());
        self
    }

    /// Stops cleanly after `pages` pages.
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.state.max_pages = Some(pages);
        self
    }

    /// Which cursor of each page the traversal follows.
    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    /// Number of pages received so far.
    pub fn pages_fetched(&self) -> usize {
        self.state.pages
    }

    /// Input cursor of the next page that would be requested; `None` once
    /// the collection is exhausted in this direction.
    pub fn resume_cursor(&self) -> Option<Cursor> {
        self.state.next
    }

    fn settle(
        &mut self,
        result: Result<CursoredPage<T>, ApiError>,
    ) -> Result<CursoredPage<T>, ApiError> {
        match result {
            Ok(page) => {
                self.state.accept(&page);
                Ok(page)
            }
            Err(err) => {
                self.state.fail(&err);
                Err(err)
            }
        }
    }

    fn take_deferred_error(&mut self) -> Option<ApiError> {
        let err = self.state.deferred_error.take()?;
        self.state.fail(&err);
        Some(err)
    }
}

impl<T, F> CursorTraversal<T, F>
where
    T: DeserializeOwned,
    F: FnMut(Cursor) -> RequestDescriptor,
{
    fn fetch_blocking(&mut self) -> Option<Result<CursoredPage<T>, ApiError>> {
        if let Some(err) = self.take_deferred_error() {
            return Some(Err(err));
        }
        let cursor = self.state.begin_page()?;
        let descriptor = (self.build)(cursor);
        let result = self.dispatcher.invoke_blocking::<CursoredPage<T>>(descriptor);
        Some(self.settle(result))
    }

    /// Blocking iterator over whole pages.
    pub fn pages_blocking(self) -> BlockingPages<T, F> {
        BlockingPages { traversal: self }
    }

    /// Blocking iterator over individual items.
    pub fn items_blocking(self) -> BlockingItems<T, F> {
        BlockingItems {
            traversal: self,
            buffer: VecDeque::new(),
        }
    }
}

impl<T, F> CursorTraversal<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: FnMut(Cursor) -> RequestDescriptor,
{
    async fn fetch_awaitable(&mut self) -> Option<Result<CursoredPage<T>, ApiError>> {
        if let Some(err) = self.take_deferred_error() {
            return Some(Err(err));
        }
        let cursor = self.state.begin_page()?;
        let descriptor = (self.build)(cursor);
        match self
            .dispatcher
            .invoke_awaitable::<CursoredPage<T>>(descriptor)
            .await
        {
            Outcome::Completed(page) => Some(self.settle(Ok(page))),
            Outcome::Failed(err) => Some(self.settle(Err(err))),
            Outcome::Cancelled => {
                debug!("Page request cancelled, ending traversal");
                self.state.done = true;
                None
            }
        }
    }

    /// Stream of whole pages.
    pub fn pages(self) -> impl Stream<Item = Result<CursoredPage<T>, ApiError>> {
        stream::unfold(self, |mut traversal| async move {
            let page = traversal.fetch_awaitable().await?;
            Some((page, traversal))
        })
    }

    /// Stream of individual items.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use futures::TryStreamExt;
    /// use twitter_rest::{ClientConfig, TwitterClient, UserRef};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    /// let config = ClientConfig::from_env()?;
    /// let client = TwitterClient::from_config(&config, tokio::runtime::Handle::current())?;
    /// let ids: Vec<u64> = client
    ///     .followers_ids(UserRef::screen_name("rustlang"))
    ///     .max_pages(3)
    ///     .items()
    ///     .try_collect()
    ///     .await?;
    /// println!("{} followers", ids.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn items(self) -> impl Stream<Item = Result<T, ApiError>> {
        self.pages()
            .map_ok(|page| stream::iter(page.into_items().into_iter().map(Ok::<T, ApiError>)))
            .try_flatten()
    }
}

/// Iterator returned by [`CursorTraversal::pages_blocking`].
#[derive(Debug)]
pub struct BlockingPages<T, F> {
    traversal: CursorTraversal<T, F>,
}

impl<T, F> BlockingPages<T, F> {
    pub fn traversal(&self) -> &CursorTraversal<T, F> {
        &self.traversal
    }
}

impl<T, F> Iterator for BlockingPages<T, F>
where
    T: DeserializeOwned,
    F: FnMut(Cursor) -> RequestDescriptor,
{
    type Item = Result<CursoredPage<T>, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.traversal.fetch_blocking()
    }
}

/// Iterator returned by [`CursorTraversal::items_blocking`].
pub struct BlockingItems<T, F> {
    traversal: CursorTraversal<T, F>,
    buffer: VecDeque<T>,
}

impl<T, F> BlockingItems<T, F> {
    pub fn traversal(&self) -> &CursorTraversal<T, F> {
        &self.traversal
    }
}

impl<T, F> fmt::Debug for BlockingItems<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingItems")
            .field("traversal", &self.traversal)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

impl<T, F> Iterator for BlockingItems<T, F>
where
    T: DeserializeOwned,
    F: FnMut(Cursor) -> RequestDescriptor,
{
    type Item = Result<T, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            // Empty pages with a live cursor keep the loop going.
            match self.traversal.fetch_blocking()? {
                Ok(page) => self.buffer.extend(page.into_items()),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
