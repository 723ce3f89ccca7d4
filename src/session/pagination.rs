//! Lazy traversal of paginated list endpoints.
//!
//! GitHub list endpoints return a JSON array per page and advertise the
//! following page through the `Link` response header. [`GitHubSession::paginate`]
//! turns that into a pull-based stream: a page is requested only when the
//! consumer polls past everything already buffered, and nothing further is
//! requested once the limit is reached.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::LINK;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{GitHubSession, SessionError};

/// Boxed stream of items decoded from a paginated endpoint.
pub type Paginated<T> = BoxStream<'static, Result<T, SessionError>>;

/// One decoded page plus the URL of the next one, if any.
#[derive(Debug)]
pub(crate) struct Page<R> {
    pub(crate) items: Vec<R>,
    pub(crate) next: Option<String>,
}

struct PageState<R> {
    session: GitHubSession,
    next_url: Option<String>,
    buffer: VecDeque<R>,
    remaining: Option<usize>,
}

impl GitHubSession {
    /// Stream the items behind `url`, following `rel="next"` links.
    ///
    /// `limit` of `None` walks every page; `Some(n)` yields at most `n`
    /// items. Each element is decoded as `R` and converted into `T`.
    pub fn paginate<R, T>(&self, url: &str, limit: Option<usize>) -> Paginated<T>
    where
        R: DeserializeOwned + Send + 'static,
        T: From<R> + Send + 'static,
    {
        let state = PageState {
            session: self.clone(),
            next_url: Some(url.to_string()),
            buffer: VecDeque::new(),
            remaining: limit,
        };
        stream::try_unfold(state, advance::<R>)
            .map_ok(T::from)
            .boxed()
    }

    #[instrument(skip(self))]
    pub(crate) async fn fetch_page<R: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Page<R>, SessionError> {
        let response = self.get(url).await?;
        if response.status() != StatusCode::OK {
            return Err(Self::status_error(response).await);
        }
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_link);
        let bytes = response.bytes().await?;
        let items: Vec<R> = serde_json::from_slice(&bytes)?;
        debug!(items = items.len(), has_next = next.is_some(), "fetched page");
        Ok(Page { items, next })
    }
}

async fn advance<R: DeserializeOwned>(
    mut state: PageState<R>,
) -> Result<Option<(R, PageState<R>)>, SessionError> {
    loop {
        if state.remaining == Some(0) {
            return Ok(None);
        }
        if let Some(item) = state.buffer.pop_front() {
            if let Some(remaining) = state.remaining.as_mut() {
                *remaining -= 1;
            }
            return Ok(Some((item, state)));
        }
        let Some(url) = state.next_url.take() else {
            return Ok(None);
        };
        let page = state.session.fetch_page::<R>(&url).await?;
        state.buffer.extend(page.items);
        state.next_url = page.next;
    }
}

/// Extract the `rel="next"` target from a `Link` header value.
pub(crate) fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut params = entry.split(';');
        let target = params
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;
        params
            .any(|param| {
                let param = param.trim();
                param == r#"rel="next""# || param == "rel=next"
            })
            .then(|| target.to_string())
    })
}
