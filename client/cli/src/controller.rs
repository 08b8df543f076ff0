//! Query state controller for the gallery listing
//!
//! Owns filters, pagination and the loaded item list. Every fetch is tagged
//! with a sequence number; a completion is only applied if it belongs to the
//! most recently issued request, so slow responses for superseded queries
//! cannot overwrite newer state.

use crate::api::{ApiError, GalleryApi, ImagePage, ImageSummary};
use crate::query::{FilterCriteria, ListQuery, PaginationState};

const LIST_ERROR: &str = "Failed to fetch images";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
}

/// A request that has been issued but not yet completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub seq: u64,
    pub query: ListQuery,
}

/// What happened to a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    /// A newer request was issued after this one; the result was dropped.
    Discarded,
}

/// Previous/next controls of the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: u32,
    pub total_pages: u32,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

/// What the listing screen should draw.
#[derive(Debug, PartialEq)]
pub enum GalleryView<'a> {
    /// Loading with nothing to show yet.
    Spinner,
    /// Fetch failed; offer "Try Again".
    Error { message: &'a str },
    /// No images match.
    Empty,
    Grid {
        items: &'a [ImageSummary],
        /// `None` when there is at most one page.
        pager: Option<Pager>,
        /// A refetch is in flight while the previous items stay visible.
        stale: bool,
    },
}

pub struct GalleryController<A> {
    api: A,
    filters: FilterCriteria,
    pagination: PaginationState,
    items: Vec<ImageSummary>,
    status: FetchStatus,
    error: Option<String>,
    issued: u64,
    last_query: Option<ListQuery>,
}

impl<A: GalleryApi> GalleryController<A> {
    pub fn new(api: A, limit: u32) -> Self {
        Self {
            api,
            filters: FilterCriteria::default(),
            pagination: PaginationState::new(limit.max(1)),
            items: Vec::new(),
            status: FetchStatus::Idle,
            error: None,
            issued: 0,
            last_query: None,
        }
    }

    /// Start from a given query key without issuing a request.
    pub fn with_query(api: A, query: ListQuery) -> Self {
        let mut controller = Self::new(api, query.limit);
        controller.filters = query.filters;
        controller.pagination.page = query.page;
        controller
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn items(&self) -> &[ImageSummary] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn in_flight(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn current_query(&self) -> ListQuery {
        ListQuery {
            page: self.pagination.page,
            limit: self.pagination.limit,
            filters: self.filters.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Synchronous transitions. Each returns the request the caller must run.
    // ------------------------------------------------------------------------

    /// Issue a request for the current query key.
    pub fn begin_fetch(&mut self) -> PendingFetch {
        let query = self.current_query();
        self.issue(query)
    }

    /// Replace the filters wholesale and go back to the first page.
    pub fn request_filters(&mut self, filters: FilterCriteria) -> PendingFetch {
        self.filters = filters;
        self.pagination.page = 1;
        self.begin_fetch()
    }

    /// Jump to `page` as given; only the pager controls know the bounds.
    pub fn request_page(&mut self, page: u32) -> PendingFetch {
        self.pagination.page = page;
        self.begin_fetch()
    }

    /// Re-issue exactly the last request.
    pub fn request_retry(&mut self) -> PendingFetch {
        let query = self
            .last_query
            .clone()
            .unwrap_or_else(|| self.current_query());
        self.issue(query)
    }

    fn issue(&mut self, query: ListQuery) -> PendingFetch {
        self.issued += 1;
        self.status = FetchStatus::Loading;
        self.last_query = Some(query.clone());
        tracing::debug!(seq = self.issued, page = query.page, "listing request issued");
        PendingFetch {
            seq: self.issued,
            query,
        }
    }

    /// Apply a finished request. Items and pagination are replaced together on
    /// success; on failure the previous items are kept.
    pub fn complete_fetch(&mut self, seq: u64, result: Result<ImagePage, ApiError>) -> Completion {
        if seq != self.issued {
            tracing::debug!(seq, latest = self.issued, "discarding superseded listing response");
            return Completion::Discarded;
        }

        self.status = FetchStatus::Idle;
        match result {
            Ok(page) => {
                self.items = page.items;
                self.pagination = page.pagination;
                self.error = None;
                Completion::Applied
            }
            Err(e) => {
                tracing::warn!("listing request failed: {}", e);
                self.error = Some(e.user_message(LIST_ERROR));
                Completion::Failed
            }
        }
    }

    pub async fn run(&mut self, pending: PendingFetch) -> Completion {
        let result = self.api.list(&pending.query).await;
        self.complete_fetch(pending.seq, result)
    }
}

// The browser drives the synchronous transitions itself; these wrap
// transition, request and completion into one call.
#[allow(dead_code)]
impl<A: GalleryApi> GalleryController<A> {
    pub async fn fetch(&mut self) -> Completion {
        let pending = self.begin_fetch();
        self.run(pending).await
    }

    pub async fn set_filters(&mut self, filters: FilterCriteria) -> Completion {
        let pending = self.request_filters(filters);
        self.run(pending).await
    }

    pub async fn clear_filters(&mut self) -> Completion {
        self.set_filters(FilterCriteria::default()).await
    }

    pub async fn set_page(&mut self, page: u32) -> Completion {
        let pending = self.request_page(page);
        self.run(pending).await
    }

    /// `None` when the "Next" control is disabled.
    pub async fn next_page(&mut self) -> Option<Completion> {
        if !self.pagination.has_next() {
            return None;
        }
        Some(self.set_page(self.pagination.page + 1).await)
    }

    /// `None` when the "Previous" control is disabled.
    pub async fn prev_page(&mut self) -> Option<Completion> {
        if !self.pagination.has_previous() {
            return None;
        }
        Some(self.set_page(self.pagination.page - 1).await)
    }

    pub async fn retry(&mut self) -> Completion {
        let pending = self.request_retry();
        self.run(pending).await
    }
}

impl<A: GalleryApi> GalleryController<A> {
    // ------------------------------------------------------------------------
    // View derivation
    // ------------------------------------------------------------------------

    pub fn pager(&self) -> Option<Pager> {
        let p = &self.pagination;
        p.shows_controls().then(|| Pager {
            page: p.page,
            total_pages: p.total_pages,
            previous_enabled: p.has_previous(),
            next_enabled: p.has_next(),
        })
    }

    pub fn view(&self) -> GalleryView<'_> {
        let loading = self.status == FetchStatus::Loading;
        if loading && self.items.is_empty() {
            return GalleryView::Spinner;
        }
        if let (false, Some(message)) = (loading, self.error.as_deref()) {
            return GalleryView::Error { message };
        }
        if self.items.is_empty() {
            return GalleryView::Empty;
        }
        GalleryView::Grid {
            items: &self.items,
            pager: self.pager(),
            stale: loading,
        }
    }
}
