use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{FetchError, Page};
use crate::query::{QueryModel, equals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Idle,
    LoadingInitial,
    LoadingMore,
    Error,
}

impl FeedStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedStatus::LoadingInitial | FeedStatus::LoadingMore)
    }
}

/// One page request, tagged with the generation that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub generation: u64,
    pub query: QueryModel,
    pub offset: usize,
    pub limit: usize,
}

/// Inputs to the feed state machine.
#[derive(Debug)]
pub enum Trigger<T> {
    QueryChanged(QueryModel),
    ViewportChanged(usize),
    NearEndReached,
    Retry,
    PageArrived { generation: u64, page: Page<T> },
    PageFailed { generation: u64, error: FetchError },
}

/// State owned by the controller. Consumers only ever see it through a
/// shared reference or a [`FeedSnapshot`].
#[derive(Debug, Clone)]
pub struct FeedState<T> {
    pub items: Arc<Vec<T>>,
    /// Next read position; equals `items.len()` after every merge.
    pub offset: usize,
    /// Limit for the next request. An in-flight request keeps its own.
    pub page_length: usize,
    pub has_more: bool,
    pub status: FeedStatus,
    pub generation: u64,
    pub last_error: Option<FetchError>,
    pub in_flight: Option<FetchRequest>,
    failed: Option<FetchRequest>,
}

impl<T> FeedState<T> {
    fn new(page_length: usize) -> Self {
        Self {
            items: Arc::new(Vec::new()),
            offset: 0,
            page_length: page_length.max(1),
            has_more: true,
            status: FeedStatus::Idle,
            generation: 0,
            last_error: None,
            in_flight: None,
            failed: None,
        }
    }
}

/// Read-only view published after every transition.
#[derive(Debug, Clone)]
pub struct FeedSnapshot<T> {
    pub items: Arc<Vec<T>>,
    pub status: FeedStatus,
    pub has_more: bool,
    pub last_error: Option<FetchError>,
    pub generation: u64,
    pub offset: usize,
    pub page_length: usize,
}

enum Step {
    Ignored,
    Updated,
    Fetch(FetchRequest),
}

/// Paged retrieval of a filterable, sortable collection.
///
/// All mutation goes through [`FeedController::handle`]. Responses are
/// matched to the current generation and in-flight request; anything else
/// is stale and dropped without touching state. At most one request is
/// outstanding at a time.
pub struct FeedController<T> {
    query: QueryModel,
    state: FeedState<T>,
    snapshots: watch::Sender<FeedSnapshot<T>>,
}

impl<T: Clone> FeedController<T> {
    /// Creates the feed and issues its first page request.
    pub fn mount(query: QueryModel, page_length: usize) -> (Self, FetchRequest) {
        let state = FeedState::new(page_length);
        let (snapshots, _) = watch::channel(Self::snapshot_of(&state));
        let mut controller = Self {
            query: query.clone(),
            state,
            snapshots,
        };
        let request = controller.reset(query);
        controller.emit();
        (controller, request)
    }

    pub fn query(&self) -> &QueryModel {
        &self.query
    }

    pub fn state(&self) -> &FeedState<T> {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn status(&self) -> FeedStatus {
        self.state.status
    }

    pub fn items(&self) -> &[T] {
        &self.state.items
    }

    pub fn snapshot(&self) -> FeedSnapshot<T> {
        Self::snapshot_of(&self.state)
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot<T>> {
        self.snapshots.subscribe()
    }

    /// Resets only if `query` differs structurally from the active one.
    pub fn set_query(&mut self, query: QueryModel) -> Option<FetchRequest> {
        if equals(&self.query, &query) {
            return None;
        }
        self.handle(Trigger::QueryChanged(query))
    }

    /// Applies a trigger, returning the fetch the caller must perform, if any.
    pub fn handle(&mut self, trigger: Trigger<T>) -> Option<FetchRequest> {
        let step = match trigger {
            Trigger::QueryChanged(query) => Step::Fetch(self.reset(query)),
            Trigger::ViewportChanged(page_length) => self.viewport_changed(page_length),
            Trigger::NearEndReached => self.near_end(),
            Trigger::Retry => self.retry(),
            Trigger::PageArrived { generation, page } => self.page_arrived(generation, page),
            Trigger::PageFailed { generation, error } => self.page_failed(generation, error),
        };

        match step {
            Step::Ignored => None,
            Step::Updated => {
                self.emit();
                None
            }
            Step::Fetch(request) => {
                self.emit();
                Some(request)
            }
        }
    }

    fn reset(&mut self, query: QueryModel) -> FetchRequest {
        self.query = query;
        let state = &mut self.state;
        state.generation += 1;
        state.items = Arc::new(Vec::new());
        state.offset = 0;
        state.has_more = true;
        state.last_error = None;
        state.failed = None;
        tracing::debug!(generation = state.generation, "feed reset");
        self.issue(FeedStatus::LoadingInitial)
    }

    fn issue(&mut self, status: FeedStatus) -> FetchRequest {
        let request = FetchRequest {
            generation: self.state.generation,
            query: self.query.clone(),
            offset: self.state.offset,
            limit: self.state.page_length,
        };
        tracing::debug!(
            generation = request.generation,
            offset = request.offset,
            limit = request.limit,
            ?status,
            "issuing page request"
        );
        self.state.status = status;
        self.state.in_flight = Some(request.clone());
        request
    }

    fn viewport_changed(&mut self, page_length: usize) -> Step {
        let page_length = page_length.max(1);
        if page_length == self.state.page_length {
            return Step::Ignored;
        }
        tracing::debug!(
            from = self.state.page_length,
            to = page_length,
            "page length changed"
        );
        self.state.page_length = page_length;
        Step::Updated
    }

    fn near_end(&mut self) -> Step {
        let state = &self.state;
        if state.status != FeedStatus::Idle || !state.has_more || state.in_flight.is_some() {
            tracing::trace!(status = ?state.status, has_more = state.has_more, "near end suppressed");
            return Step::Ignored;
        }
        Step::Fetch(self.issue(FeedStatus::LoadingMore))
    }

    fn retry(&mut self) -> Step {
        if self.state.status != FeedStatus::Error {
            return Step::Ignored;
        }
        let Some(request) = self.state.failed.take() else {
            return Step::Ignored;
        };
        let status = if request.offset == 0 {
            FeedStatus::LoadingInitial
        } else {
            FeedStatus::LoadingMore
        };
        tracing::debug!(
            generation = request.generation,
            offset = request.offset,
            limit = request.limit,
            "retrying page request"
        );
        self.state.status = status;
        self.state.last_error = None;
        self.state.in_flight = Some(request.clone());
        Step::Fetch(request)
    }

    /// Takes the in-flight request if a response for `generation` and
    /// `offset` answers it.
    fn claim(&mut self, generation: u64, offset: Option<usize>) -> Option<FetchRequest> {
        if generation != self.state.generation {
            tracing::debug!(
                generation,
                current = self.state.generation,
                "discarded stale response"
            );
            return None;
        }
        let answers = self
            .state
            .in_flight
            .as_ref()
            .is_some_and(|request| offset.is_none_or(|o| o == request.offset));
        if !answers {
            tracing::debug!(generation, ?offset, "discarded unmatched response");
            return None;
        }
        self.state.in_flight.take()
    }

    fn page_arrived(&mut self, generation: u64, page: Page<T>) -> Step {
        if self.claim(generation, Some(page.requested_offset)).is_none() {
            return Step::Ignored;
        }
        let received = page.items.len();
        let state = &mut self.state;
        Arc::make_mut(&mut state.items).extend(page.items);
        state.offset += received;
        state.has_more = received >= page.requested_limit;
        state.status = FeedStatus::Idle;
        state.last_error = None;
        tracing::debug!(
            generation,
            received,
            offset = state.offset,
            has_more = state.has_more,
            "page merged"
        );
        Step::Updated
    }

    fn page_failed(&mut self, generation: u64, error: FetchError) -> Step {
        let Some(request) = self.claim(generation, None) else {
            return Step::Ignored;
        };
        tracing::warn!(generation, offset = request.offset, %error, "page request failed");
        self.state.status = FeedStatus::Error;
        self.state.last_error = Some(error);
        self.state.failed = Some(request);
        Step::Updated
    }

    fn emit(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn snapshot_of(state: &FeedState<T>) -> FeedSnapshot<T> {
        FeedSnapshot {
            items: Arc::clone(&state.items),
            status: state.status,
            has_more: state.has_more,
            last_error: state.last_error.clone(),
            generation: state.generation,
            offset: state.offset,
            page_length: state.page_length,
        }
    }
}
