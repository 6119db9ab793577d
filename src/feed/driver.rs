use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::controller::{FeedController, FeedSnapshot, FetchRequest, Trigger};
use crate::api::{CatalogClient, FetchError, Page};
use crate::query::QueryModel;

/// Completed fetch, still tagged with the request that produced it.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub request: FetchRequest,
    pub result: Result<Page<T>, FetchError>,
}

impl<T> FetchOutcome<T> {
    pub fn into_trigger(self) -> Trigger<T> {
        let generation = self.request.generation;
        match self.result {
            Ok(page) => Trigger::PageArrived { generation, page },
            Err(error) => Trigger::PageFailed { generation, error },
        }
    }
}

/// Runs a [`FeedController`] against a [`CatalogClient`].
///
/// Each request the controller issues is spawned onto the runtime; the
/// completion comes back through a channel and is applied on the caller's
/// task, so the controller is only ever touched from one place. Nothing is
/// cancelled: completions from superseded generations are dropped when they
/// are applied.
pub struct FeedDriver<C: CatalogClient> {
    client: Arc<C>,
    controller: FeedController<C::Item>,
    result_tx: mpsc::Sender<FetchOutcome<C::Item>>,
    result_rx: mpsc::Receiver<FetchOutcome<C::Item>>,
}

impl<C: CatalogClient> FeedDriver<C> {
    /// Mounts the feed and spawns its first fetch. Must be called within a
    /// tokio runtime.
    pub fn mount(client: Arc<C>, query: QueryModel, page_length: usize) -> (Self, FetchRequest) {
        let (result_tx, result_rx) = mpsc::channel(16);
        let (controller, request) = FeedController::mount(query, page_length);
        let driver = Self {
            client,
            controller,
            result_tx,
            result_rx,
        };
        driver.spawn_fetch(request.clone());
        (driver, request)
    }

    pub fn controller(&self) -> &FeedController<C::Item> {
        &self.controller
    }

    pub fn snapshot(&self) -> FeedSnapshot<C::Item> {
        self.controller.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot<C::Item>> {
        self.controller.subscribe()
    }

    /// Applies a trigger and spawns whatever fetch it calls for.
    pub fn dispatch(&mut self, trigger: Trigger<C::Item>) -> Option<FetchRequest> {
        let request = self.controller.handle(trigger)?;
        self.spawn_fetch(request.clone());
        Some(request)
    }

    pub fn set_query(&mut self, query: QueryModel) -> Option<FetchRequest> {
        let request = self.controller.set_query(query)?;
        self.spawn_fetch(request.clone());
        Some(request)
    }

    /// Next completed fetch, if one is waiting.
    pub fn try_next_outcome(&mut self) -> Option<FetchOutcome<C::Item>> {
        self.result_rx.try_recv().ok()
    }

    /// Waits for the next completed fetch.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome<C::Item>> {
        self.result_rx.recv().await
    }

    pub fn apply(&mut self, outcome: FetchOutcome<C::Item>) -> Option<FetchRequest> {
        self.dispatch(outcome.into_trigger())
    }

    /// Applies every completion that has already arrived.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.try_next_outcome() {
            self.apply(outcome);
            applied += 1;
        }
        applied
    }

    /// Waits until the current generation has nothing in flight.
    pub async fn settle(&mut self) {
        while self.controller.state().in_flight.is_some() {
            let Some(outcome) = self.next_outcome().await else {
                return;
            };
            self.apply(outcome);
        }
    }

    fn spawn_fetch(&self, request: FetchRequest) {
        let client = Arc::clone(&self.client);
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = client
                .fetch_page(&request.query, request.offset, request.limit)
                .await;
            let _ = tx.send(FetchOutcome { request, result }).await;
        });
    }
}
