use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};

use crate::api::{CatalogBackend, Category, FetchError, Product};
use crate::feed::{FeedDriver, FeedSnapshot, FeedStatus, FetchOutcome, FetchRequest, Trigger};
use crate::query::{QueryModel, SortDirection, SortField, sort_loaded};
use crate::scroll::ScrollProximityDetector;
use crate::settings::{Settings, SortPlacement};
use crate::viewport::ViewportSampler;

pub enum AsyncResult {
    Categories {
        task_id: u64,
        result: Result<Vec<Category>, FetchError>,
    },
}

#[derive(Debug)]
pub struct TaskInfo {
    pub id: u64,
    pub description: String,
    pub started_at: Instant,
}

#[derive(Debug)]
pub struct LogEntry {
    pub message: String,
}

/// Debug panel state: task tracking and log messages.
#[derive(Debug, Default)]
pub struct DebugState {
    pub visible: bool,
    pub running_tasks: Vec<TaskInfo>,
    pub log: VecDeque<LogEntry>,
    next_task_id: u64,
}

impl DebugState {
    const MAX_LOG_ENTRIES: usize = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.log.push_back(LogEntry {
            message: msg.into(),
        });
        if self.log.len() > Self::MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
    }

    pub fn start_task(&mut self, description: impl Into<String>) -> u64 {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let desc = description.into();
        self.log(format!("Started: {}", desc));
        self.running_tasks.push(TaskInfo {
            id,
            description: desc,
            started_at: Instant::now(),
        });
        id
    }

    pub fn end_task(&mut self, id: u64, outcome: &str) {
        if let Some(pos) = self.running_tasks.iter().position(|t| t.id == id) {
            let task = self.running_tasks.remove(pos);
            let elapsed = task.started_at.elapsed();
            self.log(format!("{} {}: {:.2?}", task.description, outcome, elapsed));
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

/// Converts terminal cells into the logical units the sampler and
/// detector work in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellScale {
    pub width: f64,
    pub height: f64,
}

impl CellScale {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            width: settings.cell_width,
            height: settings.cell_height,
        }
    }
}

/// Search text being typed; applied only on submit.
#[derive(Debug, Default)]
pub struct SearchInput {
    pub editing: bool,
    pub buffer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    SelectNext,
    SelectPrev,
    SelectFirst,
    SelectLast,
    PageDown,
    PageUp,
    ToggleSort,
    NextCategory,
    PrevCategory,
    StartSearch,
    SearchChar(char),
    SearchBackspace,
    SubmitSearch,
    CancelSearch,
    Retry,
    Restart,
    ToggleDebug,
    Quit,
    Resize { width: u16, height: u16 },
}

pub struct App<C: CatalogBackend> {
    pub client: Arc<C>,
    pub feed: FeedDriver<C>,
    snapshots: watch::Receiver<FeedSnapshot<Product>>,
    pub sampler: ViewportSampler,
    pub detector: ScrollProximityDetector,
    pub scale: CellScale,
    pub sort_placement: SortPlacement,
    /// Display order when sorting on the client.
    pub display_sort: SortDirection,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub viewport: (u16, u16),
    pub categories: Vec<Category>,
    /// Index into `categories`; `None` shows every category.
    pub category_index: Option<usize>,
    pub search: SearchInput,
    pub should_quit: bool,
    pub debug: DebugState,
    fetch_tasks: HashMap<(u64, usize), u64>,
    pub result_tx: mpsc::Sender<AsyncResult>,
    pub result_rx: mpsc::Receiver<AsyncResult>,
}

impl<C: CatalogBackend> App<C> {
    /// Layout rows not available to the list: header, status bar, borders.
    pub const LAYOUT_OVERHEAD: u16 = 4;
    /// Rows per rendered product.
    pub const ITEM_LINES: u16 = 2;
    pub const DEBUG_PANE_HEIGHT: u16 = 10;

    /// Mounts the feed for `query` sized to a `width`x`height` terminal.
    pub fn new(
        client: Arc<C>,
        settings: &Settings,
        query: QueryModel,
        width: u16,
        height: u16,
    ) -> Self {
        let (result_tx, result_rx) = mpsc::channel(10);
        let sampler = settings.sampler();
        let scale = CellScale::from_settings(settings);
        let display_sort = query.sort_direction;
        let page_length = sampler.sample(
            f64::from(width) * scale.width,
            f64::from(height) * scale.height,
        );
        let (feed, first) = FeedDriver::mount(Arc::clone(&client), query, page_length);
        let snapshots = feed.subscribe();

        let mut app = Self {
            client,
            feed,
            snapshots,
            sampler,
            detector: settings.detector(),
            scale,
            sort_placement: settings.sort_placement,
            display_sort,
            selected_index: 0,
            scroll_offset: 0,
            viewport: (width, height),
            categories: Vec::new(),
            category_index: None,
            search: SearchInput::default(),
            should_quit: false,
            debug: DebugState::new(),
            fetch_tasks: HashMap::new(),
            result_tx,
            result_rx,
        };
        app.track_fetch(&first);
        app
    }

    pub fn query(&self) -> &QueryModel {
        self.feed.controller().query()
    }

    pub fn status(&self) -> FeedStatus {
        self.feed.controller().status()
    }

    /// Latest snapshot published by the feed; what the views draw from.
    pub fn snapshot(&self) -> FeedSnapshot<Product> {
        self.snapshots.borrow().clone()
    }

    /// Loaded products in display order.
    pub fn visible_items(&self) -> Vec<&Product> {
        let items = self.feed.controller().items();
        match self.sort_placement {
            SortPlacement::Server => items.iter().collect(),
            SortPlacement::Client => sort_loaded(items, self.display_sort),
        }
    }

    pub fn sort_direction(&self) -> SortDirection {
        match self.sort_placement {
            SortPlacement::Server => self.query().sort_direction,
            SortPlacement::Client => self.display_sort,
        }
    }

    pub fn active_category(&self) -> Option<&Category> {
        self.category_index.and_then(|i| self.categories.get(i))
    }

    pub fn load_categories(&mut self) {
        let client = Arc::clone(&self.client);
        let tx = self.result_tx.clone();
        let task_id = self.debug.start_task("Load categories");
        tokio::spawn(async move {
            let result = client.fetch_categories().await;
            let _ = tx.send(AsyncResult::Categories { task_id, result }).await;
        });
    }

    /// Drains finished fetches and applies them to the feed.
    pub fn poll_async(&mut self) {
        while let Some(outcome) = self.feed.try_next_outcome() {
            self.handle_outcome(outcome);
        }
        while let Ok(result) = self.result_rx.try_recv() {
            self.handle_async_result(result);
        }
    }

    pub fn handle_outcome(&mut self, outcome: FetchOutcome<Product>) {
        let request = &outcome.request;
        let stale = request.generation != self.feed.controller().generation();
        let label = match (&outcome.result, stale) {
            (_, true) => "discarded (stale)",
            (Ok(_), false) => "completed",
            (Err(_), false) => "failed",
        };
        if let Some(task_id) = self
            .fetch_tasks
            .remove(&(request.generation, request.offset))
        {
            self.debug.end_task(task_id, label);
        }
        if let Err(e) = &outcome.result
            && !stale
        {
            self.debug.log(format!("Error: {}", e.user_message()));
        }
        self.feed.apply(outcome);
        self.clamp_selection();
    }

    pub fn handle_async_result(&mut self, result: AsyncResult) {
        match result {
            AsyncResult::Categories { task_id, result } => match result {
                Ok(categories) => {
                    self.debug.end_task(task_id, "completed");
                    self.categories = categories;
                    self.category_index = self.category_index_for_query();
                }
                Err(e) => {
                    self.debug.end_task(task_id, "failed");
                    self.debug.log(format!("Categories unavailable: {e}"));
                }
            },
        }
    }

    /// Raises a near-end trigger if the visible window is close to the
    /// bottom of what is loaded.
    pub fn check_near_end(&mut self, now: Instant) {
        let rows = f64::from(self.list_rows()) * self.scale.height;
        let position = (self.scroll_offset * Self::ITEM_LINES as usize) as f64 * self.scale.height;
        let content = (self.feed.controller().items().len() * Self::ITEM_LINES as usize) as f64
            * self.scale.height;
        if self.detector.observe(position, rows, content, now) {
            self.dispatch(Trigger::NearEndReached);
        }
    }

    pub fn update(&mut self, msg: Message) {
        if self.search.editing {
            match msg {
                Message::SearchChar(c) => self.search.buffer.push(c),
                Message::SearchBackspace => {
                    self.search.buffer.pop();
                }
                Message::SubmitSearch => self.submit_search(),
                Message::CancelSearch => {
                    self.search.editing = false;
                    self.search.buffer.clear();
                }
                Message::Resize { width, height } => self.resize(width, height),
                Message::Quit => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match msg {
            Message::SelectNext => self.select_next(),
            Message::SelectPrev => self.select_prev(),
            Message::SelectFirst => self.select_first(),
            Message::SelectLast => self.select_last(),
            Message::PageDown => self.page_down(),
            Message::PageUp => self.page_up(),
            Message::ToggleSort => self.toggle_sort(),
            Message::NextCategory => self.cycle_category(1),
            Message::PrevCategory => self.cycle_category(-1),
            Message::StartSearch => {
                self.search.editing = true;
                self.search.buffer = self.query().search_text.clone().unwrap_or_default();
            }
            Message::Retry => {
                self.dispatch(Trigger::Retry);
            }
            Message::Restart => {
                let query = self.query().clone();
                self.dispatch(Trigger::QueryChanged(query));
            }
            Message::ToggleDebug => self.debug.toggle(),
            Message::Quit => self.should_quit = true,
            Message::Resize { width, height } => self.resize(width, height),
            Message::SearchChar(_)
            | Message::SearchBackspace
            | Message::SubmitSearch
            | Message::CancelSearch => {}
        }
    }

    fn dispatch(&mut self, trigger: Trigger<Product>) {
        let resets = matches!(trigger, Trigger::QueryChanged(_));
        if let Some(request) = self.feed.dispatch(trigger) {
            self.track_fetch(&request);
        }
        if resets {
            self.reset_selection();
        }
    }

    fn change_query(&mut self, query: QueryModel) {
        if let Some(request) = self.feed.set_query(query) {
            self.track_fetch(&request);
            self.reset_selection();
        }
    }

    fn track_fetch(&mut self, request: &FetchRequest) {
        let desc = format!(
            "Fetch g{} [{}..{})",
            request.generation,
            request.offset,
            request.offset.saturating_add(request.limit)
        );
        let task_id = self.debug.start_task(desc);
        self.fetch_tasks
            .insert((request.generation, request.offset), task_id);
    }

    fn reset_selection(&mut self) {
        self.selected_index = 0;
        self.scroll_offset = 0;
        self.detector.reset();
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.viewport = (width, height);
        let page_length = self.sampler.sample(
            f64::from(width) * self.scale.width,
            f64::from(height) * self.scale.height,
        );
        self.dispatch(Trigger::ViewportChanged(page_length));
        self.clamp_selection();
    }

    fn toggle_sort(&mut self) {
        match self.sort_placement {
            SortPlacement::Server => {
                let direction = self.query().sort_direction.toggled();
                let query = self.query().clone().with_sort(SortField::Price, direction);
                self.change_query(query);
            }
            SortPlacement::Client => {
                self.display_sort = self.display_sort.toggled();
                self.selected_index = 0;
                self.scroll_offset = 0;
            }
        }
    }

    fn cycle_category(&mut self, direction: i32) {
        if self.categories.is_empty() {
            return;
        }
        // Position 0 is "all", 1..=len are the categories.
        let slots = self.categories.len() as i32 + 1;
        let current = self.category_index.map(|i| i as i32 + 1).unwrap_or(0);
        let next = (current + direction).rem_euclid(slots);
        self.category_index = if next == 0 {
            None
        } else {
            Some(next as usize - 1)
        };
        let ids = self
            .active_category()
            .map(Category::subtree_ids)
            .unwrap_or_default();
        let query = self.query().clone().with_categories(ids);
        self.change_query(query);
    }

    fn category_index_for_query(&self) -> Option<usize> {
        let active = &self.query().category_ids;
        if active.is_empty() {
            return None;
        }
        self.categories.iter().position(|c| {
            let mut ids = c.subtree_ids();
            ids.sort_unstable();
            ids.dedup();
            ids.len() == active.len() && ids.iter().all(|id| active.contains(id))
        })
    }

    fn submit_search(&mut self) {
        self.search.editing = false;
        let text = std::mem::take(&mut self.search.buffer);
        let query = self.query().clone().with_search(text);
        self.change_query(query);
    }

    pub fn list_rows(&self) -> u16 {
        let debug = if self.debug.visible {
            Self::DEBUG_PANE_HEIGHT
        } else {
            0
        };
        self.viewport
            .1
            .saturating_sub(Self::LAYOUT_OVERHEAD + debug)
    }

    pub fn visible_capacity(&self) -> usize {
        (self.list_rows() / Self::ITEM_LINES).max(1) as usize
    }

    fn item_count(&self) -> usize {
        self.feed.controller().items().len()
    }

    fn select_next(&mut self) {
        let count = self.item_count();
        if count > 0 && self.selected_index < count - 1 {
            self.selected_index += 1;
        }
        self.follow_selection();
    }

    fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
        self.follow_selection();
    }

    fn select_first(&mut self) {
        self.selected_index = 0;
        self.scroll_offset = 0;
    }

    fn select_last(&mut self) {
        let count = self.item_count();
        if count > 0 {
            self.selected_index = count - 1;
        }
        self.follow_selection();
    }

    fn page_down(&mut self) {
        let count = self.item_count();
        if count > 0 {
            self.selected_index = (self.selected_index + self.visible_capacity()).min(count - 1);
        }
        self.follow_selection();
    }

    fn page_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(self.visible_capacity());
        self.follow_selection();
    }

    /// Scrolls so the selected item is inside the visible window.
    fn follow_selection(&mut self) {
        let capacity = self.visible_capacity();
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + capacity {
            self.scroll_offset = self.selected_index + 1 - capacity;
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.item_count();
        if count == 0 {
            self.selected_index = 0;
            self.scroll_offset = 0;
            return;
        }
        self.selected_index = self.selected_index.min(count - 1);
        self.scroll_offset = self.scroll_offset.min(self.selected_index);
        self.follow_selection();
    }
}
