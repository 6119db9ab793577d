mod controller;
mod driver;

pub use controller::{FeedSnapshot, FeedStatus, FetchRequest, Trigger};
pub use driver::{FeedDriver, FetchOutcome};
