//! Flag moderation workflow as seen by an admin client.

pub mod controller;
pub mod detail;
pub mod filter;
pub mod notify;

pub use controller::{FlagReviewController, ReviewError, ReviewView};
pub use filter::{FlagStats, StatusCounts, StatusFilter};
pub use notify::{AdminIdentity, Notice, NoticeKind, Notifier, StaticAdmin};
