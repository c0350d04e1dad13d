pub mod notify;
pub mod overtime;
pub mod provisioning;
pub mod retention;
pub mod status;
pub mod summary;

pub use notify::{DispatchReport, Dispatcher};
pub use retention::{PurgeReport, RetentionPurge, TablePurge};
pub use status::StatusTracker;
pub use summary::ActivitySummary;
