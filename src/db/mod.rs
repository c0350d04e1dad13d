pub mod events;
pub mod handle;
pub mod initialize;
pub mod log;
pub mod media;
pub mod migrate;
pub mod overtime;
pub mod purge;
pub mod stats;
pub mod users;

pub use handle::DbHandle;
pub use initialize::init_db;
