pub mod date;
pub mod path;
pub mod time;

pub use time::secs2readable;
