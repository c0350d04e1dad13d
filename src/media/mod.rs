//! Media store collaborator: where screenshot and recording files live and
//! how their stored URLs map back to disk.

pub mod path;
pub mod store;

pub use path::{PathRejected, resolve_media_path};
pub use store::{LocalMediaStore, MediaStore};
