pub mod event;
pub mod event_type;
pub mod media;
pub mod overtime;
pub mod user;

pub use event::{ActivityEvent, PendingAlert};
pub use event_type::EventType;
pub use media::{MediaAsset, MediaKind};
pub use overtime::OvertimeRecord;
pub use user::{NewUser, Role, User, UserStatus, UserUpdate};
