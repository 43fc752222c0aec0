//! Discussion module.
//!
//! Per-inventory message threads, the realtime events they emit, the
//! presence roster of current viewers and unsent drafts. Pure domain logic;
//! storage and delivery live in infra.

pub mod draft;
pub mod events;
pub mod message;
pub mod presence;
pub mod thread;

pub use draft::{Draft, DraftBook};
pub use events::{DiscussionEvent, PresenceEvent};
pub use message::{DiscussionMessage, MAX_MESSAGE_LENGTH, NewMessage};
pub use presence::{PresenceRoster, Viewer};
pub use thread::{AuthorSummary, ThreadEntry, assemble_thread};
