//! Realtime events: what gets pushed to connected viewers and the pub/sub
//! mechanics that carry it.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod topic;

pub use bus::{EventBus, Subscription};
pub use envelope::ChannelMessage;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use topic::{Topic, TopicKind};
