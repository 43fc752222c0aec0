use chrono::{DateTime, Utc};

/// A realtime event pushed to subscribers of a topic.
///
/// Events are facts: they describe something that already happened and are
/// never mutated after publication.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "discussion.message_posted").
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn occurred_at(&self) -> DateTime<Utc>;
}
