//! Embeddable tracking client for the feedpulse analytics API.
//!
//! A [`Tracker`] owns the durable visitor identity, the lazily
//! registered session and the HTTP transport. Feed surfaces emit
//! events through it without blocking on the network.

pub mod emitter;
pub mod error;
pub mod identity;
pub mod scroll;
pub mod session;

pub use emitter::{InteractionEvent, PostRef, PostViewEvent, Tracker, TrackerConfig};
pub use error::TrackerError;
pub use identity::IdentityStore;
pub use scroll::{FlushTrigger, MaxScrollTracker};
pub use session::SessionContext;
