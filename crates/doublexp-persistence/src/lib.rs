//! Persistence layer for Double XP alerts.
//!
//! This crate stores the set of subscribed chats. The JSON-backed store
//! survives restarts and writes through atomic file operations (write to a
//! temp file, then rename).
//!
//! # Example
//!
//! ```no_run
//! use doublexp_models::SubscriberId;
//! use doublexp_persistence::{JsonSubscriberStore, SubscriberStore};
//!
//! # async fn demo() -> doublexp_persistence::Result<()> {
//! let store = JsonSubscriberStore::open("/var/lib/doublexp-alerts")?;
//! store.add(SubscriberId(123456)).await?;
//!
//! for id in store.list_all().await? {
//!     println!("subscriber {}", id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod error;
pub mod subscriber_store;

pub use error::{PersistenceError, Result};
pub use subscriber_store::{
    AddOutcome, JsonSubscriberStore, MemorySubscriberStore, SubscriberRecord, SubscriberStore,
    SUBSCRIBERS_FILE,
};
