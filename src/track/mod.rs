//! Track metadata module.
//!
//! A **track record** is the metadata attached to one embedding vector at
//! insertion time. Records live in a collection parallel to the vectors,
//! aligned by position, so the nearest-neighbor structure never depends on
//! the metadata schema.
//!
//! # Operations
//!
//! Records are appended through [`Index::add`](crate::Index::add) and read
//! back with [`Index::record`](crate::Index::record). They are immutable
//! once stored.

pub mod types;

pub use types::TrackRecord;
