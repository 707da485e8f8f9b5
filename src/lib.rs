//! An in-memory entity cache for a Discord client.
//!
//! Payloads from the gateway and REST responses are merged into a live object
//! graph: a [`Client`] owns registries of users, guilds, and DM channels;
//! guilds own their channels, threads, and members; channels own their
//! messages. Entities are shared handles ([`Shared`]), so two lookups of the
//! same ID observe the same object, and a partial payload mutates the cached
//! entity in place rather than replacing it.
//!
//! The cache is single-threaded and does no I/O of its own. Outbound entity
//! actions delegate to a [`Rest`] transport supplied at construction; their
//! results only enter the cache when fed back through the update path.
//!
//! [`Rest`]: crate::rest::Rest

pub mod client;
pub mod collection;
pub mod error;
pub mod rest;
pub mod structures;
pub mod util;
pub mod wire;

pub use client::{Client, WeakClient};
pub use collection::{Collection, Shared};
pub use error::{Error, ErrorType};
pub use wire::Snowflake;
