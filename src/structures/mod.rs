//! Cached entity structures.
//!
//! Each submodule holds one entity kind: its hydration from a raw wire
//! payload, its partial-merge rules, its snapshot, and the outbound actions
//! it delegates to the transport. Cross-entity references are held as IDs (or
//! shared handles produced by registry lookups), never as owning edges
//! between containers.

pub mod attachment;
pub mod channel;
pub mod guild;
pub mod interaction;
pub mod member;
pub mod message;
pub mod user;

pub use attachment::Attachment;
pub use channel::{Channel, PrivateChannel, TextChannel, ThreadChannel, UncachedChannel};
pub use guild::Guild;
pub use interaction::{ComponentInteraction, ComponentInteractionData, InteractionContext};
pub use member::Member;
pub use message::{
    Message, MessageApplication, MessageInteraction, MessageMentions, MessageReaction,
    MessageReference,
};
pub use user::User;

use crate::client::WeakClient;
use crate::wire::Snowflake;

bitflags::bitflags! {
    /// Message flags, kept verbatim from the wire (unknown bits retained).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MessageFlags: u64 {
        const CROSSPOSTED = 1;
        const IS_CROSSPOST = 1 << 1;
        const SUPPRESS_EMBEDS = 1 << 2;
        const SOURCE_MESSAGE_DELETED = 1 << 3;
        const URGENT = 1 << 4;
        const HAS_THREAD = 1 << 5;
        const EPHEMERAL = 1 << 6;
        const LOADING = 1 << 7;
        const FAILED_TO_MENTION_SOME_ROLES_IN_THREAD = 1 << 8;
        const _ = !0;
    }
}

/// The lifecycle contract every cached entity implements.
///
/// An entity has an immutable ID fixed at hydration, merges later partial
/// payloads into itself via [`Entity::update`] (absent fields are left
/// untouched), and can snapshot itself as plain JSON. The ID is the identity:
/// a [`Collection`] never holds two entities with the same ID, and an update
/// mutates the existing entity rather than replacing it.
///
/// [`Collection`]: crate::collection::Collection
pub trait Entity {
    /// The raw wire-shape payload this entity is built from.
    type Raw;

    /// The identity field of a raw payload.
    fn raw_id(data: &Self::Raw) -> &str;

    /// The entity's immutable ID.
    fn id(&self) -> &Snowflake;

    /// Fully construct the entity from a complete payload.
    fn hydrate(data: &Self::Raw, client: WeakClient) -> Self;

    /// Merge a partial payload into the live entity.
    fn update(&mut self, data: &Self::Raw);

    /// A plain, acyclic snapshot: entity references are flattened to IDs
    /// except where a field is documented as embedding a child snapshot.
    fn serialize(&self) -> serde_json::Value;
}
