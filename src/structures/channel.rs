//! Channels.
//!
//! One enum covers the variants this cache distinguishes: guild text-like
//! channels (which own message and thread containers), threads, DM channels,
//! and a stub for types the cache has no richer shape for. A payload whose
//! type moved a channel between variants re-hydrates the variant in place,
//! so the shared handle (and therefore identity) survives.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use crate::client::{Client, WeakClient};
use crate::collection::{Collection, Shared};
use crate::structures::user::resolve_user;
use crate::structures::{Entity, Message, User};
use crate::wire::{ChannelType, RawChannel, Snowflake};

pub enum Channel {
    Text(TextChannel),
    Thread(ThreadChannel),
    Private(PrivateChannel),
    Uncached(UncachedChannel),
}

/// A guild text or announcement channel.
pub struct TextChannel {
    client: WeakClient,
    id: Snowflake,
    pub kind: ChannelType,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: Option<i32>,
    pub parent_id: Option<Snowflake>,
    pub nsfw: bool,
    pub last_message_id: Option<Snowflake>,
    pub rate_limit_per_user: Option<u32>,
    pub default_auto_archive_duration: Option<u32>,
    /// The messages seen in this channel.
    pub messages: Collection<Message>,
    /// The threads rooted in this channel.
    pub threads: Collection<Channel>,
}

/// A public, private, or announcement thread.
pub struct ThreadChannel {
    client: WeakClient,
    id: Snowflake,
    pub kind: ChannelType,
    pub guild_id: Option<Snowflake>,
    pub parent_id: Option<Snowflake>,
    pub name: Option<String>,
    pub owner_id: Option<Snowflake>,
    pub last_message_id: Option<Snowflake>,
    pub message_count: Option<u64>,
    pub member_count: Option<u64>,
    pub total_message_sent: Option<u64>,
    pub archived: bool,
    pub auto_archive_duration: Option<u32>,
    pub archive_timestamp: Option<DateTime<Utc>>,
    pub locked: bool,
    pub invitable: Option<bool>,
    pub messages: Collection<Message>,
}

/// A direct-message channel.
pub struct PrivateChannel {
    client: WeakClient,
    id: Snowflake,
    pub kind: ChannelType,
    pub last_message_id: Option<Snowflake>,
    pub recipient: Option<Shared<User>>,
    pub messages: Collection<Message>,
}

/// A channel type the cache keeps only an identity for.
pub struct UncachedChannel {
    client: WeakClient,
    id: Snowflake,
    pub kind: ChannelType,
}

impl Channel {
    pub fn id(&self) -> &Snowflake {
        match self {
            Self::Text(c) => &c.id,
            Self::Thread(c) => &c.id,
            Self::Private(c) => &c.id,
            Self::Uncached(c) => &c.id,
        }
    }

    pub fn kind(&self) -> ChannelType {
        match self {
            Self::Text(c) => c.kind,
            Self::Thread(c) => c.kind,
            Self::Private(c) => c.kind,
            Self::Uncached(c) => c.kind,
        }
    }

    pub fn guild_id(&self) -> Option<&Snowflake> {
        match self {
            Self::Text(c) => c.guild_id.as_ref(),
            Self::Thread(c) => c.guild_id.as_ref(),
            Self::Private(_) | Self::Uncached(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Text(c) => c.name.as_deref(),
            Self::Thread(c) => c.name.as_deref(),
            Self::Private(_) | Self::Uncached(_) => None,
        }
    }

    /// The channel's message container, when this variant owns one.
    pub fn messages(&self) -> Option<&Collection<Message>> {
        match self {
            Self::Text(c) => Some(&c.messages),
            Self::Thread(c) => Some(&c.messages),
            Self::Private(c) => Some(&c.messages),
            Self::Uncached(_) => None,
        }
    }

    /// The channel's thread container, when this variant owns one.
    pub fn threads(&self) -> Option<&Collection<Channel>> {
        match self {
            Self::Text(c) => Some(&c.threads),
            _ => None,
        }
    }

    pub fn client(&self) -> Option<Client> {
        self.weak_client().upgrade()
    }

    fn weak_client(&self) -> &WeakClient {
        match self {
            Self::Text(c) => &c.client,
            Self::Thread(c) => &c.client,
            Self::Private(c) => &c.client,
            Self::Uncached(c) => &c.client,
        }
    }

    /// Whether a payload of `kind` belongs to the same variant as `self`.
    fn accepts(&self, kind: ChannelType) -> bool {
        match self {
            Self::Text(_) => matches!(
                kind,
                ChannelType::GuildText | ChannelType::GuildAnnouncement
            ),
            Self::Thread(_) => kind.is_thread(),
            Self::Private(_) => matches!(kind, ChannelType::Dm | ChannelType::GroupDm),
            Self::Uncached(c) => c.kind == kind,
        }
    }
}

impl Entity for Channel {
    type Raw = RawChannel;

    fn raw_id(data: &RawChannel) -> &str {
        &data.id
    }

    fn id(&self) -> &Snowflake {
        Channel::id(self)
    }

    fn hydrate(data: &RawChannel, client: WeakClient) -> Self {
        match data.kind {
            ChannelType::GuildText | ChannelType::GuildAnnouncement => {
                let mut channel = TextChannel {
                    client: client.clone(),
                    id: data.id.clone(),
                    kind: data.kind,
                    guild_id: data.guild_id.clone(),
                    name: None,
                    topic: None,
                    position: None,
                    parent_id: None,
                    nsfw: false,
                    last_message_id: None,
                    rate_limit_per_user: None,
                    default_auto_archive_duration: None,
                    messages: Collection::new(client.clone()),
                    threads: Collection::new(client),
                };
                channel.merge(data);
                Self::Text(channel)
            }
            kind if kind.is_thread() => {
                let mut channel = ThreadChannel {
                    client: client.clone(),
                    id: data.id.clone(),
                    kind,
                    guild_id: data.guild_id.clone(),
                    parent_id: None,
                    name: None,
                    owner_id: None,
                    last_message_id: None,
                    message_count: None,
                    member_count: None,
                    total_message_sent: None,
                    archived: false,
                    auto_archive_duration: None,
                    archive_timestamp: None,
                    locked: false,
                    invitable: None,
                    messages: Collection::new(client),
                };
                channel.merge(data);
                Self::Thread(channel)
            }
            ChannelType::Dm | ChannelType::GroupDm => {
                let mut channel = PrivateChannel {
                    client: client.clone(),
                    id: data.id.clone(),
                    kind: data.kind,
                    last_message_id: None,
                    recipient: None,
                    messages: Collection::new(client),
                };
                channel.merge(data);
                Self::Private(channel)
            }
            kind => {
                debug!(id = %data.id, ?kind, "no rich shape for channel type, caching stub");
                Self::Uncached(UncachedChannel {
                    client,
                    id: data.id.clone(),
                    kind,
                })
            }
        }
    }

    fn update(&mut self, data: &RawChannel) {
        if !self.accepts(data.kind) {
            // The variant changed (an uncached stub gained a real type, say).
            // Re-hydrate in place so the shared handle stays valid.
            debug!(id = %data.id, kind = ?data.kind, "channel changed variant, re-hydrating");
            *self = Self::hydrate(data, self.weak_client().clone());
            return;
        }
        match self {
            Self::Text(c) => c.merge(data),
            Self::Thread(c) => c.merge(data),
            Self::Private(c) => c.merge(data),
            Self::Uncached(_) => {}
        }
    }

    fn serialize(&self) -> serde_json::Value {
        match self {
            Self::Text(c) => json!({
                "id": c.id,
                "type": c.kind,
                "guildID": c.guild_id,
                "name": c.name,
                "topic": c.topic,
                "position": c.position,
                "parentID": c.parent_id,
                "nsfw": c.nsfw,
                "lastMessageID": c.last_message_id,
                "rateLimitPerUser": c.rate_limit_per_user,
                "defaultAutoArchiveDuration": c.default_auto_archive_duration,
                "threads": c.threads.keys(),
            }),
            Self::Thread(c) => json!({
                "id": c.id,
                "type": c.kind,
                "guildID": c.guild_id,
                "parentID": c.parent_id,
                "name": c.name,
                "ownerID": c.owner_id,
                "lastMessageID": c.last_message_id,
                "messageCount": c.message_count,
                "memberCount": c.member_count,
                "totalMessageSent": c.total_message_sent,
                "threadMetadata": {
                    "archived": c.archived,
                    "autoArchiveDuration": c.auto_archive_duration,
                    "archiveTimestamp": c.archive_timestamp,
                    "locked": c.locked,
                    "invitable": c.invitable,
                },
            }),
            Self::Private(c) => json!({
                "id": c.id,
                "type": c.kind,
                "lastMessageID": c.last_message_id,
                "recipient": c.recipient.as_ref().map(|u| u.borrow().serialize()),
            }),
            Self::Uncached(c) => json!({
                "id": c.id,
                "type": c.kind,
            }),
        }
    }
}

impl TextChannel {
    fn merge(&mut self, data: &RawChannel) {
        if let Some(guild_id) = &data.guild_id {
            self.guild_id = Some(guild_id.clone());
        }
        if let Some(name) = &data.name {
            self.name = Some(name.clone());
        }
        if let Some(topic) = &data.topic {
            self.topic = Some(topic.clone());
        }
        if let Some(position) = data.position {
            self.position = Some(position);
        }
        if let Some(parent_id) = &data.parent_id {
            self.parent_id = Some(parent_id.clone());
        }
        if let Some(nsfw) = data.nsfw {
            self.nsfw = nsfw;
        }
        if let Some(last_message_id) = &data.last_message_id {
            self.last_message_id = Some(last_message_id.clone());
        }
        if let Some(rate_limit) = data.rate_limit_per_user {
            self.rate_limit_per_user = Some(rate_limit);
        }
        if let Some(duration) = data.default_auto_archive_duration {
            self.default_auto_archive_duration = Some(duration);
        }
    }
}

impl ThreadChannel {
    fn merge(&mut self, data: &RawChannel) {
        if let Some(guild_id) = &data.guild_id {
            self.guild_id = Some(guild_id.clone());
        }
        if let Some(parent_id) = &data.parent_id {
            self.parent_id = Some(parent_id.clone());
        }
        if let Some(name) = &data.name {
            self.name = Some(name.clone());
        }
        if let Some(owner_id) = &data.owner_id {
            self.owner_id = Some(owner_id.clone());
        }
        if let Some(last_message_id) = &data.last_message_id {
            self.last_message_id = Some(last_message_id.clone());
        }
        if let Some(count) = data.message_count {
            self.message_count = Some(count);
        }
        if let Some(count) = data.member_count {
            self.member_count = Some(count);
        }
        if let Some(count) = data.total_message_sent {
            self.total_message_sent = Some(count);
        }
        if let Some(metadata) = &data.thread_metadata {
            self.archived = metadata.archived;
            self.auto_archive_duration = Some(metadata.auto_archive_duration);
            self.archive_timestamp = metadata.archive_timestamp;
            if let Some(locked) = metadata.locked {
                self.locked = locked;
            }
            self.invitable = metadata.invitable;
        }
    }
}

impl PrivateChannel {
    fn merge(&mut self, data: &RawChannel) {
        if let Some(last_message_id) = &data.last_message_id {
            self.last_message_id = Some(last_message_id.clone());
        }
        if let Some(recipients) = &data.recipients {
            if let Some(first) = recipients.first() {
                self.recipient = Some(resolve_user(first, &self.client));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawChannel {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn hydrates_variant_by_type() {
        let text = Channel::hydrate(&raw(json!({"id": "1", "type": 0})), WeakClient::detached());
        assert!(matches!(text, Channel::Text(_)));
        assert!(text.messages().is_some());
        assert!(text.threads().is_some());

        let thread =
            Channel::hydrate(&raw(json!({"id": "2", "type": 12})), WeakClient::detached());
        assert!(matches!(thread, Channel::Thread(_)));
        assert!(thread.threads().is_none());

        let voice = Channel::hydrate(&raw(json!({"id": "3", "type": 2})), WeakClient::detached());
        assert!(matches!(voice, Channel::Uncached(_)));
        assert!(voice.messages().is_none());
    }

    #[test]
    fn update_merges_presence_guarded_fields() {
        let mut channel = Channel::hydrate(
            &raw(json!({"id": "1", "type": 0, "name": "general", "topic": "hello"})),
            WeakClient::detached(),
        );
        channel.update(&raw(json!({"id": "1", "type": 0, "name": "renamed"})));

        let Channel::Text(text) = &channel else {
            panic!("expected text channel");
        };
        assert_eq!(text.name.as_deref(), Some("renamed"));
        assert_eq!(text.topic.as_deref(), Some("hello"));
    }

    #[test]
    fn omitted_flag_booleans_survive_partial_updates() {
        let mut channel = Channel::hydrate(
            &raw(json!({"id": "1", "type": 0, "name": "lounge", "nsfw": true})),
            WeakClient::detached(),
        );
        channel.update(&raw(json!({"id": "1", "type": 0, "topic": "chatter"})));

        let Channel::Text(text) = &channel else {
            panic!("expected text channel");
        };
        assert!(text.nsfw);

        channel.update(&raw(json!({"id": "1", "type": 0, "nsfw": false})));
        let Channel::Text(text) = &channel else {
            panic!("expected text channel");
        };
        assert!(!text.nsfw);
    }

    #[test]
    fn variant_change_rehydrates_in_place() {
        let mut channel =
            Channel::hydrate(&raw(json!({"id": "1", "type": 2})), WeakClient::detached());
        assert!(matches!(channel, Channel::Uncached(_)));

        channel.update(&raw(json!({"id": "1", "type": 0, "name": "now-text"})));
        assert!(matches!(channel, Channel::Text(_)));
        assert_eq!(channel.name(), Some("now-text"));
    }

    #[test]
    fn thread_metadata_applies_on_merge() {
        let mut channel = Channel::hydrate(
            &raw(json!({"id": "2", "type": 11, "parent_id": "1"})),
            WeakClient::detached(),
        );
        channel.update(&raw(json!({
            "id": "2",
            "type": 11,
            "thread_metadata": {"archived": true, "auto_archive_duration": 60, "locked": true}
        })));

        let Channel::Thread(thread) = &channel else {
            panic!("expected thread");
        };
        assert!(thread.archived);
        assert!(thread.locked);
        assert_eq!(thread.auto_archive_duration, Some(60));

        // Metadata without a locked key leaves the lock state alone.
        channel.update(&raw(json!({
            "id": "2",
            "type": 11,
            "thread_metadata": {"archived": true, "auto_archive_duration": 60}
        })));
        let Channel::Thread(thread) = &channel else {
            panic!("expected thread");
        };
        assert!(thread.locked);
    }
}
