//! Messages.
//!
//! The densest merge logic in the cache. A message payload is the source of
//! truth for several containers at once: merging one may update the user
//! registry, the owning guild's member container, the message's own
//! attachment container, and the owning channel's thread container. All of
//! that fan-out is synchronous in-memory work; nothing here touches the
//! transport.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::json;
use tracing::debug;

use crate::client::{Client, WeakClient};
use crate::collection::{Collection, Shared};
use crate::error::Error;
use crate::rest::{EditMessageOptions, StartThreadOptions};
use crate::structures::user::resolve_user;
use crate::structures::{
    Attachment, Channel, Entity, Guild, Member, MessageFlags, User,
};
use crate::util::{self, ParsedComponent};
use crate::wire::{
    InteractionType, MessageActivity, RawChannel, RawMessage, RawUser, Snowflake, StickerItem,
};

pub struct Message {
    client: WeakClient,
    id: Snowflake,
    /// The channel this message was created in. The channel itself is looked
    /// up on demand; an uncached channel degrades to just this ID.
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub author: Shared<User>,
    /// The author's member object, when the owning guild is cached.
    pub member: Option<Shared<Member>>,
    pub timestamp: Option<DateTime<Utc>>,
    pub tts: bool,
    pub kind: u8,
    /// Only an ID; the full webhook is never cached here.
    pub webhook_id: Option<Snowflake>,
    pub activity: Option<MessageActivity>,
    pub application: Option<MessageApplication>,
    pub attachments: Collection<Attachment>,
    pub components: Vec<ParsedComponent>,
    pub content: String,
    pub edited_timestamp: Option<DateTime<Utc>>,
    pub embeds: Vec<crate::wire::Embed>,
    pub flags: Option<MessageFlags>,
    pub interaction: Option<MessageInteraction>,
    pub mentions: MessageMentions,
    pub message_reference: Option<MessageReference>,
    pub nonce: Option<serde_json::Value>,
    pub pinned: bool,
    pub position: Option<i64>,
    /// Keyed by emoji identity (`name` or `name:id`). Additive per key; this
    /// path never prunes stale keys, unlike attachment reconciliation.
    pub reactions: IndexMap<String, MessageReaction>,
    /// Tri-state: `None` = never fetched, `Some(None)` = explicitly absent
    /// upstream, `Some(Some(_))` = present.
    pub referenced_message: Option<Option<Shared<Message>>>,
    pub sticker_items: Vec<StickerItem>,
    pub thread: Option<Shared<Channel>>,
}

/// The application attached to an interaction or rich-presence message:
/// either a full partial-application object or just an ID.
#[derive(Debug, Clone)]
pub enum MessageApplication {
    Partial(crate::wire::RawApplication),
    Uncached(Snowflake),
}

/// Interaction metadata on a message that is an interaction response.
pub struct MessageInteraction {
    pub id: Snowflake,
    pub kind: InteractionType,
    pub name: String,
    pub user: Shared<User>,
    pub member: Option<Shared<Member>>,
}

/// The mentions aggregate.
#[derive(Default)]
pub struct MessageMentions {
    /// Derived by scanning `content` for `<#id>` tokens.
    pub channels: Vec<Snowflake>,
    pub everyone: bool,
    pub members: Vec<Shared<Member>>,
    pub roles: Vec<Snowflake>,
    pub users: Vec<Shared<User>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageReaction {
    pub count: u64,
    /// Whether the current user reacted.
    pub me: bool,
}

/// Reply/crosspost reference, field-renamed from the wire.
#[derive(Debug, Clone)]
pub struct MessageReference {
    pub message_id: Option<Snowflake>,
    pub channel_id: Option<Snowflake>,
    pub guild_id: Option<Snowflake>,
    pub fail_if_not_exists: bool,
}

impl Entity for Message {
    type Raw = RawMessage;

    fn raw_id(data: &RawMessage) -> &str {
        &data.id
    }

    fn id(&self) -> &Snowflake {
        &self.id
    }

    fn hydrate(data: &RawMessage, client: WeakClient) -> Self {
        // Contract: a message can only be hydrated from a payload carrying
        // its author. Partial payloads without one are merges, not first
        // sights.
        let raw_author = data
            .author
            .as_ref()
            .expect("message hydrated from a payload without an author");

        // Webhook authors (discriminator 0000) are synthetic users and stay
        // out of the client-wide registry.
        let author = match client.upgrade() {
            Some(c) if raw_author.discriminator.as_deref() != Some("0000") => {
                c.users.update(raw_author)
            }
            _ => Rc::new(RefCell::new(User::hydrate(raw_author, client.clone()))),
        };

        let application = match (&data.application, &data.application_id) {
            (Some(app), _) => Some(MessageApplication::Partial(app.clone())),
            (None, Some(id)) => Some(MessageApplication::Uncached(id.clone())),
            (None, None) => None,
        };

        let mut message = Self {
            client: client.clone(),
            id: data.id.clone(),
            channel_id: data.channel_id.clone(),
            guild_id: data.guild_id.clone(),
            author,
            member: None,
            timestamp: data.timestamp,
            tts: data.tts,
            kind: data.kind,
            webhook_id: data.webhook_id.clone(),
            activity: None,
            application,
            attachments: Collection::new(client),
            components: Vec::new(),
            content: String::new(),
            edited_timestamp: None,
            embeds: Vec::new(),
            flags: None,
            interaction: None,
            mentions: MessageMentions::default(),
            message_reference: None,
            nonce: None,
            pinned: false,
            position: None,
            reactions: IndexMap::new(),
            referenced_message: None,
            sticker_items: Vec::new(),
            thread: None,
        };
        // Construction and later partial updates share one merge routine.
        message.update(data);

        if let Some(raw_member) = &data.member {
            if let Some(client) = message.client.upgrade() {
                if let Some(guild) = message.cached_guild(&client) {
                    message.member = Some(guild.borrow().update_member(raw_author, raw_member));
                }
            }
        }
        message
    }

    /// The field-by-field merge routine. Every step is guarded independently
    /// by payload presence; an absent field is a no-op, which is what makes
    /// repeated application of the same payload idempotent.
    fn update(&mut self, data: &RawMessage) {
        let client = self.client.upgrade();

        if let Some(everyone) = data.mention_everyone {
            self.mentions.everyone = everyone;
        }
        if let Some(roles) = &data.mention_roles {
            self.mentions.roles = roles.clone();
        }
        if let Some(mentions) = &data.mentions {
            let guild = client.as_ref().and_then(|c| self.cached_guild(c));
            let mut members = Vec::new();
            self.mentions.users = mentions
                .iter()
                .map(|mention| {
                    if let (Some(raw_member), Some(guild)) = (&mention.member, &guild) {
                        members.push(guild.borrow().update_member(&mention.user, raw_member));
                    }
                    resolve_user(&mention.user, &self.client)
                })
                .collect();
            self.mentions.members = members;
        }
        if let Some(activity) = &data.activity {
            self.activity = Some(activity.clone());
        }
        if let Some(attachments) = &data.attachments {
            // The payload is authoritative for the full set: drop what it no
            // longer lists, then update-or-insert the rest.
            for id in self.attachments.keys() {
                if !attachments.iter().any(|a| a.id == id) {
                    self.attachments.delete(&id);
                }
            }
            for attachment in attachments {
                self.attachments.update(attachment);
            }
        }
        if let Some(components) = &data.components {
            self.components = util::components_to_parsed(components);
        }
        if let Some(content) = &data.content {
            self.content = content.clone();
            self.mentions.channels = util::channel_mentions(content);
        }
        if let Some(edited) = data.edited_timestamp {
            self.edited_timestamp = edited;
        }
        if let Some(embeds) = &data.embeds {
            self.embeds = embeds.clone();
        }
        if let Some(flags) = data.flags {
            self.flags = Some(MessageFlags::from_bits_retain(flags));
        }
        if let Some(interaction) = &data.interaction {
            let member = interaction.member.as_ref().and_then(|raw_member| {
                let guild = client.as_ref().and_then(|c| self.cached_guild(c))?;
                let member = guild.borrow().update_member(&interaction.user, raw_member);
                Some(member)
            });
            self.interaction = Some(MessageInteraction {
                id: interaction.id.clone(),
                kind: interaction.kind,
                name: interaction.name.clone(),
                user: resolve_user(&interaction.user, &self.client),
                member,
            });
        }
        if let Some(reference) = &data.message_reference {
            self.message_reference = Some(MessageReference {
                message_id: reference.message_id.clone(),
                channel_id: reference.channel_id.clone(),
                guild_id: reference.guild_id.clone(),
                fail_if_not_exists: reference.fail_if_not_exists,
            });
        }
        if let Some(nonce) = &data.nonce {
            self.nonce = Some(nonce.clone());
        }
        if let Some(pinned) = data.pinned {
            self.pinned = pinned;
        }
        if let Some(position) = data.position {
            self.position = Some(position);
        }
        if let Some(reactions) = &data.reactions {
            // Additive per emoji key. Keys absent from this payload are left
            // alone; reaction removals arrive as targeted events, not as
            // full-state snapshots.
            for reaction in reactions {
                self.reactions.insert(
                    util::emoji_key(&reaction.emoji),
                    MessageReaction {
                        count: reaction.count,
                        me: reaction.me,
                    },
                );
            }
        }
        if let Some(referenced) = &data.referenced_message {
            self.referenced_message = Some(match referenced {
                None => None,
                Some(raw) => Some(self.resolve_referenced(raw, client.as_ref())),
            });
        }
        if let Some(sticker_items) = &data.sticker_items {
            self.sticker_items = sticker_items.clone();
        }
        if let Some(raw_thread) = &data.thread {
            self.thread = Some(self.resolve_thread(raw_thread, client.as_ref()));
        }
    }

    /// Snapshot; embeds the author, mention, interaction, referenced-message,
    /// and thread snapshots, and flattens the channel to its ID.
    fn serialize(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "channel": self.channel_id,
            "guild": self.guild_id,
            "author": self.author.borrow().serialize(),
            "member": self.member.as_ref().map(|m| m.borrow().serialize()),
            "timestamp": self.timestamp,
            "tts": self.tts,
            "type": self.kind,
            "webhook": self.webhook_id,
            "activity": self.activity,
            "application": match &self.application {
                Some(MessageApplication::Partial(app)) => json!(app),
                Some(MessageApplication::Uncached(id)) => json!(id),
                None => serde_json::Value::Null,
            },
            "attachments": self.attachments.map(|a| a.serialize()),
            "components": self.components,
            "content": self.content,
            "editedTimestamp": self.edited_timestamp,
            "embeds": self.embeds,
            "flags": self.flags.map(|f| f.bits()),
            "interaction": self.interaction.as_ref().map(|i| json!({
                "id": i.id,
                "type": i.kind,
                "name": i.name,
                "user": i.user.borrow().serialize(),
                "member": i.member.as_ref().map(|m| m.borrow().serialize()),
            })),
            "mentions": {
                "channels": self.mentions.channels,
                "everyone": self.mentions.everyone,
                "members": self.mentions.members.iter().map(|m| m.borrow().serialize()).collect::<Vec<_>>(),
                "roles": self.mentions.roles,
                "users": self.mentions.users.iter().map(|u| u.borrow().serialize()).collect::<Vec<_>>(),
            },
            "messageReference": self.message_reference.as_ref().map(|r| json!({
                "messageID": r.message_id,
                "channelID": r.channel_id,
                "guildID": r.guild_id,
                "failIfNotExists": r.fail_if_not_exists,
            })),
            "nonce": self.nonce,
            "pinned": self.pinned,
            "position": self.position,
            "reactions": self.reactions.iter().map(|(key, r)| {
                (key.clone(), json!({"count": r.count, "me": r.me}))
            }).collect::<serde_json::Map<_, _>>(),
            "referencedMessage": match &self.referenced_message {
                Some(Some(message)) => message.borrow().serialize(),
                _ => serde_json::Value::Null,
            },
            "stickerItems": self.sticker_items,
            "thread": self.thread.as_ref().map(|t| t.borrow().serialize()),
        })
    }
}

impl Message {
    pub fn client(&self) -> Option<Client> {
        self.client.upgrade()
    }

    /// The channel this message belongs to, if cached.
    pub fn channel(&self) -> Option<Shared<Channel>> {
        self.client.upgrade()?.get_channel(&self.channel_id)
    }

    /// The guild the message's channel belongs to, if that guild is live in
    /// the cache. Falls back from the message's own `guild_id` to the cached
    /// channel's.
    fn cached_guild(&self, client: &Client) -> Option<Shared<Guild>> {
        let guild_id = self.guild_id.clone().or_else(|| {
            let channel = client.get_channel(&self.channel_id)?;
            let guild_id = channel.borrow().guild_id().cloned();
            guild_id
        })?;
        client.guilds.get(&guild_id)
    }

    /// Resolve a referenced message through the owning channel's message
    /// container when it has one, else construct it standalone.
    fn resolve_referenced(&self, raw: &RawMessage, client: Option<&Client>) -> Shared<Message> {
        if let Some(client) = client {
            if let Some(channel) = client.get_channel(&self.channel_id) {
                let channel = channel.borrow();
                if let Some(messages) = channel.messages() {
                    return messages.update(raw);
                }
            }
        }
        Rc::new(RefCell::new(Message::hydrate(raw, self.client.clone())))
    }

    /// Thread resolution priority: the guild's thread container when the
    /// guild is cached, then the channel's, then a standalone construct that
    /// belongs to no container.
    fn resolve_thread(&self, raw: &RawChannel, client: Option<&Client>) -> Shared<Channel> {
        let Some(client) = client else {
            return Rc::new(RefCell::new(Channel::hydrate(raw, self.client.clone())));
        };

        let guild = self
            .guild_id
            .as_ref()
            .and_then(|guild_id| client.guilds.get(guild_id));
        if let Some(guild) = guild {
            let thread = guild.borrow().threads.update(raw);
            client.register_thread_guild(&raw.id, guild.borrow().id());
            // Also surface the thread on its parent channel.
            if let Some(channel) = client.get_channel(&self.channel_id) {
                let channel = channel.borrow();
                if let Some(threads) = channel.threads() {
                    if !threads.has(thread.borrow().id()) {
                        threads.add(Rc::clone(&thread));
                    }
                }
            }
            return thread;
        }

        if let Some(channel) = client.get_channel(&self.channel_id) {
            let channel = channel.borrow();
            if let Some(threads) = channel.threads() {
                return threads.update(raw);
            }
        }

        debug!(
            message_id = %self.id,
            thread_id = %raw.id,
            "neither guild nor channel cached, constructing standalone thread"
        );
        Rc::new(RefCell::new(Channel::hydrate(raw, self.client.clone())))
    }

    fn owning_client(&self) -> Result<Client, Error> {
        self.client.upgrade().ok_or_else(Error::client_dropped)
    }

    // -----------------------------------------------------------------------
    // Outbound actions. These delegate to the transport and never mutate the
    // cache; server-confirmed changes come back through the update path.
    // -----------------------------------------------------------------------

    /// Add a reaction. `name:id` for custom emoji, the unicode codepoint
    /// otherwise.
    pub fn create_reaction(&self, emoji: &str) -> Result<(), Error> {
        self.owning_client()?
            .rest()
            .create_reaction(&self.channel_id, &self.id, emoji)
    }

    /// Remove a reaction. `user` is `@me` for the current user.
    pub fn delete_reaction(&self, emoji: &str, user: &str) -> Result<(), Error> {
        self.owning_client()?
            .rest()
            .delete_reaction(&self.channel_id, &self.id, emoji, user)
    }

    /// Remove all reactions, or all reactions for one emoji.
    pub fn delete_reactions(&self, emoji: Option<&str>) -> Result<(), Error> {
        self.owning_client()?
            .rest()
            .delete_reactions(&self.channel_id, &self.id, emoji)
    }

    /// The users who reacted with a specific emoji.
    pub fn get_reactions(&self, emoji: &str) -> Result<Vec<RawUser>, Error> {
        self.owning_client()?
            .rest()
            .get_reactions(&self.channel_id, &self.id, emoji)
    }

    pub fn edit(&self, options: &EditMessageOptions) -> Result<RawMessage, Error> {
        self.owning_client()?
            .rest()
            .edit_message(&self.channel_id, &self.id, options)
    }

    pub fn delete(&self, reason: Option<&str>) -> Result<(), Error> {
        self.owning_client()?
            .rest()
            .delete_message(&self.channel_id, &self.id, reason)
    }

    pub fn pin(&self, reason: Option<&str>) -> Result<(), Error> {
        self.owning_client()?
            .rest()
            .pin_message(&self.channel_id, &self.id, reason)
    }

    pub fn unpin(&self, reason: Option<&str>) -> Result<(), Error> {
        self.owning_client()?
            .rest()
            .unpin_message(&self.channel_id, &self.id, reason)
    }

    /// Crosspost this message in an announcement channel.
    pub fn crosspost(&self) -> Result<RawMessage, Error> {
        self.owning_client()?
            .rest()
            .crosspost_message(&self.channel_id, &self.id)
    }

    pub fn start_thread(&self, options: &StartThreadOptions) -> Result<RawChannel, Error> {
        self.owning_client()?
            .rest()
            .start_thread_from_message(&self.channel_id, &self.id, options)
    }

    /// Edit this message through its webhook. Requires the message to have
    /// been sent by a webhook.
    pub fn edit_webhook(
        &self,
        token: &str,
        options: &EditMessageOptions,
    ) -> Result<RawMessage, Error> {
        let webhook_id = self.webhook_id.as_ref().ok_or_else(Error::webhook_required)?;
        self.owning_client()?
            .rest()
            .edit_webhook_message(webhook_id, token, &self.id, options)
    }

    /// Delete this message through its webhook. Requires the message to have
    /// been sent by a webhook.
    pub fn delete_webhook(&self, token: &str) -> Result<(), Error> {
        let webhook_id = self.webhook_id.as_ref().ok_or_else(Error::webhook_required)?;
        self.owning_client()?
            .rest()
            .delete_webhook_message(webhook_id, token, &self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::rest::testing::{NoopRest, RecordingRest};
    use serde_json::json;

    fn client() -> Client {
        Client::new(Box::new(NoopRest))
    }

    /// A client with guild 100 containing text channel 200.
    fn client_with_guild() -> Client {
        let client = client();
        client.guilds.update(
            &serde_json::from_value(json!({
                "id": "100",
                "name": "guild",
                "channels": [{"id": "200", "type": 0, "guild_id": "100", "name": "general"}]
            }))
            .unwrap(),
        );
        client
    }

    fn raw_message(value: serde_json::Value) -> RawMessage {
        serde_json::from_value(value).unwrap()
    }

    fn base_message(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "channel_id": "200",
            "guild_id": "100",
            "author": {"id": "1", "username": "alice"},
            "timestamp": "2024-03-01T12:00:00Z",
            "content": "hello"
        })
    }

    fn cache_message(client: &Client, value: serde_json::Value) -> Shared<Message> {
        let channel = client.get_channel("200").expect("channel cached");
        let channel = channel.borrow();
        channel.messages().unwrap().update(&raw_message(value))
    }

    #[test]
    fn identity_stable_across_updates() {
        let client = client_with_guild();
        let first = cache_message(&client, base_message("500"));
        let mut edit = base_message("500");
        edit["content"] = json!("edited");
        let second = cache_message(&client, edit);

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.borrow().content, "edited");
    }

    #[test]
    fn omitted_fields_survive_partial_updates() {
        let client = client_with_guild();
        let message = cache_message(&client, base_message("500"));
        assert_eq!(message.borrow().content, "hello");

        // A pin-state delta without content.
        cache_message(&client, json!({"id": "500", "channel_id": "200", "pinned": true}));
        assert_eq!(message.borrow().content, "hello");
        assert!(message.borrow().pinned);

        // Applying the original payload again changes nothing observable.
        let snapshot = message.borrow().serialize();
        cache_message(&client, base_message("500"));
        assert_eq!(message.borrow().serialize(), snapshot);
    }

    #[test]
    fn referenced_message_tri_state() {
        let client = client_with_guild();
        let message = cache_message(&client, base_message("500"));
        assert!(message.borrow().referenced_message.is_none());

        let mut with_reference = base_message("500");
        with_reference["referenced_message"] = base_message("400");
        cache_message(&client, with_reference);
        {
            let message = message.borrow();
            let referenced = message
                .referenced_message
                .as_ref()
                .unwrap()
                .as_ref()
                .expect("present");
            assert_eq!(referenced.borrow().id(), "400");
            // Resolved through the channel container, so it is the cached one.
            let channel = client.get_channel("200").unwrap();
            let channel = channel.borrow();
            let cached = channel.messages().unwrap().get("400").unwrap();
            assert!(Rc::ptr_eq(referenced, &cached));
        }

        // Omitting the key leaves the value untouched.
        cache_message(&client, json!({"id": "500", "channel_id": "200", "pinned": false}));
        assert!(matches!(
            &message.borrow().referenced_message,
            Some(Some(_))
        ));

        // An explicit null clears it.
        cache_message(
            &client,
            json!({"id": "500", "channel_id": "200", "referenced_message": null}),
        );
        assert!(matches!(&message.borrow().referenced_message, Some(None)));
    }

    #[test]
    fn channel_mentions_recomputed_from_content() {
        let client = client_with_guild();
        let mut payload = base_message("500");
        payload["content"] = json!("hello <#123456789012345678> and <#42>");
        let message = cache_message(&client, payload);

        assert_eq!(
            message.borrow().mentions.channels,
            vec!["123456789012345678".to_string()]
        );
    }

    #[test]
    fn reaction_keys_distinguish_custom_emoji() {
        let client = client_with_guild();
        let mut payload = base_message("500");
        payload["reactions"] = json!([
            {"count": 2, "me": false, "emoji": {"id": null, "name": "fire"}},
            {"count": 1, "me": true, "emoji": {"id": "99", "name": "custom"}}
        ]);
        let message = cache_message(&client, payload);

        let message = message.borrow();
        assert_eq!(message.reactions["fire"].count, 2);
        assert_eq!(message.reactions["custom:99"].count, 1);
        assert!(message.reactions["custom:99"].me);
    }

    #[test]
    fn reaction_merge_never_prunes_stale_keys() {
        let client = client_with_guild();
        let mut payload = base_message("500");
        payload["reactions"] = json!([
            {"count": 2, "emoji": {"id": null, "name": "fire"}}
        ]);
        let message = cache_message(&client, payload);

        cache_message(
            &client,
            json!({
                "id": "500",
                "channel_id": "200",
                "reactions": [{"count": 5, "emoji": {"id": null, "name": "wave"}}]
            }),
        );

        let message = message.borrow();
        assert_eq!(message.reactions["fire"].count, 2);
        assert_eq!(message.reactions["wave"].count, 5);
    }

    #[test]
    fn attachments_reconcile_against_the_payload() {
        let client = client_with_guild();
        let attachment = |id: &str, name: &str| {
            json!({
                "id": id,
                "filename": name,
                "size": 1,
                "url": "https://cdn/x",
                "proxy_url": "https://proxy/x"
            })
        };

        let mut payload = base_message("500");
        payload["attachments"] = json!([attachment("a", "a.png"), attachment("b", "b.png")]);
        let message = cache_message(&client, payload);
        let kept_b = message.borrow().attachments.get("b").unwrap();

        cache_message(
            &client,
            json!({
                "id": "500",
                "channel_id": "200",
                "attachments": [attachment("b", "b2.png"), attachment("c", "c.png")]
            }),
        );

        let message = message.borrow();
        assert_eq!(message.attachments.keys(), vec!["b", "c"]);
        // B was updated in place, same identity.
        let b_after = message.attachments.get("b").unwrap();
        assert!(Rc::ptr_eq(&kept_b, &b_after));
        assert_eq!(b_after.borrow().filename, "b2.png");
    }

    #[test]
    fn mention_members_resolve_through_cached_guild() {
        let client = client_with_guild();
        let mut payload = base_message("500");
        payload["mentions"] = json!([
            {"id": "7", "username": "bob", "member": {"nick": "bobby"}}
        ]);
        let message = cache_message(&client, payload);

        let message = message.borrow();
        assert_eq!(message.mentions.users.len(), 1);
        assert_eq!(message.mentions.members.len(), 1);
        assert_eq!(
            message.mentions.members[0].borrow().nick.as_deref(),
            Some("bobby")
        );
        // Fan-out: both registries were updated.
        assert!(client.users.has("7"));
        let guild = client.guilds.get("100").unwrap();
        assert!(guild.borrow().members.has("7"));
    }

    #[test]
    fn mention_members_absent_without_cached_guild() {
        let client = client_with_guild();
        // No guild_id and the channel route still finds guild 100, so use a
        // channel the client does not know about.
        let message = Rc::new(RefCell::new(Message::hydrate(
            &raw_message(json!({
                "id": "500",
                "channel_id": "999",
                "author": {"id": "1", "username": "alice"},
                "mentions": [{"id": "7", "username": "bob", "member": {"nick": "bobby"}}]
            })),
            client.downgrade(),
        )));

        let message = message.borrow();
        assert_eq!(message.mentions.users.len(), 1);
        assert!(message.mentions.members.is_empty());
    }

    #[test]
    fn thread_resolves_through_cached_guild_and_surfaces_on_channel() {
        let client = client_with_guild();
        let mut payload = base_message("500");
        payload["thread"] = json!({"id": "300", "type": 11, "guild_id": "100", "parent_id": "200"});
        let message = cache_message(&client, payload);

        let thread = message.borrow().thread.clone().expect("thread resolved");
        let guild = client.guilds.get("100").unwrap();
        let in_guild = guild.borrow().threads.get("300").unwrap();
        assert!(Rc::ptr_eq(&thread, &in_guild));

        // Side effect: the parent channel's thread container gained it too.
        let channel = client.get_channel("200").unwrap();
        let channel = channel.borrow();
        let in_channel = channel.threads().unwrap().get("300").unwrap();
        assert!(Rc::ptr_eq(&thread, &in_channel));
    }

    #[test]
    fn thread_falls_back_to_channel_container_without_guild() {
        let client = client_with_guild();
        // No guild_id on the payload: the guild branch misses, the cached
        // channel still owns the thread.
        let payload = json!({
            "id": "501",
            "channel_id": "200",
            "author": {"id": "1", "username": "alice"},
            "thread": {"id": "301", "type": 11, "parent_id": "200"}
        });
        let message = cache_message(&client, payload);

        let thread = message.borrow().thread.clone().expect("thread resolved");
        let channel = client.get_channel("200").unwrap();
        let channel = channel.borrow();
        let in_channel = channel.threads().unwrap().get("301").unwrap();
        assert!(Rc::ptr_eq(&thread, &in_channel));
        // The guild never saw it.
        let guild = client.guilds.get("100").unwrap();
        assert!(!guild.borrow().threads.has("301"));
    }

    #[test]
    fn thread_standalone_when_nothing_is_cached() {
        let client = client();
        let message = Message::hydrate(
            &raw_message(json!({
                "id": "502",
                "channel_id": "999",
                "author": {"id": "1", "username": "alice"},
                "thread": {"id": "302", "type": 11, "parent_id": "999"}
            })),
            client.downgrade(),
        );

        let thread = message.thread.as_ref().expect("thread constructed");
        assert_eq!(thread.borrow().id(), "302");
        assert!(client.get_channel("302").is_none());
    }

    #[test]
    fn same_author_shares_one_user_entity() {
        let client = client_with_guild();
        let first = cache_message(&client, base_message("500"));
        let second = cache_message(&client, {
            let mut m = base_message("501");
            m["author"] = json!({"id": "1", "username": "alice-renamed"});
            m
        });

        assert!(Rc::ptr_eq(&first.borrow().author, &second.borrow().author));
        assert_eq!(first.borrow().author.borrow().username, "alice-renamed");
    }

    #[test]
    fn webhook_author_stays_out_of_registry() {
        let client = client_with_guild();
        cache_message(
            &client,
            json!({
                "id": "500",
                "channel_id": "200",
                "webhook_id": "777",
                "author": {"id": "888", "username": "hook", "discriminator": "0000"}
            }),
        );
        assert!(!client.users.has("888"));
    }

    #[test]
    fn snapshot_flattens_channel_and_embeds_author() {
        let client = client_with_guild();
        let message = cache_message(&client, base_message("500"));
        let snapshot = message.borrow().serialize();

        assert_eq!(snapshot["channel"], "200");
        assert_eq!(snapshot["author"]["username"], "alice");
        assert_eq!(snapshot["content"], "hello");
    }

    #[test]
    fn actions_delegate_to_the_transport() {
        let rest = RecordingRest::default();
        let client = Client::new(Box::new(rest.clone()));
        client.guilds.update(
            &serde_json::from_value(json!({
                "id": "100",
                "name": "guild",
                "channels": [{"id": "200", "type": 0, "guild_id": "100"}]
            }))
            .unwrap(),
        );
        let message = cache_message(&client, base_message("500"));

        message.borrow().create_reaction("🔥").unwrap();
        message.borrow().pin(None).unwrap();
        assert_eq!(
            *rest.calls.borrow(),
            vec!["create_reaction 200 500 🔥", "pin_message 200 500"]
        );
        // Cache state is untouched by actions.
        assert!(!message.borrow().pinned);
        assert!(message.borrow().reactions.is_empty());
    }

    #[test]
    fn webhook_actions_require_a_webhook_message() {
        let rest = RecordingRest::default();
        let client = Client::new(Box::new(rest));
        client.guilds.update(
            &serde_json::from_value(json!({
                "id": "100",
                "name": "guild",
                "channels": [{"id": "200", "type": 0, "guild_id": "100"}]
            }))
            .unwrap(),
        );
        let message = cache_message(&client, base_message("500"));

        let err = message.borrow().delete_webhook("token").unwrap_err();
        assert_eq!(*err.kind(), ErrorType::WebhookRequired);
    }
}
