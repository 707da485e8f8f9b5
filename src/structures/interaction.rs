//! Component interactions.
//!
//! A component interaction arrives when someone presses a button or submits a
//! select menu on a message. Constructing one resolves its channel, message,
//! user, and member through the cache, and the result carries an acknowledged
//! flag enforcing the transport contract that an interaction gets exactly one
//! initial response.

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use tracing::debug;

use crate::client::{Client, WeakClient};
use crate::collection::Shared;
use crate::error::Error;
use crate::rest::{InteractionCallbackType, InteractionContent, InteractionResponse};
use crate::structures::user::resolve_user;
use crate::structures::{Entity, Guild, Member, Message, User};
use crate::wire::{InteractionType, RawComponentInteraction, RawMessage, Snowflake};

pub struct ComponentInteraction {
    client: WeakClient,
    id: Snowflake,
    pub application_id: Snowflake,
    pub kind: InteractionType,
    token: String,
    pub channel_id: Snowflake,
    pub locale: Option<String>,
    /// The bot's permissions in the source channel, when sent from a guild.
    pub app_permissions: Option<String>,
    pub context: InteractionContext,
    pub data: ComponentInteractionData,
    /// The message the pressed component lives on.
    pub message: Shared<Message>,
    pub user: Shared<User>,
    /// Whether an initial response has been sent. Flipped before the
    /// transport call so a failed send still counts as consumed.
    acknowledged: Cell<bool>,
}

/// Where the interaction happened.
pub enum InteractionContext {
    Guild {
        guild_id: Snowflake,
        /// Resolved at construction; `None` when the guild is not cached.
        guild: Option<Shared<Guild>>,
        guild_locale: Option<String>,
        member: Option<Shared<Member>>,
        /// The invoking member's permissions in the source channel.
        member_permissions: Option<String>,
    },
    Private,
}

/// The component-specific payload.
pub enum ComponentInteractionData {
    Button {
        custom_id: String,
    },
    SelectMenu {
        /// The raw component type (3, 5, 6, 7, or 8), distinguishing string
        /// selects from user/role/mentionable/channel selects.
        kind: u8,
        custom_id: String,
        values: Vec<String>,
    },
}

impl ComponentInteractionData {
    pub fn custom_id(&self) -> &str {
        match self {
            Self::Button { custom_id } | Self::SelectMenu { custom_id, .. } => custom_id,
        }
    }
}

impl std::fmt::Debug for ComponentInteraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInteraction")
            .field("id", &self.id)
            .field("application_id", &self.application_id)
            .field("kind", &self.kind)
            .field("channel_id", &self.channel_id)
            .field("acknowledged", &self.acknowledged.get())
            .finish_non_exhaustive()
    }
}

impl ComponentInteraction {
    /// Construct from a gateway payload, resolving references through the
    /// cache. The payload must carry a channel, a message, and an invoking
    /// user (directly or inside the member object).
    pub fn from_raw(data: &RawComponentInteraction, client: &Client) -> Result<Self, Error> {
        let channel_id = data
            .channel_id
            .clone()
            .ok_or_else(|| Error::missing_field("channel_id"))?;
        let raw_message = data
            .message
            .as_deref()
            .ok_or_else(|| Error::missing_field("message"))?;
        let raw_user = data
            .user
            .as_ref()
            .or_else(|| data.member.as_ref().and_then(|m| m.user.as_ref()))
            .ok_or_else(|| Error::missing_field("user"))?;

        let weak = client.downgrade();
        let user = resolve_user(raw_user, &weak);

        let context = match &data.guild_id {
            Some(guild_id) => {
                let guild = client.guilds.get(guild_id);
                if guild.is_none() {
                    debug!(%guild_id, "interaction from uncached guild");
                }
                let member = match (&data.member, &guild) {
                    (Some(raw_member), Some(guild)) => {
                        Some(guild.borrow().update_member(raw_user, raw_member))
                    }
                    _ => None,
                };
                InteractionContext::Guild {
                    guild_id: guild_id.clone(),
                    guild,
                    guild_locale: data.guild_locale.clone(),
                    member,
                    member_permissions: data
                        .member
                        .as_ref()
                        .and_then(|m| m.permissions.clone()),
                }
            }
            None => InteractionContext::Private,
        };

        let message = Self::resolve_message(raw_message, &channel_id, client);

        let parsed = match data.data.component_type {
            2 => ComponentInteractionData::Button {
                custom_id: data.data.custom_id.clone(),
            },
            kind => ComponentInteractionData::SelectMenu {
                kind,
                custom_id: data.data.custom_id.clone(),
                values: data.data.values.clone().unwrap_or_default(),
            },
        };

        Ok(Self {
            client: weak,
            id: data.id.clone(),
            application_id: data.application_id.clone(),
            kind: data.kind,
            token: data.token.clone(),
            channel_id,
            locale: data.locale.clone(),
            app_permissions: data.app_permissions.clone(),
            context,
            data: parsed,
            message,
            user,
            acknowledged: Cell::new(false),
        })
    }

    /// Resolve the component's message through the owning channel's message
    /// container, falling back to a standalone construct.
    fn resolve_message(raw: &RawMessage, channel_id: &str, client: &Client) -> Shared<Message> {
        if let Some(channel) = client.get_channel(channel_id) {
            let channel = channel.borrow();
            if let Some(messages) = channel.messages() {
                return messages.update(raw);
            }
        }
        Rc::new(RefCell::new(Message::hydrate(raw, client.downgrade())))
    }

    pub fn id(&self) -> &Snowflake {
        &self.id
    }

    pub fn client(&self) -> Option<Client> {
        self.client.upgrade()
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged.get()
    }

    /// The channel the interaction happened in, if cached.
    pub fn channel(&self) -> Option<Shared<crate::structures::Channel>> {
        self.client.upgrade()?.get_channel(&self.channel_id)
    }

    /// The guild the interaction happened in.
    ///
    /// `Ok(None)` for private-channel interactions. An interaction that names
    /// a guild the cache does not hold is an error rather than a silent
    /// `None`, since callers branching on guild state would misread it.
    pub fn guild(&self) -> Result<Option<Shared<Guild>>, Error> {
        match &self.context {
            InteractionContext::Private => Ok(None),
            InteractionContext::Guild { guild, .. } => match guild {
                Some(guild) => Ok(Some(Rc::clone(guild))),
                None => Err(Error::guild_uncached()),
            },
        }
    }

    pub fn member(&self) -> Option<Shared<Member>> {
        match &self.context {
            InteractionContext::Guild { member, .. } => member.clone(),
            InteractionContext::Private => None,
        }
    }

    /// Whether this interaction happened in a guild channel the cache holds.
    pub fn in_cached_guild_channel(&self) -> bool {
        matches!(&self.context, InteractionContext::Guild { guild: Some(_), .. })
    }

    /// Whether this interaction happened in a DM.
    pub fn in_private_channel(&self) -> bool {
        matches!(self.context, InteractionContext::Private)
    }

    fn owning_client(&self) -> Result<Client, Error> {
        self.client.upgrade().ok_or_else(Error::client_dropped)
    }

    /// Consume the single initial response, or error if it is already gone.
    /// The flag flips before any transport work happens.
    fn consume_initial_response(&self) -> Result<(), Error> {
        if self.acknowledged.replace(true) {
            return Err(Error::already_acknowledged());
        }
        Ok(())
    }

    fn respond(
        &self,
        kind: InteractionCallbackType,
        data: Option<InteractionContent>,
    ) -> Result<(), Error> {
        let client = self.owning_client()?;
        self.consume_initial_response()?;
        client
            .rest()
            .create_interaction_response(&self.id, &self.token, &InteractionResponse { kind, data })
    }

    // -----------------------------------------------------------------------
    // Initial responses. Each consumes the one acknowledgement.
    // -----------------------------------------------------------------------

    /// Respond with a message.
    pub fn create_message(&self, content: InteractionContent) -> Result<(), Error> {
        self.respond(InteractionCallbackType::ChannelMessageWithSource, Some(content))
    }

    /// Respond with a modal.
    pub fn create_modal(&self, content: InteractionContent) -> Result<(), Error> {
        self.respond(InteractionCallbackType::Modal, Some(content))
    }

    /// Acknowledge now, respond later with a followup or original-message
    /// edit. `flags` can mark the eventual response ephemeral.
    pub fn defer(&self, flags: Option<u32>) -> Result<(), Error> {
        let data = flags.map(|flags| InteractionContent {
            flags: Some(flags),
            ..InteractionContent::default()
        });
        self.respond(InteractionCallbackType::DeferredChannelMessageWithSource, data)
    }

    /// Acknowledge without any visible response; the component's message
    /// stays as it is until edited.
    pub fn defer_update(&self) -> Result<(), Error> {
        self.respond(InteractionCallbackType::DeferredUpdateMessage, None)
    }

    /// Respond by editing the message the component lives on.
    pub fn edit_parent(&self, content: InteractionContent) -> Result<(), Error> {
        self.respond(InteractionCallbackType::UpdateMessage, Some(content))
    }

    // -----------------------------------------------------------------------
    // Followups and original-response access. Token-scoped, any number, no
    // acknowledgement involved.
    // -----------------------------------------------------------------------

    pub fn create_followup(&self, content: &InteractionContent) -> Result<RawMessage, Error> {
        self.owning_client()?
            .rest()
            .create_followup_message(&self.application_id, &self.token, content)
    }

    pub fn edit_followup(
        &self,
        message_id: &str,
        content: &InteractionContent,
    ) -> Result<RawMessage, Error> {
        self.owning_client()?
            .rest()
            .edit_followup_message(&self.application_id, &self.token, message_id, content)
    }

    pub fn delete_followup(&self, message_id: &str) -> Result<(), Error> {
        self.owning_client()?
            .rest()
            .delete_followup_message(&self.application_id, &self.token, message_id)
    }

    pub fn get_followup(&self, message_id: &str) -> Result<RawMessage, Error> {
        self.owning_client()?
            .rest()
            .get_followup_message(&self.application_id, &self.token, message_id)
    }

    pub fn edit_original(&self, content: &InteractionContent) -> Result<RawMessage, Error> {
        self.owning_client()?
            .rest()
            .edit_original_message(&self.application_id, &self.token, content)
    }

    pub fn delete_original(&self) -> Result<(), Error> {
        self.owning_client()?
            .rest()
            .delete_original_message(&self.application_id, &self.token)
    }

    pub fn get_original(&self) -> Result<RawMessage, Error> {
        self.owning_client()?
            .rest()
            .get_original_message(&self.application_id, &self.token)
    }

    /// Snapshot. The token is deliberately omitted.
    pub fn serialize(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "applicationID": self.application_id,
            "type": self.kind,
            "channel": self.channel_id,
            "locale": self.locale,
            "appPermissions": self.app_permissions,
            "guildID": match &self.context {
                InteractionContext::Guild { guild_id, .. } => json!(guild_id),
                InteractionContext::Private => serde_json::Value::Null,
            },
            "guildLocale": match &self.context {
                InteractionContext::Guild { guild_locale, .. } => json!(guild_locale),
                InteractionContext::Private => serde_json::Value::Null,
            },
            "member": self.member().map(|m| m.borrow().serialize()),
            "data": match &self.data {
                ComponentInteractionData::Button { custom_id } => json!({
                    "componentType": 2,
                    "customID": custom_id,
                }),
                ComponentInteractionData::SelectMenu { kind, custom_id, values } => json!({
                    "componentType": kind,
                    "customID": custom_id,
                    "values": values,
                }),
            },
            "message": self.message.borrow().serialize(),
            "user": self.user.borrow().serialize(),
            "acknowledged": self.acknowledged.get(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::rest::testing::{NoopRest, RecordingRest};
    use serde_json::json;
    use static_assertions::assert_impl_all;

    assert_impl_all!(ComponentInteraction: std::fmt::Debug);

    fn client_with_guild(rest: Box<dyn crate::rest::Rest>) -> Client {
        let client = Client::new(rest);
        client.guilds.update(
            &serde_json::from_value(json!({
                "id": "100",
                "name": "guild",
                "channels": [{"id": "200", "type": 0, "guild_id": "100"}]
            }))
            .unwrap(),
        );
        client
    }

    fn raw_interaction(value: serde_json::Value) -> RawComponentInteraction {
        serde_json::from_value(value).unwrap()
    }

    fn button_payload() -> serde_json::Value {
        json!({
            "id": "900",
            "application_id": "10",
            "type": 3,
            "token": "tok",
            "channel_id": "200",
            "guild_id": "100",
            "member": {
                "user": {"id": "1", "username": "alice"},
                "nick": "al",
                "permissions": "8"
            },
            "data": {"component_type": 2, "custom_id": "confirm"},
            "message": {
                "id": "500",
                "channel_id": "200",
                "author": {"id": "2", "username": "bot", "bot": true}
            }
        })
    }

    #[test]
    fn construction_resolves_through_the_cache() {
        let client = client_with_guild(Box::new(NoopRest));
        let interaction =
            ComponentInteraction::from_raw(&raw_interaction(button_payload()), &client).unwrap();

        assert!(interaction.in_cached_guild_channel());
        assert!(!interaction.in_private_channel());
        assert_eq!(interaction.data.custom_id(), "confirm");
        assert_eq!(interaction.user.borrow().username, "alice");

        // The member landed in the guild's container.
        let member = interaction.member().expect("member resolved");
        assert_eq!(member.borrow().nick.as_deref(), Some("al"));
        let guild = client.guilds.get("100").unwrap();
        assert!(guild.borrow().members.has("1"));

        // The message went through the channel's container.
        let channel = client.get_channel("200").unwrap();
        let channel = channel.borrow();
        let cached = channel.messages().unwrap().get("500").unwrap();
        assert!(Rc::ptr_eq(&interaction.message, &cached));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let client = client_with_guild(Box::new(NoopRest));

        let mut no_channel = button_payload();
        no_channel.as_object_mut().unwrap().remove("channel_id");
        let err = ComponentInteraction::from_raw(&raw_interaction(no_channel), &client).unwrap_err();
        assert!(matches!(err.kind(), ErrorType::MissingField { field: "channel_id" }));

        let mut no_user = button_payload();
        no_user.as_object_mut().unwrap().remove("member");
        let err = ComponentInteraction::from_raw(&raw_interaction(no_user), &client).unwrap_err();
        assert!(matches!(err.kind(), ErrorType::MissingField { field: "user" }));
    }

    #[test]
    fn select_menu_data_carries_values() {
        let client = client_with_guild(Box::new(NoopRest));
        let mut payload = button_payload();
        payload["data"] = json!({
            "component_type": 3,
            "custom_id": "pick",
            "values": ["a", "b"]
        });
        let interaction =
            ComponentInteraction::from_raw(&raw_interaction(payload), &client).unwrap();

        let ComponentInteractionData::SelectMenu { kind, custom_id, values } = &interaction.data
        else {
            panic!("expected select menu data");
        };
        assert_eq!(*kind, 3);
        assert_eq!(custom_id, "pick");
        assert_eq!(values, &["a", "b"]);
    }

    #[test]
    fn non_string_selects_keep_their_component_type() {
        let client = client_with_guild(Box::new(NoopRest));
        let mut payload = button_payload();
        payload["data"] = json!({
            "component_type": 5,
            "custom_id": "pick-user",
            "values": ["7"]
        });
        let interaction =
            ComponentInteraction::from_raw(&raw_interaction(payload), &client).unwrap();

        let ComponentInteractionData::SelectMenu { kind, .. } = &interaction.data else {
            panic!("expected select menu data");
        };
        assert_eq!(*kind, 5);
        assert_eq!(interaction.serialize()["data"]["componentType"], 5);
    }

    #[test]
    fn guild_accessor_distinguishes_uncached_from_private() {
        let client = client_with_guild(Box::new(NoopRest));

        let cached =
            ComponentInteraction::from_raw(&raw_interaction(button_payload()), &client).unwrap();
        assert!(cached.guild().unwrap().is_some());

        let mut uncached_payload = button_payload();
        uncached_payload["guild_id"] = json!("999");
        let uncached =
            ComponentInteraction::from_raw(&raw_interaction(uncached_payload), &client).unwrap();
        let err = uncached.guild().unwrap_err();
        assert_eq!(*err.kind(), ErrorType::GuildUncached);
        assert!(!uncached.in_cached_guild_channel());

        let mut private_payload = button_payload();
        private_payload.as_object_mut().unwrap().remove("guild_id");
        private_payload.as_object_mut().unwrap().remove("member");
        private_payload["user"] = json!({"id": "1", "username": "alice"});
        let private =
            ComponentInteraction::from_raw(&raw_interaction(private_payload), &client).unwrap();
        assert!(private.guild().unwrap().is_none());
        assert!(private.in_private_channel());
    }

    #[test]
    fn only_one_initial_response_reaches_the_transport() {
        let rest = RecordingRest::default();
        let client = client_with_guild(Box::new(rest.clone()));
        let interaction =
            ComponentInteraction::from_raw(&raw_interaction(button_payload()), &client).unwrap();

        interaction.defer(None).unwrap();
        assert!(interaction.acknowledged());

        let err = interaction
            .create_message(InteractionContent::new().content("late"))
            .unwrap_err();
        assert_eq!(*err.kind(), ErrorType::AlreadyAcknowledged);

        let err = interaction.defer_update().unwrap_err();
        assert_eq!(*err.kind(), ErrorType::AlreadyAcknowledged);

        // The rejected attempts never touched the wire.
        assert_eq!(rest.call_count(), 1);
        assert_eq!(
            rest.calls.borrow()[0],
            "create_interaction_response 900 type=5"
        );
    }

    #[test]
    fn acknowledged_survives_a_failed_send() {
        // NoopRest rejects everything, but the flag is consumed first.
        let client = client_with_guild(Box::new(NoopRest));
        let interaction =
            ComponentInteraction::from_raw(&raw_interaction(button_payload()), &client).unwrap();

        let err = interaction.defer(None).unwrap_err();
        assert!(matches!(err.kind(), ErrorType::Unsupported { .. }));
        assert!(interaction.acknowledged());
    }

    #[test]
    fn followups_do_not_touch_the_acknowledged_flag() {
        let client = client_with_guild(Box::new(NoopRest));
        let interaction =
            ComponentInteraction::from_raw(&raw_interaction(button_payload()), &client).unwrap();

        // Unimplemented on the transport, but the flag is untouched either way.
        let _ = interaction.create_followup(&InteractionContent::new().content("hi"));
        assert!(!interaction.acknowledged());
    }

    #[test]
    fn debug_output_omits_the_token() {
        let client = client_with_guild(Box::new(NoopRest));
        let interaction =
            ComponentInteraction::from_raw(&raw_interaction(button_payload()), &client).unwrap();

        let rendered = format!("{interaction:?}");
        assert!(rendered.contains("ComponentInteraction"));
        assert!(!rendered.contains("tok"));
    }

    #[test]
    fn snapshot_omits_the_token() {
        let client = client_with_guild(Box::new(NoopRest));
        let interaction =
            ComponentInteraction::from_raw(&raw_interaction(button_payload()), &client).unwrap();

        let snapshot = interaction.serialize();
        assert_eq!(snapshot["guildID"], "100");
        assert_eq!(snapshot["data"]["customID"], "confirm");
        assert!(snapshot.get("token").is_none());
    }
}
