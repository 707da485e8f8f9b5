//! Raw wire-shape types.
//!
//! These mirror the Discord API docs so payloads from REST responses and
//! gateway events can be deserialized without touching `serde_json::Value`
//! elsewhere. Entities in [`crate::structures`] hydrate from these and merge
//! later partial payloads into themselves; a field that is optional here is
//! one the merge routines treat as "absent means leave untouched".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::util::double_option;

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Discord IDs are snowflakes transmitted as strings in JSON.
pub type Snowflake = String;

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr, Serialize_repr)]
#[repr(u8)]
pub enum ChannelType {
    GuildText = 0,
    Dm = 1,
    GuildVoice = 2,
    GroupDm = 3,
    GuildCategory = 4,
    GuildAnnouncement = 5,
    AnnouncementThread = 10,
    PublicThread = 11,
    PrivateThread = 12,
    GuildStageVoice = 13,
    GuildDirectory = 14,
    GuildForum = 15,
    GuildMedia = 16,
}

impl ChannelType {
    /// Whether this type is one of the thread channel types.
    pub const fn is_thread(self) -> bool {
        matches!(
            self,
            Self::AnnouncementThread | Self::PublicThread | Self::PrivateThread
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawChannel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: Option<i32>,
    pub parent_id: Option<Snowflake>,
    pub nsfw: Option<bool>,
    pub last_message_id: Option<Snowflake>,
    pub rate_limit_per_user: Option<u32>,
    pub default_auto_archive_duration: Option<u32>,
    /// Creator of a thread.
    pub owner_id: Option<Snowflake>,
    pub message_count: Option<u64>,
    pub member_count: Option<u64>,
    pub total_message_sent: Option<u64>,
    pub thread_metadata: Option<RawThreadMetadata>,
    /// Recipients of a DM channel.
    pub recipients: Option<Vec<RawUser>>,
    pub flags: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawThreadMetadata {
    pub archived: bool,
    pub auto_archive_duration: u32,
    pub archive_timestamp: Option<DateTime<Utc>>,
    pub locked: Option<bool>,
    pub invitable: Option<bool>,
    pub create_timestamp: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawUser {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: Option<String>,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub system: bool,
    pub accent_color: Option<u32>,
    pub banner: Option<String>,
    pub public_flags: Option<u64>,
}

/// A user object inside `mentions`, which may carry embedded per-guild member
/// data when the message was sent in a guild.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMentionUser {
    #[serde(flatten)]
    pub user: RawUser,
    pub member: Option<Box<RawMember>>,
}

// ---------------------------------------------------------------------------
// Guild + member
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawGuild {
    pub id: Snowflake,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub owner_id: Option<Snowflake>,
    pub description: Option<String>,
    pub member_count: Option<u64>,
    pub large: Option<bool>,
    pub unavailable: Option<bool>,
    pub channels: Option<Vec<RawChannel>>,
    pub threads: Option<Vec<RawChannel>>,
    pub members: Option<Vec<RawMember>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMember {
    pub user: Option<RawUser>,
    pub nick: Option<String>,
    pub roles: Option<Vec<Snowflake>>,
    pub joined_at: Option<DateTime<Utc>>,
    pub premium_since: Option<DateTime<Utc>>,
    pub avatar: Option<String>,
    pub pending: Option<bool>,
    pub deaf: Option<bool>,
    pub mute: Option<bool>,
    /// Tri-state: a timeout is cleared with an explicit `null`.
    #[serde(default, deserialize_with = "double_option")]
    pub communication_disabled_until: Option<Option<DateTime<Utc>>>,
    /// Total permissions in the source channel, only sent inside interactions.
    pub permissions: Option<String>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    /// Absent on `MESSAGE_UPDATE` partials; required when the message is
    /// first hydrated.
    pub author: Option<RawUser>,
    pub member: Option<RawMember>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tts: bool,
    #[serde(rename = "type", default)]
    pub kind: u8,
    pub webhook_id: Option<Snowflake>,
    pub application: Option<RawApplication>,
    pub application_id: Option<Snowflake>,
    pub activity: Option<MessageActivity>,
    pub attachments: Option<Vec<RawAttachment>>,
    pub components: Option<Vec<RawComponent>>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub edited_timestamp: Option<Option<DateTime<Utc>>>,
    pub embeds: Option<Vec<Embed>>,
    pub flags: Option<u64>,
    pub interaction: Option<RawMessageInteraction>,
    pub mention_everyone: Option<bool>,
    pub mention_roles: Option<Vec<Snowflake>>,
    pub mentions: Option<Vec<RawMentionUser>>,
    pub message_reference: Option<RawMessageReference>,
    pub nonce: Option<serde_json::Value>,
    pub pinned: Option<bool>,
    pub position: Option<i64>,
    pub reactions: Option<Vec<RawReaction>>,
    #[serde(default, deserialize_with = "double_option")]
    pub referenced_message: Option<Option<Box<RawMessage>>>,
    pub sticker_items: Option<Vec<StickerItem>>,
    pub thread: Option<RawChannel>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMessageReference {
    pub message_id: Option<Snowflake>,
    pub channel_id: Option<Snowflake>,
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub fail_if_not_exists: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMessageInteraction {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub name: String,
    pub user: RawUser,
    pub member: Option<RawMember>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageActivity {
    #[serde(rename = "type")]
    pub kind: u8,
    pub party_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StickerItem {
    pub id: Snowflake,
    pub name: String,
    pub format_type: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAttachment {
    pub id: Snowflake,
    pub filename: String,
    pub size: u64,
    pub url: String,
    pub proxy_url: String,
    pub content_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub description: Option<String>,
    #[serde(default)]
    pub ephemeral: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawReaction {
    pub count: u64,
    #[serde(default)]
    pub me: bool,
    pub emoji: RawEmoji,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawEmoji {
    /// `None` for unicode emoji, present for custom emoji.
    pub id: Option<Snowflake>,
    /// May be `None` when a custom emoji was deleted.
    pub name: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

/// Partial application object attached to interaction/webhook messages.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawApplication {
    pub id: Snowflake,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Embed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

// ---------------------------------------------------------------------------
// Components (buttons, select menus, action rows, text inputs)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawComponent {
    /// 1 = ActionRow, 2 = Button, 3 = StringSelect, 4 = TextInput,
    /// 5 = UserSelect, 6 = RoleSelect, 7 = MentionableSelect, 8 = ChannelSelect
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Button style: 1=Primary, 2=Secondary, 3=Success, 4=Danger, 5=Link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_values: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_values: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<RawSelectOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<RawComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<RawEmoji>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<RawEmoji>,
    #[serde(default)]
    pub default: bool,
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr, Serialize_repr)]
#[repr(u8)]
pub enum InteractionType {
    Ping = 1,
    ApplicationCommand = 2,
    MessageComponent = 3,
    ApplicationCommandAutocomplete = 4,
    ModalSubmit = 5,
}

/// A MESSAGE_COMPONENT interaction as received from the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawComponentInteraction {
    pub id: Snowflake,
    pub application_id: Snowflake,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub token: String,
    pub channel_id: Option<Snowflake>,
    pub guild_id: Option<Snowflake>,
    pub guild_locale: Option<String>,
    pub locale: Option<String>,
    pub app_permissions: Option<String>,
    pub member: Option<RawMember>,
    pub user: Option<RawUser>,
    pub data: RawComponentInteractionData,
    /// The message the component lives on.
    pub message: Option<Box<RawMessage>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawComponentInteractionData {
    pub component_type: u8,
    pub custom_id: String,
    pub values: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serde_test::{assert_de_tokens, Token};
    use static_assertions::assert_impl_all;

    assert_impl_all!(RawMessage: Clone, std::fmt::Debug);
    assert_impl_all!(RawChannel: Clone, std::fmt::Debug);
    assert_impl_all!(RawComponentInteraction: Clone, std::fmt::Debug);

    #[test]
    fn channel_type_from_integer() {
        assert_de_tokens(&ChannelType::PublicThread, &[Token::U8(11)]);
        assert_de_tokens(&ChannelType::GuildText, &[Token::U8(0)]);
    }

    #[test]
    fn edited_timestamp_distinguishes_null_from_absent() {
        let absent: RawMessage =
            serde_json::from_value(json!({"id": "1", "channel_id": "2"})).unwrap();
        assert!(absent.edited_timestamp.is_none());

        let null: RawMessage =
            serde_json::from_value(json!({"id": "1", "channel_id": "2", "edited_timestamp": null}))
                .unwrap();
        assert_eq!(null.edited_timestamp, Some(None));

        let set: RawMessage = serde_json::from_value(json!({
            "id": "1",
            "channel_id": "2",
            "edited_timestamp": "2024-03-01T12:00:00.000000+00:00"
        }))
        .unwrap();
        assert!(matches!(set.edited_timestamp, Some(Some(_))));
    }

    #[test]
    fn referenced_message_null_round_trips() {
        let raw: RawMessage = serde_json::from_value(json!({
            "id": "1",
            "channel_id": "2",
            "referenced_message": null
        }))
        .unwrap();
        assert!(matches!(raw.referenced_message, Some(None)));
    }

    #[test]
    fn mention_user_flattens_member() {
        let raw: RawMentionUser = serde_json::from_value(json!({
            "id": "5",
            "username": "alice",
            "member": {"nick": "al", "roles": []}
        }))
        .unwrap();
        assert_eq!(raw.user.id, "5");
        assert_eq!(raw.member.unwrap().nick.as_deref(), Some("al"));
    }

    #[test]
    fn thread_payload_deserializes() {
        let raw: RawChannel = serde_json::from_value(json!({
            "id": "9",
            "type": 11,
            "parent_id": "3",
            "name": "thread",
            "thread_metadata": {"archived": false, "auto_archive_duration": 1440}
        }))
        .unwrap();
        assert!(raw.kind.is_thread());
        assert!(!raw.thread_metadata.unwrap().archived);
    }
}
