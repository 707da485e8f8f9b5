//! The transport collaborator.
//!
//! The cache never performs I/O itself: entity action methods (`edit`, `pin`,
//! `create_reaction`, interaction responses, …) delegate to a [`Rest`]
//! implementation and hand back whatever raw payload it returns. Cache state
//! only changes when the resulting event is fed back through the normal
//! update path; nothing in this module mutates a container.
//!
//! Every method has a default body returning [`ErrorType::Unsupported`] so
//! transports (and test doubles) only implement what they use.
//!
//! [`ErrorType::Unsupported`]: crate::error::ErrorType::Unsupported

use serde::Serialize;
use serde_repr::Serialize_repr;

use crate::error::Error;
use crate::wire::{Embed, RawChannel, RawComponent, RawMessage, RawUser};

/// Narrow REST contract the cache delegates outbound actions to.
#[allow(unused_variables)]
pub trait Rest {
    fn create_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<(), Error> {
        Err(Error::unsupported("create_reaction"))
    }

    fn delete_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
        user: &str,
    ) -> Result<(), Error> {
        Err(Error::unsupported("delete_reaction"))
    }

    /// Remove all reactions, or all reactions for one emoji.
    fn delete_reactions(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: Option<&str>,
    ) -> Result<(), Error> {
        Err(Error::unsupported("delete_reactions"))
    }

    fn get_reactions(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<Vec<RawUser>, Error> {
        Err(Error::unsupported("get_reactions"))
    }

    fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        options: &EditMessageOptions,
    ) -> Result<RawMessage, Error> {
        Err(Error::unsupported("edit_message"))
    }

    fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
        reason: Option<&str>,
    ) -> Result<(), Error> {
        Err(Error::unsupported("delete_message"))
    }

    fn pin_message(&self, channel_id: &str, message_id: &str, reason: Option<&str>) -> Result<(), Error> {
        Err(Error::unsupported("pin_message"))
    }

    fn unpin_message(
        &self,
        channel_id: &str,
        message_id: &str,
        reason: Option<&str>,
    ) -> Result<(), Error> {
        Err(Error::unsupported("unpin_message"))
    }

    fn crosspost_message(&self, channel_id: &str, message_id: &str) -> Result<RawMessage, Error> {
        Err(Error::unsupported("crosspost_message"))
    }

    fn start_thread_from_message(
        &self,
        channel_id: &str,
        message_id: &str,
        options: &StartThreadOptions,
    ) -> Result<RawChannel, Error> {
        Err(Error::unsupported("start_thread_from_message"))
    }

    fn edit_webhook_message(
        &self,
        webhook_id: &str,
        token: &str,
        message_id: &str,
        options: &EditMessageOptions,
    ) -> Result<RawMessage, Error> {
        Err(Error::unsupported("edit_webhook_message"))
    }

    fn delete_webhook_message(
        &self,
        webhook_id: &str,
        token: &str,
        message_id: &str,
    ) -> Result<(), Error> {
        Err(Error::unsupported("delete_webhook_message"))
    }

    fn create_interaction_response(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), Error> {
        Err(Error::unsupported("create_interaction_response"))
    }

    fn create_followup_message(
        &self,
        application_id: &str,
        token: &str,
        content: &InteractionContent,
    ) -> Result<RawMessage, Error> {
        Err(Error::unsupported("create_followup_message"))
    }

    fn edit_followup_message(
        &self,
        application_id: &str,
        token: &str,
        message_id: &str,
        content: &InteractionContent,
    ) -> Result<RawMessage, Error> {
        Err(Error::unsupported("edit_followup_message"))
    }

    fn delete_followup_message(
        &self,
        application_id: &str,
        token: &str,
        message_id: &str,
    ) -> Result<(), Error> {
        Err(Error::unsupported("delete_followup_message"))
    }

    fn get_followup_message(
        &self,
        application_id: &str,
        token: &str,
        message_id: &str,
    ) -> Result<RawMessage, Error> {
        Err(Error::unsupported("get_followup_message"))
    }

    fn edit_original_message(
        &self,
        application_id: &str,
        token: &str,
        content: &InteractionContent,
    ) -> Result<RawMessage, Error> {
        Err(Error::unsupported("edit_original_message"))
    }

    fn delete_original_message(&self, application_id: &str, token: &str) -> Result<(), Error> {
        Err(Error::unsupported("delete_original_message"))
    }

    fn get_original_message(&self, application_id: &str, token: &str) -> Result<RawMessage, Error> {
        Err(Error::unsupported("get_original_message"))
    }
}

// ---------------------------------------------------------------------------
// Outbound bodies
// ---------------------------------------------------------------------------

/// Body for editing a message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditMessageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<RawComponent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
}

impl EditMessageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.content = Some(text.into());
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.get_or_insert_with(Vec::new).push(embed);
        self
    }
}

/// Body for starting a thread from a message.
#[derive(Debug, Clone, Serialize)]
pub struct StartThreadOptions {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_archive_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_user: Option<u32>,
}

/// An interaction response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: InteractionCallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionContent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr)]
#[repr(u8)]
pub enum InteractionCallbackType {
    Pong = 1,
    ChannelMessageWithSource = 4,
    DeferredChannelMessageWithSource = 5,
    DeferredUpdateMessage = 6,
    UpdateMessage = 7,
    ApplicationCommandAutocompleteResult = 8,
    Modal = 9,
}

/// Content of an interaction response or followup.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InteractionContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<RawComponent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    /// For modal responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

impl InteractionContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.content = Some(text.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_methods_report_unsupported() {
        let rest = testing::NoopRest;
        let err = rest.delete_message("1", "2", None).unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::error::ErrorType::Unsupported { action: "delete_message" }
        ));
    }

    #[test]
    fn edit_options_skip_absent_fields() {
        let options = EditMessageOptions::new().content("hi");
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"content":"hi"}"#);
    }

    #[test]
    fn interaction_response_type_serializes_as_integer() {
        let response = InteractionResponse {
            kind: InteractionCallbackType::DeferredChannelMessageWithSource,
            data: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"type":5}"#);
    }
}
