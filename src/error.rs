//! Error types for cache and action operations.
//!
//! Follows the `kind` + optional boxed `source` layout used across the type
//! layer, so callers can match on [`ErrorType`] without losing the underlying
//! transport error.

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// An error produced by a cache entity or one of its action methods.
#[derive(Debug)]
pub struct Error {
    /// Type of error that occurred.
    kind: ErrorType,
    /// Source of the error, if there is any.
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    /// Immutable reference to the type of error that occurred.
    #[must_use = "retrieving the type has no effect if left unused"]
    pub const fn kind(&self) -> &ErrorType {
        &self.kind
    }

    /// Consume the error, returning the source error if there is any.
    #[must_use = "consuming the error and retrieving the source has no effect if left unused"]
    pub fn into_source(self) -> Option<Box<dyn StdError + Send + Sync>> {
        self.source
    }

    /// Consume the error, returning the owned error type and the source error.
    #[must_use = "consuming the error into its parts has no effect if left unused"]
    pub fn into_parts(self) -> (ErrorType, Option<Box<dyn StdError + Send + Sync>>) {
        (self.kind, self.source)
    }

    /// A second initial response was attempted on an already-acknowledged
    /// interaction.
    pub(crate) const fn already_acknowledged() -> Self {
        Self {
            kind: ErrorType::AlreadyAcknowledged,
            source: None,
        }
    }

    /// The interaction carries a guild ID but the guild is not cached, so
    /// "no guild" cannot be distinguished from "guild unknown".
    pub(crate) const fn guild_uncached() -> Self {
        Self {
            kind: ErrorType::GuildUncached,
            source: None,
        }
    }

    /// A webhook-specific action was invoked on a message that was not sent
    /// through a webhook.
    pub(crate) const fn webhook_required() -> Self {
        Self {
            kind: ErrorType::WebhookRequired,
            source: None,
        }
    }

    /// A payload was missing a field the caller is contractually required to
    /// provide.
    pub(crate) const fn missing_field(field: &'static str) -> Self {
        Self {
            kind: ErrorType::MissingField { field },
            source: None,
        }
    }

    /// The owning client context has been dropped.
    pub(crate) const fn client_dropped() -> Self {
        Self {
            kind: ErrorType::ClientDropped,
            source: None,
        }
    }

    /// The transport collaborator does not implement the requested action.
    pub(crate) const fn unsupported(action: &'static str) -> Self {
        Self {
            kind: ErrorType::Unsupported { action },
            source: None,
        }
    }

    /// Wrap a transport failure.
    pub fn rest(source: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            kind: ErrorType::Rest,
            source: Some(Box::new(source)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ErrorType::AlreadyAcknowledged => {
                f.write_str("interactions cannot have more than one initial response")
            }
            ErrorType::GuildUncached => f.write_str(
                "the interaction's guild is not cached; cannot distinguish it from a missing guild",
            ),
            ErrorType::WebhookRequired => f.write_str("this message is not a webhook message"),
            ErrorType::MissingField { field } => {
                write!(f, "payload is missing required field `{field}`")
            }
            ErrorType::ClientDropped => f.write_str("the owning client has been dropped"),
            ErrorType::Unsupported { action } => {
                write!(f, "the transport does not support `{action}`")
            }
            ErrorType::Rest => f.write_str("transport request failed"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn StdError + 'static))
    }
}

/// Type of [`Error`] that occurred.
#[derive(Debug, PartialEq, Eq)]
pub enum ErrorType {
    /// An initial response was already sent for this interaction.
    AlreadyAcknowledged,
    /// The interaction's guild ID is known but the guild is not cached.
    GuildUncached,
    /// A webhook-path action was called on a non-webhook message.
    WebhookRequired,
    /// A required field was absent from a payload.
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },
    /// The owning [`Client`] was dropped while an entity outlived it.
    ///
    /// [`Client`]: crate::client::Client
    ClientDropped,
    /// The transport collaborator left this action unimplemented.
    Unsupported {
        /// Name of the unimplemented action.
        action: &'static str,
    },
    /// The transport collaborator reported a failure.
    Rest,
}
