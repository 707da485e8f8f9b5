//! Guild members.
//!
//! A member is keyed by its user ID within one guild's member container. The
//! wire often delivers member objects without an embedded `user` (message
//! mentions, interaction payloads), so hydration takes the user object the
//! caller resolved separately; that is why members go through
//! [`Guild::update_member`] rather than the type-directed container path.
//!
//! [`Guild::update_member`]: crate::structures::Guild::update_member

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::client::{Client, WeakClient};
use crate::collection::Shared;
use crate::structures::user::resolve_user;
use crate::structures::{Entity, User};
use crate::wire::{RawMember, RawUser, Snowflake};

#[derive(Debug)]
pub struct Member {
    client: WeakClient,
    /// Same ID as the member's user.
    id: Snowflake,
    pub guild_id: Snowflake,
    pub user: Shared<User>,
    pub nick: Option<String>,
    pub roles: Vec<Snowflake>,
    pub joined_at: Option<DateTime<Utc>>,
    pub premium_since: Option<DateTime<Utc>>,
    pub avatar: Option<String>,
    pub pending: bool,
    pub deaf: bool,
    pub mute: bool,
    pub communication_disabled_until: Option<DateTime<Utc>>,
}

impl Member {
    pub(crate) fn new(
        user: &RawUser,
        data: &RawMember,
        guild_id: &str,
        client: WeakClient,
    ) -> Self {
        let resolved = resolve_user(user, &client);
        let mut member = Self {
            client,
            id: user.id.clone(),
            guild_id: guild_id.to_string(),
            user: resolved,
            nick: None,
            roles: Vec::new(),
            joined_at: None,
            premium_since: None,
            avatar: None,
            pending: false,
            deaf: false,
            mute: false,
            communication_disabled_until: None,
        };
        member.merge(data);
        member
    }

    /// Merge a partial member payload; absent fields are left untouched.
    pub(crate) fn merge(&mut self, data: &RawMember) {
        if let Some(user) = &data.user {
            self.user = resolve_user(user, &self.client);
        }
        if let Some(nick) = &data.nick {
            self.nick = Some(nick.clone());
        }
        if let Some(roles) = &data.roles {
            self.roles = roles.clone();
        }
        if let Some(joined_at) = data.joined_at {
            self.joined_at = Some(joined_at);
        }
        if let Some(premium_since) = data.premium_since {
            self.premium_since = Some(premium_since);
        }
        if let Some(avatar) = &data.avatar {
            self.avatar = Some(avatar.clone());
        }
        if let Some(pending) = data.pending {
            self.pending = pending;
        }
        if let Some(deaf) = data.deaf {
            self.deaf = deaf;
        }
        if let Some(mute) = data.mute {
            self.mute = mute;
        }
        // Tri-state: explicit null clears an active timeout.
        if let Some(until) = data.communication_disabled_until {
            self.communication_disabled_until = until;
        }
    }

    /// Re-resolve the member's user through the registry so the shared user
    /// entity reflects the latest payload.
    pub(crate) fn update_user(&mut self, user: &RawUser) {
        self.user = resolve_user(user, &self.client);
    }

    pub fn client(&self) -> Option<Client> {
        self.client.upgrade()
    }

    pub fn id(&self) -> &Snowflake {
        &self.id
    }

    /// Snapshot; embeds the user snapshot.
    pub fn serialize(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "guildID": self.guild_id,
            "user": self.user.borrow().serialize(),
            "nick": self.nick,
            "roles": self.roles,
            "joinedAt": self.joined_at,
            "premiumSince": self.premium_since,
            "avatar": self.avatar,
            "pending": self.pending,
            "deaf": self.deaf,
            "mute": self.mute,
            "communicationDisabledUntil": self.communication_disabled_until,
        })
    }
}
