//! Guilds.
//!
//! A guild owns three containers: its channels, its threads, and its members.
//! Caching a guild payload fans out into all three and registers the
//! channel→guild routing used by [`Client::get_channel`].
//!
//! [`Client::get_channel`]: crate::client::Client::get_channel

use serde_json::json;
use tracing::warn;

use crate::client::{Client, WeakClient};
use crate::collection::{Collection, Shared};
use crate::structures::{Channel, Entity, Member};
use crate::wire::{RawGuild, RawMember, RawUser, Snowflake};

#[derive(Debug)]
pub struct Guild {
    client: WeakClient,
    id: Snowflake,
    pub name: String,
    pub icon: Option<String>,
    pub owner_id: Option<Snowflake>,
    pub description: Option<String>,
    pub member_count: Option<u64>,
    pub large: bool,
    pub unavailable: bool,
    pub channels: Collection<Channel>,
    pub threads: Collection<Channel>,
    pub members: Collection<Member>,
}

impl Guild {
    pub fn client(&self) -> Option<Client> {
        self.client.upgrade()
    }

    /// Update-or-insert a member, keyed by user ID.
    ///
    /// The caller supplies the user object because the wire frequently splits
    /// it from the member payload (message mentions carry `user.member`,
    /// interactions carry `member.user`, message authors arrive separately).
    pub fn update_member(&self, user: &RawUser, data: &RawMember) -> Shared<Member> {
        let client = self.client.clone();
        let guild_id = self.id.clone();
        self.members.upsert_with(
            &user.id,
            || Member::new(user, data, &guild_id, client),
            |member| {
                member.update_user(user);
                member.merge(data);
            },
        )
    }
}

impl Entity for Guild {
    type Raw = RawGuild;

    fn raw_id(data: &RawGuild) -> &str {
        &data.id
    }

    fn id(&self) -> &Snowflake {
        &self.id
    }

    fn hydrate(data: &RawGuild, client: WeakClient) -> Self {
        let mut guild = Self {
            client: client.clone(),
            id: data.id.clone(),
            name: String::new(),
            icon: None,
            owner_id: None,
            description: None,
            member_count: None,
            large: false,
            unavailable: false,
            channels: Collection::new(client.clone()),
            threads: Collection::new(client.clone()),
            members: Collection::new(client),
        };
        guild.update(data);
        guild
    }

    fn update(&mut self, data: &RawGuild) {
        if let Some(name) = &data.name {
            self.name = name.clone();
        }
        if let Some(icon) = &data.icon {
            self.icon = Some(icon.clone());
        }
        if let Some(owner_id) = &data.owner_id {
            self.owner_id = Some(owner_id.clone());
        }
        if let Some(description) = &data.description {
            self.description = Some(description.clone());
        }
        if let Some(member_count) = data.member_count {
            self.member_count = Some(member_count);
        }
        if let Some(large) = data.large {
            self.large = large;
        }
        if let Some(unavailable) = data.unavailable {
            self.unavailable = unavailable;
        }

        if let Some(channels) = &data.channels {
            for raw in channels {
                self.channels.update(raw);
                if let Some(client) = self.client.upgrade() {
                    client.register_channel_guild(&raw.id, &self.id);
                }
            }
        }
        if let Some(threads) = &data.threads {
            for raw in threads {
                self.threads.update(raw);
                if let Some(client) = self.client.upgrade() {
                    client.register_thread_guild(&raw.id, &self.id);
                }
            }
        }
        if let Some(members) = &data.members {
            for raw in members {
                match &raw.user {
                    Some(user) => {
                        self.update_member(user, raw);
                    }
                    None => warn!(guild_id = %self.id, "member payload without user, skipping"),
                }
            }
        }
    }

    /// Snapshot; containers are materialized as sequences of child snapshots.
    fn serialize(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "icon": self.icon,
            "ownerID": self.owner_id,
            "description": self.description,
            "memberCount": self.member_count,
            "large": self.large,
            "unavailable": self.unavailable,
            "channels": self.channels.map(|c| c.serialize()),
            "threads": self.threads.map(|t| t.serialize()),
            "members": self.members.map(|m| m.serialize()),
        })
    }
}
