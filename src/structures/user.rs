//! Users.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::client::{Client, WeakClient};
use crate::collection::Shared;
use crate::structures::Entity;
use crate::wire::{RawUser, Snowflake};

#[derive(Debug)]
pub struct User {
    client: WeakClient,
    id: Snowflake,
    pub username: String,
    pub discriminator: Option<String>,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
    pub system: bool,
    pub accent_color: Option<u32>,
    pub banner: Option<String>,
    pub public_flags: Option<u64>,
}

impl User {
    pub fn client(&self) -> Option<Client> {
        self.client.upgrade()
    }

    /// `Username#Discriminator`, or just `Username` under the new username
    /// system.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some("0") | None => self.username.clone(),
            Some(disc) => format!("{}#{}", self.username, disc),
        }
    }

    /// Returns the CDN URL for the user's avatar, or `None` if no avatar is
    /// set.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{}.png", self.id, hash))
    }
}

impl Entity for User {
    type Raw = RawUser;

    fn raw_id(data: &RawUser) -> &str {
        &data.id
    }

    fn id(&self) -> &Snowflake {
        &self.id
    }

    fn hydrate(data: &RawUser, client: WeakClient) -> Self {
        let mut user = Self {
            client,
            id: data.id.clone(),
            username: String::new(),
            discriminator: None,
            global_name: None,
            avatar: None,
            bot: data.bot,
            system: data.system,
            accent_color: None,
            banner: None,
            public_flags: None,
        };
        user.update(data);
        user
    }

    fn update(&mut self, data: &RawUser) {
        // A user object on the wire is always complete, so the core identity
        // fields are authoritative; profile extras only arrive on some
        // endpoints and are merged by presence.
        self.username = data.username.clone();
        self.discriminator = data.discriminator.clone();
        self.global_name = data.global_name.clone();
        self.avatar = data.avatar.clone();
        self.bot = data.bot;
        self.system = data.system;
        if let Some(color) = data.accent_color {
            self.accent_color = Some(color);
        }
        if let Some(banner) = &data.banner {
            self.banner = Some(banner.clone());
        }
        if let Some(flags) = data.public_flags {
            self.public_flags = Some(flags);
        }
    }

    fn serialize(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "username": self.username,
            "discriminator": self.discriminator,
            "globalName": self.global_name,
            "avatar": self.avatar,
            "bot": self.bot,
            "system": self.system,
            "accentColor": self.accent_color,
            "banner": self.banner,
            "publicFlags": self.public_flags,
        })
    }
}

/// Resolve a raw user through the client's user registry, falling back to a
/// standalone construct when the client is gone.
pub(crate) fn resolve_user(data: &RawUser, client: &WeakClient) -> Shared<User> {
    match client.upgrade() {
        Some(client) => client.users.update(data),
        None => Rc::new(RefCell::new(User::hydrate(data, client.clone()))),
    }
}
