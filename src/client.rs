//! The client-wide registry handle.
//!
//! [`Client`] owns the top-level caches (users, guilds, DM channels) that
//! entity update routines fan out into, plus the channel→guild routing maps
//! that let [`Client::get_channel`] find a guild channel or thread without a
//! global channel container. Entities keep a [`WeakClient`] back-reference;
//! the strong edges all point downward (client → container → entity), so the
//! graph has no ownership cycles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::collection::{Collection, Shared};
use crate::rest::Rest;
use crate::structures::{Channel, Guild, User};
use crate::wire::Snowflake;

/// Shared handle to the client-wide registries.
///
/// Cheap to clone; all clones refer to the same caches.
#[derive(Clone)]
pub struct Client {
    inner: Rc<ClientInner>,
}

/// Non-owning handle recorded by every cached entity.
#[derive(Clone, Debug)]
pub struct WeakClient {
    inner: Weak<ClientInner>,
}

impl WeakClient {
    /// Attempt to reach the owning client. Returns `None` once the client has
    /// been dropped, at which point reference resolution degrades to stubs.
    pub fn upgrade(&self) -> Option<Client> {
        self.inner.upgrade().map(|inner| Client { inner })
    }

    /// A back-reference that never upgrades, for standalone entities.
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }
}

pub struct ClientInner {
    /// Every user seen in any payload.
    pub users: Collection<User>,
    /// Guilds, each owning its channel, thread, and member containers.
    pub guilds: Collection<Guild>,
    /// Direct-message channels, keyed by the same ID space as guild channels.
    pub private_channels: Collection<Channel>,
    channel_guild_map: RefCell<HashMap<Snowflake, Snowflake>>,
    thread_guild_map: RefCell<HashMap<Snowflake, Snowflake>>,
    rest: Box<dyn Rest>,
}

impl Client {
    pub fn new(rest: Box<dyn Rest>) -> Self {
        let inner = Rc::new_cyclic(|weak| {
            let client = WeakClient {
                inner: weak.clone(),
            };
            ClientInner {
                users: Collection::new(client.clone()),
                guilds: Collection::new(client.clone()),
                private_channels: Collection::new(client),
                channel_guild_map: RefCell::new(HashMap::new()),
                thread_guild_map: RefCell::new(HashMap::new()),
                rest,
            }
        });
        Self { inner }
    }

    pub fn downgrade(&self) -> WeakClient {
        WeakClient {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The transport collaborator actions delegate to.
    pub fn rest(&self) -> &dyn Rest {
        &*self.inner.rest
    }

    /// Look up any channel the client knows about: guild channels and threads
    /// are routed through their owning guild, DM channels are checked last.
    /// No side effects; a miss means the channel is simply not cached.
    pub fn get_channel(&self, id: &str) -> Option<Shared<Channel>> {
        if let Some(guild_id) = self.channel_guild_map.borrow().get(id) {
            if let Some(guild) = self.guilds.get(guild_id) {
                return guild.borrow().channels.get(id);
            }
        }
        if let Some(guild_id) = self.thread_guild_map.borrow().get(id) {
            if let Some(guild) = self.guilds.get(guild_id) {
                return guild.borrow().threads.get(id);
            }
        }
        self.private_channels.get(id)
    }

    pub(crate) fn register_channel_guild(&self, channel_id: &str, guild_id: &str) {
        self.channel_guild_map
            .borrow_mut()
            .insert(channel_id.to_string(), guild_id.to_string());
    }

    pub(crate) fn register_thread_guild(&self, thread_id: &str, guild_id: &str) {
        debug!(thread_id, guild_id, "mapping thread to guild");
        self.thread_guild_map
            .borrow_mut()
            .insert(thread_id.to_string(), guild_id.to_string());
    }
}

impl Deref for Client {
    type Target = ClientInner;

    fn deref(&self) -> &ClientInner {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testing::NoopRest;
    use serde_json::json;
    use static_assertions::assert_impl_all;

    assert_impl_all!(WeakClient: Clone, std::fmt::Debug);

    fn client() -> Client {
        Client::new(Box::new(NoopRest))
    }

    #[test]
    fn get_channel_routes_through_owning_guild() {
        let client = client();
        client.guilds.update(
            &serde_json::from_value(json!({
                "id": "100",
                "name": "guild",
                "channels": [{"id": "200", "type": 0, "guild_id": "100", "name": "general"}]
            }))
            .unwrap(),
        );

        let channel = client.get_channel("200").expect("channel cached");
        assert_eq!(channel.borrow().id(), "200");
        assert!(client.get_channel("999").is_none());
    }

    #[test]
    fn get_channel_finds_guild_threads() {
        let client = client();
        client.guilds.update(
            &serde_json::from_value(json!({
                "id": "100",
                "name": "guild",
                "threads": [{"id": "300", "type": 11, "guild_id": "100", "parent_id": "200"}]
            }))
            .unwrap(),
        );

        let thread = client.get_channel("300").expect("thread cached");
        assert!(thread.borrow().kind().is_thread());
    }

    #[test]
    fn get_channel_falls_back_to_dm_channels() {
        let client = client();
        client.private_channels.update(
            &serde_json::from_value(json!({
                "id": "400",
                "type": 1,
                "recipients": [{"id": "5", "username": "pen-pal"}]
            }))
            .unwrap(),
        );

        assert!(client.get_channel("400").is_some());
        // The recipient was fanned out into the user registry.
        assert!(client.users.has("5"));
    }

    #[test]
    fn dropped_client_stops_upgrading() {
        let weak = client().downgrade();
        assert!(weak.upgrade().is_none());
        assert!(WeakClient::detached().upgrade().is_none());
    }
}
