//! Message attachments.
//!
//! Attachments live in a sub-container on each message. Unlike reactions,
//! the wire payload is authoritative for the full set: the message merge
//! deletes cached attachments absent from a new payload's list before
//! updating or inserting the rest.

use serde_json::json;

use crate::client::{Client, WeakClient};
use crate::structures::Entity;
use crate::wire::{RawAttachment, Snowflake};

#[derive(Debug)]
pub struct Attachment {
    client: WeakClient,
    id: Snowflake,
    pub filename: String,
    pub size: u64,
    pub url: String,
    pub proxy_url: String,
    pub content_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub description: Option<String>,
    pub ephemeral: bool,
}

impl Attachment {
    pub fn client(&self) -> Option<Client> {
        self.client.upgrade()
    }
}

impl Entity for Attachment {
    type Raw = RawAttachment;

    fn raw_id(data: &RawAttachment) -> &str {
        &data.id
    }

    fn id(&self) -> &Snowflake {
        &self.id
    }

    fn hydrate(data: &RawAttachment, client: WeakClient) -> Self {
        let mut attachment = Self {
            client,
            id: data.id.clone(),
            filename: String::new(),
            size: 0,
            url: String::new(),
            proxy_url: String::new(),
            content_type: None,
            width: None,
            height: None,
            description: None,
            ephemeral: data.ephemeral,
        };
        attachment.update(data);
        attachment
    }

    fn update(&mut self, data: &RawAttachment) {
        self.filename = data.filename.clone();
        self.size = data.size;
        self.url = data.url.clone();
        self.proxy_url = data.proxy_url.clone();
        self.content_type = data.content_type.clone();
        self.width = data.width;
        self.height = data.height;
        self.description = data.description.clone();
        self.ephemeral = data.ephemeral;
    }

    fn serialize(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "filename": self.filename,
            "size": self.size,
            "url": self.url,
            "proxyURL": self.proxy_url,
            "contentType": self.content_type,
            "width": self.width,
            "height": self.height,
            "description": self.description,
            "ephemeral": self.ephemeral,
        })
    }
}
