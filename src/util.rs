//! Shared helpers: mention scanning, reaction keying, component parsing, and
//! serde glue for tri-state (absent / null / value) fields.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::wire::{RawComponent, RawEmoji, RawSelectOption, Snowflake};

/// Channel mention token: `<#id>` where the ID is a 17–21 digit snowflake.
/// Shorter or longer digit runs are not valid IDs and must not match.
static CHANNEL_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<#(\d{17,21})>").expect("static pattern compiles"));

/// Extract the channel IDs mentioned in message content.
pub fn channel_mentions(content: &str) -> Vec<Snowflake> {
    CHANNEL_MENTION
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// The identity key a reaction is cached under: `name:id` for custom emoji,
/// the bare name for unicode emoji.
pub fn emoji_key(emoji: &RawEmoji) -> String {
    let name = emoji.name.as_deref().unwrap_or_default();
    match &emoji.id {
        Some(id) => format!("{name}:{id}"),
        None => name.to_string(),
    }
}

/// Deserialize a field that distinguishes "absent" from "explicitly null":
/// absent stays `None` (via `#[serde(default)]`), `null` becomes `Some(None)`,
/// and a value becomes `Some(Some(value))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Component parsing
// ---------------------------------------------------------------------------

/// A message component in parsed form, as stored on a cached message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParsedComponent {
    ActionRow {
        components: Vec<ParsedComponent>,
    },
    Button {
        custom_id: Option<String>,
        label: Option<String>,
        style: Option<u8>,
        url: Option<String>,
        disabled: bool,
        emoji: Option<RawEmoji>,
    },
    SelectMenu {
        /// The raw component type (3, 5, 6, 7, or 8).
        kind: u8,
        custom_id: Option<String>,
        placeholder: Option<String>,
        min_values: Option<u8>,
        max_values: Option<u8>,
        options: Vec<RawSelectOption>,
        disabled: bool,
    },
    TextInput {
        custom_id: Option<String>,
        label: Option<String>,
        style: Option<u8>,
        value: Option<String>,
        required: Option<bool>,
    },
    Unknown {
        kind: u8,
    },
}

/// Parse raw wire components into their typed representation.
///
/// Pure function; performs no cache interaction.
pub fn components_to_parsed(raw: &[RawComponent]) -> Vec<ParsedComponent> {
    raw.iter().map(component_to_parsed).collect()
}

fn component_to_parsed(raw: &RawComponent) -> ParsedComponent {
    match raw.kind {
        1 => ParsedComponent::ActionRow {
            components: components_to_parsed(&raw.components),
        },
        2 => ParsedComponent::Button {
            custom_id: raw.custom_id.clone(),
            label: raw.label.clone(),
            style: raw.style,
            url: raw.url.clone(),
            disabled: raw.disabled.unwrap_or(false),
            emoji: raw.emoji.clone(),
        },
        kind @ (3 | 5 | 6 | 7 | 8) => ParsedComponent::SelectMenu {
            kind,
            custom_id: raw.custom_id.clone(),
            placeholder: raw.placeholder.clone(),
            min_values: raw.min_values,
            max_values: raw.max_values,
            options: raw.options.clone(),
            disabled: raw.disabled.unwrap_or(false),
        },
        4 => ParsedComponent::TextInput {
            custom_id: raw.custom_id.clone(),
            label: raw.label.clone(),
            style: raw.style,
            value: raw.value.clone(),
            required: raw.required,
        },
        kind => ParsedComponent::Unknown { kind },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_mentions_respects_digit_floor() {
        let ids = channel_mentions("hello <#123456789012345678> and <#42>");
        assert_eq!(ids, vec!["123456789012345678".to_string()]);
    }

    #[test]
    fn channel_mentions_rejects_over_long_ids() {
        assert!(channel_mentions("<#1234567890123456789012345>").is_empty());
    }

    #[test]
    fn channel_mentions_collects_in_order() {
        let ids = channel_mentions("<#111111111111111111> x <#222222222222222222>");
        assert_eq!(
            ids,
            vec![
                "111111111111111111".to_string(),
                "222222222222222222".to_string()
            ]
        );
    }

    #[test]
    fn emoji_key_unicode_vs_custom() {
        let unicode: RawEmoji = serde_json::from_value(json!({"name": "fire", "id": null})).unwrap();
        assert_eq!(emoji_key(&unicode), "fire");

        let custom: RawEmoji = serde_json::from_value(json!({"name": "custom", "id": "99"})).unwrap();
        assert_eq!(emoji_key(&custom), "custom:99");
    }

    #[test]
    fn action_row_parses_recursively() {
        let raw: Vec<RawComponent> = serde_json::from_value(json!([{
            "type": 1,
            "components": [
                {"type": 2, "style": 1, "label": "go", "custom_id": "go-btn"},
                {"type": 3, "custom_id": "pick", "options": [
                    {"label": "a", "value": "a"}
                ]}
            ]
        }]))
        .unwrap();

        let parsed = components_to_parsed(&raw);
        let ParsedComponent::ActionRow { components } = &parsed[0] else {
            panic!("expected action row");
        };
        assert!(matches!(
            &components[0],
            ParsedComponent::Button { custom_id: Some(id), .. } if id == "go-btn"
        ));
        assert!(matches!(
            &components[1],
            ParsedComponent::SelectMenu { kind: 3, options, .. } if options.len() == 1
        ));
    }

    #[test]
    fn unknown_component_kind_is_preserved() {
        let raw: Vec<RawComponent> = serde_json::from_value(json!([{"type": 99}])).unwrap();
        assert!(matches!(
            components_to_parsed(&raw)[0],
            ParsedComponent::Unknown { kind: 99 }
        ));
    }
}
