//! Typed Slack Block Kit payload elements.
//!
//! Every block variant has an explicit type and a constructor, so a
//! payload that serializes is a payload Slack will accept. Optional parts
//! (image accessory, fields grid) are omitted from the JSON entirely when
//! absent rather than serialized as null.

use serde::Serialize;

/// A single Block Kit block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Text>,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<Accessory>,
    },
    Context {
        elements: Vec<Text>,
    },
    Actions {
        elements: Vec<Element>,
    },
}

impl Block {
    /// Section with a single mrkdwn text body
    pub fn section(text: impl Into<String>) -> Self {
        Block::Section {
            text: Some(Text::mrkdwn(text)),
            fields: Vec::new(),
            accessory: None,
        }
    }

    /// Section with a mrkdwn body and an optional image accessory.
    /// When `accessory` is `None` this is a plain section.
    pub fn section_with_accessory(text: impl Into<String>, accessory: Option<Accessory>) -> Self {
        Block::Section {
            text: Some(Text::mrkdwn(text)),
            fields: Vec::new(),
            accessory,
        }
    }

    /// Section rendering a key/value fields grid
    pub fn fields(fields: Vec<Text>) -> Self {
        Block::Section {
            text: None,
            fields,
            accessory: None,
        }
    }

    /// Context footer with a single mrkdwn element
    pub fn context(text: impl Into<String>) -> Self {
        Block::Context {
            elements: vec![Text::mrkdwn(text)],
        }
    }

    /// Actions row with a single link button
    pub fn button(label: impl Into<String>, url: impl Into<String>) -> Self {
        Block::Actions {
            elements: vec![Element::Button {
                text: Text::plain(label),
                url: url.into(),
            }],
        }
    }
}

/// Text object kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Mrkdwn,
    PlainText,
}

/// A Block Kit text object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub text: String,
}

impl Text {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::Mrkdwn,
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::PlainText,
            text: text.into(),
        }
    }
}

/// Block accessory elements
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Accessory {
    Image { image_url: String, alt_text: String },
}

impl Accessory {
    /// Image accessory, present only when the product has an image
    pub fn image(url: Option<&str>, alt_text: &str) -> Option<Self> {
        url.filter(|u| !u.is_empty()).map(|u| Accessory::Image {
            image_url: u.to_string(),
            alt_text: alt_text.to_string(),
        })
    }
}

/// Interactive elements for actions blocks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button { text: Text, url: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_serialization() {
        let block = Block::section("*Status:* `processing`");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "section",
                "text": {"type": "mrkdwn", "text": "*Status:* `processing`"}
            })
        );
    }

    #[test]
    fn test_accessory_omitted_when_absent() {
        let block = Block::section_with_accessory("body", Accessory::image(None, "alt"));
        let value = serde_json::to_value(&block).unwrap();
        assert!(value.get("accessory").is_none());

        let block = Block::section_with_accessory("body", Accessory::image(Some(""), "alt"));
        let value = serde_json::to_value(&block).unwrap();
        assert!(value.get("accessory").is_none());
    }

    #[test]
    fn test_image_accessory_serialization() {
        let block = Block::section_with_accessory(
            "body",
            Accessory::image(Some("https://cdn.example.com/p.jpg"), "Walnut Desk"),
        );
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value["accessory"],
            json!({
                "type": "image",
                "image_url": "https://cdn.example.com/p.jpg",
                "alt_text": "Walnut Desk"
            })
        );
    }

    #[test]
    fn test_fields_grid() {
        let block = Block::fields(vec![
            Text::mrkdwn("*Total:* $12.00"),
            Text::mrkdwn("*Payment:* card"),
        ]);
        let value = serde_json::to_value(&block).unwrap();
        assert!(value.get("text").is_none());
        assert_eq!(value["fields"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_button_serialization() {
        let block = Block::button("View in WooCommerce", "https://shop.example/wp-admin/post.php?post=7");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "actions");
        assert_eq!(value["elements"][0]["type"], "button");
        assert_eq!(value["elements"][0]["text"]["type"], "plain_text");
    }
}
