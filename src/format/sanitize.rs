//! Free-text sanitization for Slack mrkdwn.
//!
//! Customer notes, addresses, and review bodies arrive as HTML fragments.
//! Before they are embedded in a block, `<br>` tags become newlines, HTML
//! entities are decoded, and any remaining markup is stripped. The order
//! matters: decoding before stripping means entity-encoded tags are also
//! removed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z][a-zA-Z0-9]*);").expect("valid regex"));

/// Convert an HTML fragment to plain text suitable for a mrkdwn block.
///
/// `<br>` variants become newlines, entities are decoded, remaining tags
/// are stripped, and the result is trimmed.
pub fn sanitize_markdown(input: &str) -> String {
    let text = BR_RE.replace_all(input, "\n");
    let text = decode_entities(&text);
    let text = TAG_RE.replace_all(&text, "");
    text.trim().to_string()
}

/// Decode named, decimal, and hex HTML entities
fn decode_entities(input: &str) -> String {
    ENTITY_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            match decode_entity(body) {
                Some(decoded) => Cow::Owned(decoded),
                None => Cow::Owned(caps[0].to_string()),
            }
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        let code = u32::from_str_radix(hex, 16).ok()?;
        return char::from_u32(code).map(|c| c.to_string());
    }
    if let Some(dec) = body.strip_prefix('#') {
        let code = dec.parse::<u32>().ok()?;
        return char::from_u32(code).map(|c| c.to_string());
    }

    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "hellip" => "…",
        "ndash" => "–",
        "mdash" => "—",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "pound" => "£",
        "euro" => "€",
        "yen" => "¥",
        "cent" => "¢",
        _ => return None,
    };
    Some(decoded.to_string())
}
