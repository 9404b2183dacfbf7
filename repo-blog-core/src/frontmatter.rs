//! Leading `---` delimited YAML metadata blocks.
//!
//! The same delimiter and key set are used when writing formatted posts
//! and when reading them back for publishing, so the two always agree.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

pub const DELIMITER: &str = "---";

/// Byte range of the metadata block and where the body begins.
struct Block<'a> {
    yaml: &'a str,
    body: &'a str,
}

fn locate(text: &str) -> Option<Block<'_>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (first, rest) = text.split_once('\n')?;
    if first.trim_end() != DELIMITER {
        return None;
    }
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Some(Block {
                yaml: &rest[..offset],
                body: &rest[offset + line.len()..],
            });
        }
        offset += line.len();
    }
    None
}

/// Split `text` into its metadata mapping and body.
///
/// Returns `(None, text)` when there is no block, the block is not closed,
/// or it does not parse as a YAML mapping. An empty block yields an empty
/// mapping.
pub fn split(text: &str) -> (Option<Mapping>, &str) {
    let Some(block) = locate(text) else {
        return (None, text);
    };
    match serde_yaml::from_str::<Value>(block.yaml) {
        Ok(Value::Mapping(map)) => (Some(map), block.body.trim_start_matches(['\r', '\n'])),
        Ok(Value::Null) => (Some(Mapping::new()), block.body.trim_start_matches(['\r', '\n'])),
        Ok(_) | Err(_) => {
            tracing::debug!("Leading block is not a YAML mapping, treating file as body");
            (None, text)
        }
    }
}

/// Render a metadata value on a single line.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Tagged(tagged) => display_value(&tagged.value),
        Value::Mapping(_) => serde_yaml::to_string(value)
            .map(|s| s.trim_end().replace('\n', "; "))
            .unwrap_or_default(),
    }
}

/// Metadata block of an article ready for the developer blog platform.
///
/// Serialized key order is fixed: `title`, `published`, then the optional
/// keys in declaration order, then any unrecognized keys, which pass
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleFrontMatter {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "tag_list"
    )]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Tags may be written as a YAML list or as one comma-separated string.
fn tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Joined(String),
        Missing(()),
    }

    Ok(match Tags::deserialize(deserializer)? {
        Tags::List(tags) => tags,
        Tags::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Tags::Missing(()) => Vec::new(),
    })
}

impl ArticleFrontMatter {
    /// Serialize as a complete `---` block followed by `body`.
    pub fn render(&self, body: &str) -> Result<String, serde_yaml::Error> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n\n{body}"))
    }

    /// Parse the leading block of `text`, returning it with the body.
    ///
    /// A document without a block yields the default (empty) metadata.
    pub fn parse(text: &str) -> Result<(Self, &str), serde_yaml::Error> {
        match split(text) {
            (Some(map), body) => {
                let meta = serde_yaml::from_value(Value::Mapping(map))?;
                Ok((meta, body))
            }
            (None, body) => Ok((Self::default(), body)),
        }
    }
}
