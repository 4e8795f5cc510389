//! Front matter parsing for content files.
//!
//! Parsing is lenient: a block that fails to parse, or a field with the wrong
//! shape, falls back to defaults instead of failing the build.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::config::Params;

/// Keys interpreted by the parser. Everything else lands in `params`.
const RESERVED_KEYS: &[&str] = &[
    "title",
    "date",
    "draft",
    "description",
    "tags",
    "categories",
    "slug",
    "layout",
    "type",
    "weight",
    "params",
    "menu",
    "menus",
];

/// Front matter metadata for content files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// Explicit page title.
    pub title: Option<String>,

    /// Publication date.
    pub date: Option<DateTime<Utc>>,

    /// Whether this is a draft.
    pub draft: bool,

    /// Page description for meta tags and summaries.
    pub description: String,

    /// Tags for the page.
    pub tags: Vec<String>,

    /// Categories for the page.
    pub categories: Vec<String>,

    /// Explicit URL slug.
    pub slug: Option<String>,

    /// Layout override for template selection.
    pub layout: Option<String>,

    /// Explicit content type.
    pub content_type: Option<String>,

    /// Sort weight.
    pub weight: i32,

    /// Custom parameters.
    pub params: Params,

    /// Menus this page registers itself in.
    pub menus: Vec<MenuReference>,
}

/// A menu registration declared in front matter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuReference {
    /// Menu name (e.g., "main").
    pub menu: String,

    /// Display name; defaults to the page title.
    pub name: Option<String>,

    /// Identifier; defaults to the page permalink.
    pub identifier: Option<String>,

    /// Identifier of the parent entry.
    pub parent: Option<String>,

    /// Sort weight.
    pub weight: i32,

    /// HTML emitted before the link.
    pub pre: String,

    /// HTML emitted after the link.
    pub post: String,

    /// Extra parameters.
    pub params: Params,
}

/// Delimiter types for front matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterFormat {
    /// YAML front matter delimited by `---`.
    Yaml,
    /// TOML front matter delimited by `+++`.
    Toml,
}

impl FrontMatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Split content into front matter and body.
///
/// The closing delimiter must start a line.
pub fn split_front_matter(content: &str) -> Option<(FrontMatterFormat, &str, &str)> {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    let format = if content.starts_with("---") {
        FrontMatterFormat::Yaml
    } else if content.starts_with("+++") {
        FrontMatterFormat::Toml
    } else {
        return None;
    };

    let delimiter = format.delimiter();
    let after_first = &content[delimiter.len()..];
    let closing = format!("\n{delimiter}");
    let closing_pos = after_first.find(&closing)?;

    let front_matter = after_first[..closing_pos].trim();
    let body = after_first[closing_pos + closing.len()..].trim_start();

    Some((format, front_matter, body))
}

/// Parse front matter from a content file.
///
/// Never fails: malformed blocks are logged and replaced by defaults.
pub fn parse_front_matter(content: &str, path: &Path) -> (FrontMatter, String) {
    let Some((format, raw, body)) = split_front_matter(content) else {
        return (FrontMatter::default(), content.to_string());
    };

    let parsed = match format {
        FrontMatterFormat::Yaml => {
            serde_yaml::from_str::<Value>(raw).map_err(|e| e.to_string())
        }
        FrontMatterFormat::Toml => raw
            .parse::<toml::Table>()
            .map(|table| toml_to_json(toml::Value::Table(table)))
            .map_err(|e| e.to_string()),
    };

    match parsed {
        Ok(Value::Object(map)) => (FrontMatter::from_map(&map), body.to_string()),
        Ok(Value::Null) => (FrontMatter::default(), body.to_string()),
        Ok(_) => {
            warn!(path = %path.display(), "front matter is not a mapping, using defaults");
            (FrontMatter::default(), body.to_string())
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "malformed front matter, using defaults");
            (FrontMatter::default(), body.to_string())
        }
    }
}

impl FrontMatter {
    fn from_map(map: &serde_json::Map<String, Value>) -> Self {
        let mut params: Params = map
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(Value::Object(explicit)) = map.get("params") {
            params.extend(explicit.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let menus = map
            .get("menu")
            .or_else(|| map.get("menus"))
            .map(menu_references)
            .unwrap_or_default();

        Self {
            title: map.get("title").and_then(as_string),
            date: map.get("date").and_then(as_string).and_then(|s| parse_date(&s)),
            draft: map.get("draft").is_some_and(as_bool),
            description: map
                .get("description")
                .and_then(as_string)
                .unwrap_or_default(),
            tags: map.get("tags").map(as_string_list).unwrap_or_default(),
            categories: map.get("categories").map(as_string_list).unwrap_or_default(),
            slug: non_empty(map.get("slug").and_then(as_string)),
            layout: non_empty(map.get("layout").and_then(as_string)),
            content_type: non_empty(map.get("type").and_then(as_string)),
            weight: map.get("weight").map(as_i32).unwrap_or_default(),
            params,
            menus,
        }
    }
}

/// Parse a date in any of the accepted front matter formats.
///
/// Dates without an offset are interpreted as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn menu_references(value: &Value) -> Vec<MenuReference> {
    match value {
        Value::String(name) => vec![MenuReference {
            menu: name.clone(),
            ..Default::default()
        }],
        Value::Array(items) => items
            .iter()
            .filter_map(as_string)
            .map(|menu| MenuReference {
                menu,
                ..Default::default()
            })
            .collect(),
        Value::Object(menus) => menus
            .iter()
            .map(|(menu, settings)| {
                let field = |key: &str| settings.get(key).and_then(as_string);
                MenuReference {
                    menu: menu.clone(),
                    name: non_empty(field("name")),
                    identifier: non_empty(field("identifier")),
                    parent: non_empty(field("parent")),
                    weight: settings.get("weight").map(as_i32).unwrap_or_default(),
                    pre: field("pre").unwrap_or_default(),
                    post: field("post").unwrap_or_default(),
                    params: match settings.get("params") {
                        Some(Value::Object(p)) => {
                            p.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
                        }
                        _ => Params::new(),
                    },
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
        _ => false,
    }
}

fn as_i32(value: &Value) -> i32 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

fn as_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_string).collect(),
        other => as_string(other).into_iter().collect(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Convert a TOML value into JSON, rendering datetimes as strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
