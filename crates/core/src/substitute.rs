//! `{{placeholder}}` substitution over content trees.
//!
//! Substitution is a pure copy: [`MapStrings`] rebuilds a value with every
//! string leaf passed through a function. The impls destructure each struct
//! exhaustively, so adding a field to the content schema fails to compile
//! until the visitor covers it.
//!
//! Placeholders whose key is missing (or null) are left verbatim.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::content::{
    Background, Block, BlockKind, ChartContent, ContentMetadata, ContentTree,
    CtaContent, EmbedContent, FormContent, FormField, ImageContent, QuoteContent, Section, Stat,
    StatsContent, TextContent, VideoContent,
};

/// Variable map attached to a version.
pub type VariableMap = serde_json::Map<String, Value>;

/// `{{identifier}}` where identifier is word characters and dots.
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([\w.]+)\}\}").expect("invalid placeholder pattern"));

/// Rebuilds a value with every string leaf mapped through `f`.
pub trait MapStrings: Sized {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self;
}

/// Substitutes variables into any content value, returning a new value.
pub fn substitute<T: MapStrings>(value: &T, vars: &VariableMap) -> T {
    value.map_strings(&mut |s| render(s, vars).into_owned())
}

/// Replaces placeholders in a single string.
pub fn render<'a>(text: &'a str, vars: &VariableMap) -> Cow<'a, str> {
    if !text.contains("{{") {
        return Cow::Borrowed(text);
    }

    PLACEHOLDER_REGEX.replace_all(text, |caps: &Captures| {
        match lookup(vars, &caps[1]).and_then(display_value) {
            Some(value) => value,
            None => caps[0].to_string(),
        }
    })
}

/// Placeholder keys referenced by a string, in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    PLACEHOLDER_REGEX
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Whether any string leaf still holds a placeholder after substitution.
pub fn has_unresolved<T: MapStrings>(value: &T, vars: &VariableMap) -> bool {
    let mut found = false;
    value.map_strings(&mut |s| {
        if placeholders(s)
            .iter()
            .any(|key| lookup(vars, key).and_then(display_value).is_none())
        {
            found = true;
        }
        s.to_string()
    });
    found
}

/// Resolves a key, first verbatim then as a dotted path into nested values.
fn lookup<'v>(vars: &'v VariableMap, key: &str) -> Option<&'v Value> {
    if let Some(value) = vars.get(key) {
        return Some(value);
    }

    let mut parts = key.split('.');
    let mut current = vars.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String form of a variable; `None` for null.
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

// === Visitor impls ===

impl MapStrings for String {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        f(self)
    }
}

impl<T: MapStrings> MapStrings for Option<T> {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        self.as_ref().map(|v| v.map_strings(f))
    }
}

impl<T: MapStrings> MapStrings for Vec<T> {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        self.iter().map(|v| v.map_strings(f)).collect()
    }
}

impl MapStrings for Value {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        match self {
            Value::String(s) => Value::String(f(s)),
            Value::Array(items) => Value::Array(items.map_strings(f)),
            Value::Object(map) => Value::Object(map.map_strings(f)),
            other => other.clone(),
        }
    }
}

impl MapStrings for serde_json::Map<String, Value> {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        self.iter()
            .map(|(k, v)| (k.clone(), v.map_strings(f)))
            .collect()
    }
}

impl MapStrings for ContentTree {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self { metadata, sections } = self;
        Self {
            metadata: metadata.map_strings(f),
            sections: sections.map_strings(f),
        }
    }
}

impl MapStrings for ContentMetadata {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            title,
            description,
            author,
            created_at,
            updated_at,
        } = self;
        Self {
            title: title.map_strings(f),
            description: description.map_strings(f),
            author: author.map_strings(f),
            created_at: *created_at,
            updated_at: *updated_at,
        }
    }
}

impl MapStrings for Section {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            id,
            title,
            layout,
            background,
            style,
            blocks,
        } = self;
        Self {
            id: id.map_strings(f),
            title: title.map_strings(f),
            layout: *layout,
            background: background.map_strings(f),
            style: style.map_strings(f),
            blocks: blocks.map_strings(f),
        }
    }
}

impl MapStrings for Background {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self { kind, value } = self;
        Self {
            kind: *kind,
            value: value.map_strings(f),
        }
    }
}

impl MapStrings for Block {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            id,
            kind,
            style,
            animation,
        } = self;
        Self {
            id: id.map_strings(f),
            kind: kind.map_strings(f),
            style: style.map_strings(f),
            animation: animation.clone(),
        }
    }
}

impl MapStrings for BlockKind {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        match self {
            Self::Text(c) => Self::Text(c.map_strings(f)),
            Self::Image(c) => Self::Image(c.map_strings(f)),
            Self::Video(c) => Self::Video(c.map_strings(f)),
            Self::Chart(c) => Self::Chart(c.map_strings(f)),
            Self::Cta(c) => Self::Cta(c.map_strings(f)),
            Self::Form(c) => Self::Form(c.map_strings(f)),
            Self::Embed(c) => Self::Embed(c.map_strings(f)),
            Self::Logo(c) => Self::Logo(c.map_strings(f)),
            Self::Stats(c) => Self::Stats(c.map_strings(f)),
            Self::Quote(c) => Self::Quote(c.map_strings(f)),
            Self::Unknown { kind, content } => Self::Unknown {
                kind: kind.map_strings(f),
                content: content.map_strings(f),
            },
        }
    }
}

impl MapStrings for TextContent {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self { text, tag, extra } = self;
        Self {
            text: text.map_strings(f),
            tag: tag.map_strings(f),
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for ImageContent {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self { url, alt, extra } = self;
        Self {
            url: url.map_strings(f),
            alt: alt.map_strings(f),
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for VideoContent {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            provider,
            video_id,
            url,
            poster,
            autoplay,
            extra,
        } = self;
        Self {
            provider: provider.map_strings(f),
            video_id: video_id.map_strings(f),
            url: url.map_strings(f),
            poster: poster.map_strings(f),
            autoplay: *autoplay,
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for ChartContent {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            title,
            chart_type,
            data,
            extra,
        } = self;
        Self {
            title: title.map_strings(f),
            chart_type: chart_type.map_strings(f),
            data: data.map_strings(f),
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for CtaContent {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            title,
            subtitle,
            description,
            price,
            regular_price,
            highlighted,
            features,
            button_text,
            button_link,
            extra,
        } = self;
        Self {
            title: title.map_strings(f),
            subtitle: subtitle.map_strings(f),
            description: description.map_strings(f),
            price: price.map_strings(f),
            regular_price: regular_price.map_strings(f),
            highlighted: *highlighted,
            features: features.map_strings(f),
            button_text: button_text.map_strings(f),
            button_link: button_link.map_strings(f),
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for FormContent {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            title,
            fields,
            submit_text,
            extra,
        } = self;
        Self {
            title: title.map_strings(f),
            fields: fields.map_strings(f),
            submit_text: submit_text.map_strings(f),
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for FormField {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            name,
            label,
            field_type,
            required,
            extra,
        } = self;
        Self {
            name: name.map_strings(f),
            label: label.map_strings(f),
            field_type: field_type.map_strings(f),
            required: *required,
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for EmbedContent {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            embed_code,
            url,
            height,
            extra,
        } = self;
        Self {
            embed_code: embed_code.map_strings(f),
            url: url.map_strings(f),
            height: height.map_strings(f),
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for StatsContent {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self { stats, extra } = self;
        Self {
            stats: stats.map_strings(f),
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for Stat {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            value,
            label,
            highlight,
            extra,
        } = self;
        Self {
            value: value.map_strings(f),
            label: label.map_strings(f),
            highlight: *highlight,
            extra: extra.map_strings(f),
        }
    }
}

impl MapStrings for QuoteContent {
    fn map_strings<F: FnMut(&str) -> String>(&self, f: &mut F) -> Self {
        let Self {
            text,
            author,
            role,
            extra,
        } = self;
        Self {
            text: text.map_strings(f),
            author: author.map_strings(f),
            role: role.map_strings(f),
            extra: extra.map_strings(f),
        }
    }
}
