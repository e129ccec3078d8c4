//! Presentation content tree.
//!
//! A presentation is a list of sections, each holding blocks. Block payloads
//! are typed per kind; a block whose kind is not known to this build (or
//! whose payload does not match the kind's shape) is kept as
//! [`BlockKind::Unknown`] with its raw JSON so newer editors can round-trip
//! content through older servers.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form CSS-like style map.
pub type StyleMap = serde_json::Map<String, Value>;

/// Root of a presentation's content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTree {
    #[serde(default)]
    pub metadata: ContentMetadata,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl ContentTree {
    /// Ids of all sections, in order.
    pub fn section_ids(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.id.as_str())
    }

    /// Total number of blocks across all sections.
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One scroll step of the presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleMap>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    #[default]
    Single,
    TwoColumn,
    ThreeColumn,
    Hero,
    Split,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    Color,
    Gradient,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    #[serde(rename = "type")]
    pub kind: AnimationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    Fade,
    Slide,
    Scale,
    None,
}

/// A renderable unit inside a section.
///
/// Serialized as `{ "id", "type", "content", "style"?, "animation"? }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    pub style: Option<StyleMap>,
    pub animation: Option<Animation>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            style: None,
            animation: None,
        }
    }

    pub fn with_style(mut self, style: Value) -> Self {
        if let Value::Object(map) = style {
            self.style = Some(map);
        }
        self
    }

    pub fn with_animation(mut self, kind: AnimationKind, duration: f64, delay: f64) -> Self {
        self.animation = Some(Animation {
            kind,
            duration: Some(duration),
            delay: Some(delay),
        });
        self
    }
}

/// Block kind with its per-kind payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Text(TextContent),
    Image(ImageContent),
    Video(VideoContent),
    Chart(ChartContent),
    Cta(CtaContent),
    Form(FormContent),
    Embed(EmbedContent),
    Logo(ImageContent),
    Stats(StatsContent),
    Quote(QuoteContent),
    /// Kind not recognised by this build, kept verbatim.
    Unknown { kind: String, content: Value },
}

impl BlockKind {
    /// Wire name of the kind.
    pub fn name(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Video(_) => "video",
            Self::Chart(_) => "chart",
            Self::Cta(_) => "cta",
            Self::Form(_) => "form",
            Self::Embed(_) => "embed",
            Self::Logo(_) => "logo",
            Self::Stats(_) => "stats",
            Self::Quote(_) => "quote",
            Self::Unknown { kind, .. } => kind,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// Builds a kind from its wire name and raw payload.
    ///
    /// Falls back to `Unknown` when the name is unrecognised or the payload
    /// does not fit the kind's shape.
    pub fn from_parts(kind: &str, content: Value) -> Self {
        fn typed<T: DeserializeOwned>(
            content: &Value,
            wrap: fn(T) -> BlockKind,
        ) -> Option<BlockKind> {
            serde_json::from_value(content.clone()).ok().map(wrap)
        }

        let parsed = match kind {
            "text" => typed(&content, BlockKind::Text),
            "image" => typed(&content, BlockKind::Image),
            "video" => typed(&content, BlockKind::Video),
            "chart" => typed(&content, BlockKind::Chart),
            "cta" => typed(&content, BlockKind::Cta),
            "form" => typed(&content, BlockKind::Form),
            "embed" => typed(&content, BlockKind::Embed),
            "logo" => typed(&content, BlockKind::Logo),
            "stats" => typed(&content, BlockKind::Stats),
            "quote" => typed(&content, BlockKind::Quote),
            _ => None,
        };

        parsed.unwrap_or_else(|| BlockKind::Unknown {
            kind: kind.to_string(),
            content,
        })
    }

    /// Payload as raw JSON.
    pub fn payload(&self) -> serde_json::Result<Value> {
        match self {
            Self::Text(c) => serde_json::to_value(c),
            Self::Image(c) | Self::Logo(c) => serde_json::to_value(c),
            Self::Video(c) => serde_json::to_value(c),
            Self::Chart(c) => serde_json::to_value(c),
            Self::Cta(c) => serde_json::to_value(c),
            Self::Form(c) => serde_json::to_value(c),
            Self::Embed(c) => serde_json::to_value(c),
            Self::Stats(c) => serde_json::to_value(c),
            Self::Quote(c) => serde_json::to_value(c),
            Self::Unknown { content, .. } => Ok(content.clone()),
        }
    }
}

/// Wire shape of a block.
#[derive(Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    style: Option<StyleMap>,
    #[serde(default)]
    animation: Option<Animation>,
}

#[derive(Serialize)]
struct RawBlockRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    content: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a StyleMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    animation: Option<&'a Animation>,
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawBlock::deserialize(deserializer)?;
        Ok(Block {
            id: raw.id,
            kind: BlockKind::from_parts(&raw.kind, raw.content),
            style: raw.style,
            animation: raw.animation,
        })
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let content = self.kind.payload().map_err(S::Error::custom)?;
        RawBlockRef {
            id: &self.id,
            kind: self.kind.name(),
            content,
            style: self.style.as_ref(),
            animation: self.animation.as_ref(),
        }
        .serialize(serializer)
    }
}

// === Block payloads ===
//
// Every payload keeps the keys it does not model in `extra`, so editor-only
// settings survive a save through this server.

/// Payload keys outside a block's typed shape.
pub type Extra = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Hosted video, addressed either by provider and id or by a direct url.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContent {
    /// `youtube` or `vimeo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    /// Series data, passed to the renderer as-is.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_link: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_text: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

fn default_field_type() -> String {
    "text".to_string()
}

/// Third-party embed: raw markup or a url to frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsContent {
    pub stats: Vec<Stat>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}
