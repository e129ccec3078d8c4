//! Sales proposal generation.
//!
//! [`generate_proposal`] turns structured offer data into a content tree
//! with hero, about, packages, optional additional services, account
//! manager and summary sections. It is pure: the same data and timestamp
//! always produce the same tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::content::{
    AnimationKind, Background, BackgroundKind, Block, BlockKind, ContentMetadata, ContentTree,
    CtaContent, ImageContent, Layout, Section, Stat, StatsContent, TextContent,
};
use crate::error::Result;
use crate::substitute::VariableMap;

const DEFAULT_PRIMARY: &str = "#667eea";
const DEFAULT_SECONDARY: &str = "#764ba2";
const HIGHLIGHT_COLOR: &str = "#FF5A5F";

/// Everything needed to build a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProposalData {
    #[validate(length(min = 1, max = 200))]
    pub client_name: String,
    #[validate(email)]
    pub client_email: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub offer_title: String,
    pub offer_date: String,
    pub valid_until: Option<String>,

    #[validate(length(min = 1), nested)]
    pub packages: Vec<Package>,

    pub social_boost: Option<SocialBoost>,
    pub company_profile: Option<CompanyProfile>,
    #[serde(default)]
    pub banners: Vec<Banner>,

    #[validate(nested)]
    pub account_manager: AccountManager,

    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,

    pub total_price: f64,
    pub total_regular_price: Option<f64>,
    pub savings: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,

    pub custom_message: Option<String>,
    pub terms_and_conditions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Tier label, e.g. "Enterprise".
    #[serde(rename = "type")]
    pub tier: String,
    #[serde(default)]
    pub job_postings: u32,
    #[serde(default)]
    pub boost: u32,
    #[serde(default)]
    pub locations: u32,
    pub price: f64,
    pub regular_price: Option<f64>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialBoost {
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(rename = "type")]
    pub tier: String,
    pub price: f64,
    pub regular_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(rename = "type")]
    pub kind: String,
    pub duration: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AccountManager {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: String,
    pub photo: Option<String>,
}

fn default_currency() -> String {
    "PLN".to_string()
}

impl ProposalData {
    /// Presentation title for this proposal.
    pub fn title(&self) -> String {
        format!("{} - {}", self.offer_title, self.client_name)
    }

    /// Variable map stored on the generated version.
    pub fn to_variables(&self) -> Result<VariableMap> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(VariableMap::new()),
        }
    }

    fn has_additional_services(&self) -> bool {
        self.social_boost.is_some() || self.company_profile.is_some() || !self.banners.is_empty()
    }

    fn price(&self, amount: f64) -> String {
        format!("{} {} net", group_thousands(amount), self.currency)
    }
}

/// Builds the proposal content tree.
pub fn generate_proposal(data: &ProposalData, now: DateTime<Utc>) -> ContentTree {
    let mut sections = vec![hero(data), about(), packages(data)];
    if data.has_additional_services() {
        sections.push(additional_services(data));
    }
    sections.push(account_manager(data));
    sections.push(summary(data));

    ContentTree {
        metadata: ContentMetadata {
            title: data.title(),
            description: Some(format!("Business proposal for {}", data.client_name)),
            author: Some(data.account_manager.name.clone()),
            created_at: Some(now),
            updated_at: Some(now),
        },
        sections,
    }
}

fn text(id: &str, text: impl Into<String>, tag: &str) -> Block {
    Block::new(
        id,
        BlockKind::Text(TextContent {
            text: text.into(),
            tag: Some(tag.to_string()),
            ..Default::default()
        }),
    )
}

fn gradient(from: &str, to: &str) -> Background {
    Background {
        kind: BackgroundKind::Gradient,
        value: format!("linear-gradient(135deg, {from} 0%, {to} 100%)"),
    }
}

fn section(id: &str, title: Option<&str>, layout: Layout, blocks: Vec<Block>) -> Section {
    Section {
        id: id.to_string(),
        title: title.map(str::to_string),
        layout,
        background: None,
        style: None,
        blocks,
    }
}

fn hero(data: &ProposalData) -> Section {
    let mut hero = section(
        "hero",
        None,
        Layout::Hero,
        vec![
            text("hero-title", format!("Offer for\n{}", data.client_name), "h1")
                .with_style(json!({
                    "fontSize": "48px",
                    "fontWeight": "700",
                    "color": "#ffffff",
                    "textAlign": "center",
                    "marginBottom": "20px"
                }))
                .with_animation(AnimationKind::Fade, 1.0, 0.2),
            text(
                "hero-subtitle",
                "Reach candidates on one of the fastest growing job boards",
                "p",
            )
            .with_style(json!({
                "fontSize": "20px",
                "color": "#ffffff",
                "textAlign": "center",
                "opacity": "0.9"
            }))
            .with_animation(AnimationKind::Fade, 1.0, 0.8),
            text("hero-offer", data.offer_title.clone(), "h2")
                .with_style(json!({
                    "fontSize": "36px",
                    "fontWeight": "600",
                    "color": "#FFD700",
                    "textAlign": "center",
                    "marginTop": "40px"
                }))
                .with_animation(AnimationKind::Slide, 1.0, 1.0),
        ],
    );
    if let Some(logo) = &data.logo {
        let block = Block::new(
            "hero-logo",
            BlockKind::Image(ImageContent {
                url: logo.clone(),
                alt: Some("Logo".into()),
                ..Default::default()
            }),
        )
        .with_style(json!({ "maxWidth": "200px", "margin": "0 auto" }))
        .with_animation(AnimationKind::Scale, 0.8, 0.5);
        hero.blocks.insert(1, block);
    }
    hero.background = Some(gradient(DEFAULT_PRIMARY, DEFAULT_SECONDARY));
    hero
}

fn about() -> Section {
    let stat = |value: &str, label: &str, highlight: bool| Stat {
        value: value.into(),
        label: label.into(),
        highlight: highlight.then_some(true),
        ..Default::default()
    };

    section(
        "about",
        None,
        Layout::TwoColumn,
        vec![
            text("about-title", "About us", "h2").with_style(json!({
                "fontSize": "32px",
                "fontWeight": "700",
                "marginBottom": "20px"
            })),
            text(
                "about-description",
                "We are the most effective IT job board in the region.",
                "p",
            )
            .with_style(json!({ "fontSize": "24px", "lineHeight": "1.6" })),
            Block::new(
                "about-stats",
                BlockKind::Stats(StatsContent {
                    stats: vec![
                        stat("63%", "of CVs among industry job boards", true),
                        stat("32M", "portal page views", false),
                        stat("3.2M", "newsletter subscribers", false),
                        stat("540K", "social media followers", false),
                    ],
                    ..Default::default()
                }),
            ),
        ],
    )
}

fn packages(data: &ProposalData) -> Section {
    let primary = data.primary_color.as_deref().unwrap_or(HIGHLIGHT_COLOR);

    let mut blocks = vec![text(
        "packages-title",
        "Available publishing packages",
        "h2",
    )
    .with_style(json!({
        "fontSize": "36px",
        "fontWeight": "700",
        "textAlign": "center",
        "marginBottom": "40px"
    }))];

    blocks.extend(data.packages.iter().enumerate().map(|(i, pkg)| {
        let (background, color, border) = if pkg.highlighted {
            (primary, "#ffffff", "none")
        } else {
            ("#ffffff", "#000000", "2px solid #e5e7eb")
        };
        Block::new(
            format!("package-{i}"),
            BlockKind::Cta(CtaContent {
                title: Some(pkg.name.clone()),
                subtitle: Some(pkg.tier.clone()),
                description: Some(pkg.features.join("\n")),
                price: Some(data.price(pkg.price)),
                regular_price: pkg
                    .regular_price
                    .map(|p| format!("{} {}", group_thousands(p), data.currency)),
                highlighted: Some(pkg.highlighted),
                features: pkg.features.clone(),
                ..Default::default()
            }),
        )
        .with_style(json!({
            "background": background,
            "color": color,
            "border": border,
            "borderRadius": "16px",
            "padding": "30px",
            "marginBottom": "20px"
        }))
        .with_animation(AnimationKind::Slide, 0.8, i as f64 * 0.2)
    }));

    section("packages", Some("Packages"), Layout::Single, blocks)
}

fn additional_services(data: &ProposalData) -> Section {
    let mut blocks = Vec::new();

    if let Some(boost) = &data.social_boost {
        blocks.push(Block::new(
            "social-boost",
            BlockKind::Cta(CtaContent {
                title: Some("Social Boost".into()),
                description: Some("A dedicated ad campaign that widens the reach of your postings".into()),
                price: Some(data.price(boost.price)),
                features: vec![
                    format!("{} Social Boosts", boost.quantity),
                    "Targeted ad campaign".into(),
                    "Higher posting visibility".into(),
                ],
                ..Default::default()
            }),
        ));
    }

    if let Some(profile) = &data.company_profile {
        blocks.push(Block::new(
            "company-profile",
            BlockKind::Cta(CtaContent {
                title: Some("Employer Profile".into()),
                subtitle: Some(profile.tier.clone()),
                description: Some("Strengthen your hiring with an employer profile".into()),
                price: Some(data.price(profile.price)),
                regular_price: profile
                    .regular_price
                    .map(|p| format!("{} {}", group_thousands(p), data.currency)),
                ..Default::default()
            }),
        ));
    }

    blocks.extend(data.banners.iter().enumerate().map(|(i, banner)| {
        Block::new(
            format!("banner-{i}"),
            BlockKind::Cta(CtaContent {
                title: Some(banner.kind.clone()),
                subtitle: Some(banner.duration.clone()),
                price: Some(data.price(banner.price)),
                ..Default::default()
            }),
        )
    }));

    section(
        "additional-services",
        Some("Additional services"),
        Layout::TwoColumn,
        blocks,
    )
}

fn account_manager(data: &ProposalData) -> Section {
    let manager = &data.account_manager;
    let photo = manager.photo.clone().unwrap_or_else(|| {
        let name: String = url::form_urlencoded::byte_serialize(manager.name.as_bytes()).collect();
        format!("https://ui-avatars.com/api/?name={name}&size=300")
    });

    let info = format!(
        "<h3>Questions? Write to me!</h3>\
         <p><strong>{name}</strong></p>\
         <p>Key Account Manager</p>\
         <p><a href=\"mailto:{email}\">{email}</a></p>\
         <p><a href=\"tel:{phone}\">{phone}</a></p>",
        name = manager.name,
        email = manager.email,
        phone = manager.phone,
    );

    let mut section = section(
        "account-manager",
        None,
        Layout::Split,
        vec![
            Block::new(
                "manager-image",
                BlockKind::Image(ImageContent {
                    url: photo,
                    alt: Some(manager.name.clone()),
                    ..Default::default()
                }),
            )
            .with_style(json!({
                "borderRadius": "50%",
                "maxWidth": "200px",
                "margin": "0 auto"
            })),
            text("manager-info", info, "div"),
            Block::new(
                "manager-cta",
                BlockKind::Cta(CtaContent {
                    title: Some("Book a meeting".into()),
                    button_text: Some("Book a meeting".into()),
                    button_link: Some(format!("https://calendly.com/{}", manager.email)),
                    ..Default::default()
                }),
            )
            .with_style(json!({ "textAlign": "center" })),
        ],
    );
    section.background = Some(Background {
        kind: BackgroundKind::Color,
        value: "#f9fafb".into(),
    });
    section
}

fn summary(data: &ProposalData) -> Section {
    let mut total = String::new();
    if let Some(regular) = data.total_regular_price {
        total.push_str(&format!(
            "<p class=\"regular-price\">List price: {}</p>",
            data.price(regular)
        ));
    }
    total.push_str(&format!(
        "<p class=\"total-price\">{}</p>",
        data.price(data.total_price)
    ));
    if let Some(savings) = data.savings {
        total.push_str(&format!(
            "<p class=\"savings\">You save: {} {}</p>",
            group_thousands(savings),
            data.currency
        ));
    }

    let mut blocks = vec![
        text("summary-title", "Offer summary", "h2").with_style(json!({
            "fontSize": "36px",
            "fontWeight": "700",
            "color": "#ffffff",
            "textAlign": "center",
            "marginBottom": "30px"
        })),
        text("summary-total", total, "div")
            .with_style(json!({ "color": "#ffffff", "textAlign": "center" })),
    ];

    if let Some(message) = &data.custom_message {
        blocks.push(text("summary-message", message.clone(), "p"));
    }
    if let Some(valid_until) = &data.valid_until {
        blocks.push(text(
            "summary-validity",
            format!("Offer valid until {valid_until}"),
            "p",
        ));
    }

    blocks.push(
        Block::new(
            "summary-cta",
            BlockKind::Cta(CtaContent {
                title: Some("Interested?".into()),
                description: Some("Get in touch with us today!".into()),
                button_text: Some("Book a meeting".into()),
                button_link: Some(format!("mailto:{}", data.account_manager.email)),
                ..Default::default()
            }),
        )
        .with_style(json!({ "textAlign": "center", "marginTop": "30px" })),
    );

    if let Some(terms) = &data.terms_and_conditions {
        blocks.push(text("summary-terms", terms.clone(), "small"));
    }

    let mut section = section("summary", None, Layout::Single, blocks);
    section.background = Some(gradient(
        data.primary_color.as_deref().unwrap_or(DEFAULT_PRIMARY),
        data.secondary_color.as_deref().unwrap_or(DEFAULT_SECONDARY),
    ));
    section
}

/// Formats an amount with space-grouped thousands, e.g. `12 500`.
///
/// Fractions are kept to two places only when non-zero.
pub fn group_thousands(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    if frac == 0 {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac:02}")
    }
}
