//! Built-in proposal templates.
//!
//! A template is a default content tree whose strings carry `{{key}}`
//! placeholders, plus descriptors for the variables a version should fill.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use proposal_core::content::{
    Background, BackgroundKind, Block, BlockKind, ContentMetadata, ContentTree, CtaContent,
    Layout, Section, Stat, StatsContent, TextContent,
};
use proposal_core::error::NotFoundCode;
use proposal_core::schema::validate_new_template;
use proposal_core::{
    Error, NewTemplate, PresentationSettings, Result, Template, TemplateVariable, Theme,
    TrackingSettings, VariableKind, DEFAULT_TEMPLATE_ID,
};
use proposal_store::Store;

/// Template catalogue: built-in templates first, then stored ones.
#[derive(Clone)]
pub struct Templates {
    store: Arc<dyn Store>,
}

impl Templates {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Stores an authored template.
    ///
    /// Slugs of built-in templates are reserved; a taken slug is a conflict.
    pub async fn create(&self, new: NewTemplate, now: DateTime<Utc>) -> Result<Template> {
        validate_new_template(&new)?;
        if builtin_templates(now).iter().any(|t| t.slug == new.slug) {
            return Err(Error::conflict(format!(
                "template slug '{}' is reserved",
                new.slug
            )));
        }

        let template = self
            .store
            .insert_template(Template::from_new(new, now))
            .await?;
        info!(slug = %template.slug, id = %template.id, "Template stored");
        Ok(template)
    }

    pub async fn list(&self, now: DateTime<Utc>) -> Result<Vec<Template>> {
        let mut all = builtin_templates(now);
        all.extend(self.store.list_templates().await?);
        Ok(all)
    }

    pub async fn get(&self, slug: &str, now: DateTime<Utc>) -> Result<Template> {
        match find_template(slug, now) {
            Err(e) if e.is_not_found() => self.store.get_template_by_slug(slug).await,
            found => found,
        }
    }
}

/// All built-in templates. Date defaults are taken from `now`.
pub fn builtin_templates(now: DateTime<Utc>) -> Vec<Template> {
    vec![sales_proposal(now)]
}

/// Looks a template up by slug.
pub fn find_template(slug: &str, now: DateTime<Utc>) -> Result<Template> {
    builtin_templates(now)
        .into_iter()
        .find(|t| t.slug == slug)
        .ok_or_else(|| Error::not_found(NotFoundCode::Template))
}

fn sales_proposal(now: DateTime<Utc>) -> Template {
    use VariableKind::*;

    let required_variables = vec![
        TemplateVariable::new("clientName", Text, json!(""), "Client Company Name"),
        TemplateVariable::new("clientEmail", Text, json!(""), "Client Email"),
        TemplateVariable::new("offerTitle", Text, json!("Sales Proposal"), "Offer Title"),
        TemplateVariable::new(
            "offerDate",
            Date,
            json!(now.date_naive().to_string()),
            "Offer Date",
        ),
        TemplateVariable::new("totalPrice", Number, json!(0), "Total Price"),
        TemplateVariable::new("currency", Text, json!("PLN"), "Currency"),
        TemplateVariable::new("accountManager.name", Text, json!(""), "Account Manager Name"),
        TemplateVariable::new("accountManager.email", Text, json!(""), "Account Manager Email"),
        TemplateVariable::new("accountManager.phone", Text, json!(""), "Account Manager Phone"),
    ];

    Template {
        id: DEFAULT_TEMPLATE_ID.to_string(),
        name: "Sales Proposal".to_string(),
        slug: DEFAULT_TEMPLATE_ID.to_string(),
        description: "Business proposal with offer summary and account manager contact"
            .to_string(),
        required_variables,
        default_content: ContentTree {
            metadata: ContentMetadata {
                title: "Sales Proposal".to_string(),
                description: Some("Business proposal template".to_string()),
                author: None,
                created_at: Some(now),
                updated_at: Some(now),
            },
            sections: vec![hero(), offer(), contact()],
        },
        default_settings: PresentationSettings {
            theme: Theme::default(),
            tracking: Some(TrackingSettings::default()),
            ..Default::default()
        },
        builtin: true,
        created_at: None,
    }
}

fn text(id: &str, text: &str, tag: &str) -> Block {
    Block::new(
        id,
        BlockKind::Text(TextContent {
            text: text.to_string(),
            tag: Some(tag.to_string()),
            ..Default::default()
        }),
    )
}

fn hero() -> Section {
    Section {
        id: "hero".into(),
        title: None,
        layout: Layout::Hero,
        background: Some(Background {
            kind: BackgroundKind::Gradient,
            value: "linear-gradient(135deg, #667eea 0%, #764ba2 100%)".into(),
        }),
        style: None,
        blocks: vec![
            text("hero-title", "Offer for\n{{clientName}}", "h1").with_style(json!({
                "fontSize": "48px",
                "fontWeight": "700",
                "color": "#ffffff",
                "textAlign": "center",
            })),
            text("hero-subtitle", "{{offerTitle}}", "h2"),
            text("hero-date", "{{offerDate}}", "p"),
        ],
    }
}

fn offer() -> Section {
    Section {
        id: "offer".into(),
        title: Some("Your offer".into()),
        layout: Layout::Single,
        background: None,
        style: None,
        blocks: vec![Block::new(
            "offer-total",
            BlockKind::Stats(StatsContent {
                stats: vec![Stat {
                    value: "{{totalPrice}} {{currency}}".into(),
                    label: "Total (net)".into(),
                    highlight: Some(true),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        )],
    }
}

fn contact() -> Section {
    Section {
        id: "account-manager".into(),
        title: Some("Your account manager".into()),
        layout: Layout::Single,
        background: None,
        style: None,
        blocks: vec![Block::new(
            "contact-cta",
            BlockKind::Cta(CtaContent {
                title: Some("{{accountManager.name}}".into()),
                subtitle: Some("{{accountManager.phone}}".into()),
                button_text: Some("Get in touch".into()),
                button_link: Some("mailto:{{accountManager.email}}".into()),
                ..Default::default()
            }),
        )],
    }
}
