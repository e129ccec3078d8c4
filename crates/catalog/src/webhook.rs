//! CRM deal webhook: turns a deal into a generated proposal.
//!
//! Every delivery is logged before any generation happens, so a failed
//! generation still leaves an `error` entry with the raw deal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use proposal_core::proposal::{generate_proposal, AccountManager, Package, ProposalData};
use proposal_core::schema::{describe_errors, validate_new_presentation};
use proposal_core::{
    Error, NewPresentation, NewVersion, Owner, Presentation, PresentationSettings, Result, Theme,
    Version, WebhookLog, DEFAULT_TEMPLATE_ID,
};
use proposal_store::Store;
use telemetry::Metrics;

use crate::links::LinkBuilder;

/// Default number of log entries returned.
pub const DEFAULT_LOG_LIMIT: usize = 50;

const DEFAULT_CURRENCY: &str = "PLN";

/// Deal webhook body as sent by the CRM.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DealPayload {
    #[validate(length(min = 1, max = 64))]
    pub event: String,
    #[validate(nested)]
    pub current: Deal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,
}

/// The deal fields used for generation. Everything else is kept in `extra`
/// so the log holds the deal as received.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Deal {
    pub id: i64,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub person_id: Option<DealPerson>,
    pub org_id: Option<DealOrganization>,
    pub expected_close_date: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealPerson {
    pub name: Option<String>,
    #[serde(default)]
    pub email: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealOrganization {
    pub name: Option<String>,
}

/// What a successful delivery produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealOutcome {
    pub presentation_id: Uuid,
    pub version_id: Uuid,
    pub view_url: String,
    pub edit_url: String,
}

impl Deal {
    /// Maps the deal onto proposal data with one default package.
    pub fn to_proposal(&self, manager: &Owner, now: DateTime<Utc>) -> ProposalData {
        let client_name = self
            .org_id
            .as_ref()
            .and_then(|o| non_empty(o.name.as_deref()))
            .or_else(|| {
                self.person_id
                    .as_ref()
                    .and_then(|p| non_empty(p.name.as_deref()))
            })
            .unwrap_or("Client")
            .to_string();
        let client_email = self
            .person_id
            .as_ref()
            .and_then(|p| p.email.first())
            .cloned();
        let price = self.value.unwrap_or(0.0);
        let theme = Theme::default();

        ProposalData {
            client_name,
            client_email,
            offer_title: non_empty(self.title.as_deref())
                .unwrap_or("Sales Proposal")
                .to_string(),
            offer_date: now.date_naive().to_string(),
            valid_until: self.expected_close_date.clone(),
            packages: vec![Package {
                name: "Package 1".into(),
                tier: "Enterprise".into(),
                job_postings: 100,
                boost: 5,
                locations: 5,
                price,
                regular_price: None,
                features: vec![
                    "5 boosts per job posting".into(),
                    "5 locations per posting".into(),
                    "30 days publication".into(),
                    "Customer Success support".into(),
                ],
                highlighted: false,
            }],
            social_boost: None,
            company_profile: None,
            banners: Vec::new(),
            account_manager: AccountManager {
                name: manager.name.clone(),
                email: manager.email.clone(),
                phone: String::new(),
                photo: None,
            },
            logo: None,
            primary_color: Some(theme.primary_color),
            secondary_color: Some(theme.secondary_color),
            total_price: price,
            total_regular_price: None,
            savings: None,
            currency: self
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            custom_message: None,
            terms_and_conditions: None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Handles deal deliveries for one owner.
#[derive(Clone)]
pub struct DealWebhook {
    store: Arc<dyn Store>,
    metrics: Arc<Metrics>,
    links: LinkBuilder,
    owner: Owner,
}

impl DealWebhook {
    pub fn new(
        store: Arc<dyn Store>,
        metrics: Arc<Metrics>,
        links: LinkBuilder,
        owner: Owner,
    ) -> Self {
        Self {
            store,
            metrics,
            links,
            owner,
        }
    }

    /// Logs the delivery, generates a presentation and version from the
    /// deal, and records the outcome on the log entry.
    pub async fn handle(&self, payload: DealPayload, now: DateTime<Utc>) -> Result<DealOutcome> {
        self.metrics.webhooks_received.inc();
        let deal = payload.current;

        let mut log = self
            .store
            .insert_webhook_log(WebhookLog::pending(
                deal.id.to_string(),
                serde_json::to_value(&deal)?,
                now,
            ))
            .await?;
        info!(deal_id = deal.id, event = %payload.event, "Deal webhook received");

        match self.generate(&deal, now).await {
            Ok(outcome) => {
                log.succeed(outcome.presentation_id, now);
                self.save_log(log).await;
                info!(
                    deal_id = deal.id,
                    presentation_id = %outcome.presentation_id,
                    view_url = %outcome.view_url,
                    "Proposal generated from deal"
                );
                Ok(outcome)
            }
            Err(e) => {
                log.fail(e.to_string(), now);
                self.save_log(log).await;
                self.metrics.webhook_failures.inc();
                error!(deal_id = deal.id, error = %e, "Deal webhook failed");
                Err(e)
            }
        }
    }

    /// Newest first.
    pub async fn logs(&self, limit: Option<usize>) -> Result<Vec<WebhookLog>> {
        self.store
            .list_webhook_logs(limit.unwrap_or(DEFAULT_LOG_LIMIT))
            .await
    }

    async fn generate(&self, deal: &Deal, now: DateTime<Utc>) -> Result<DealOutcome> {
        let data = deal.to_proposal(&self.owner, now);
        data.validate()
            .map_err(|e| Error::validation(format!("proposal: {}", describe_errors(&e).join(", "))))?;

        let new = NewPresentation {
            title: data.title(),
            template_id: Some(DEFAULT_TEMPLATE_ID.to_string()),
            content: generate_proposal(&data, now),
            settings: Some(PresentationSettings {
                theme: Theme {
                    primary_color: data.primary_color.clone().unwrap_or_default(),
                    secondary_color: data.secondary_color.clone().unwrap_or_default(),
                    logo_url: data.logo.clone(),
                    ..Theme::default()
                },
                ..Default::default()
            }),
        };
        validate_new_presentation(&new)?;

        let presentation = self
            .store
            .insert_presentation(Presentation::new(self.owner.id, new, now))
            .await?;

        // a delivery either yields presentation and version or neither
        let outcome = match self.issue_version(&presentation, &data, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(cleanup) = self.store.delete_presentation(presentation.id).await {
                    error!(
                        presentation_id = %presentation.id,
                        error = %cleanup,
                        "Failed to remove presentation of failed delivery"
                    );
                }
                return Err(e);
            }
        };

        self.metrics.presentations_created.inc();
        self.metrics.versions_created.inc();
        Ok(outcome)
    }

    async fn issue_version(
        &self,
        presentation: &Presentation,
        data: &ProposalData,
        now: DateTime<Utc>,
    ) -> Result<DealOutcome> {
        let version = Version::issue(
            NewVersion {
                recipient_name: Some(data.client_name.clone()),
                recipient_email: data.client_email.clone(),
                variables: data.to_variables()?,
                ..NewVersion::for_presentation(presentation.id)
            },
            now,
        )?;
        let version = self.store.insert_version(version).await?;
        let links = self.links.links(&version)?;

        Ok(DealOutcome {
            presentation_id: presentation.id,
            version_id: version.id,
            view_url: links.view_url,
            edit_url: links.edit_url,
        })
    }

    async fn save_log(&self, log: WebhookLog) {
        let id = log.id;
        if let Err(e) = self.store.update_webhook_log(log).await {
            warn!(log_id = %id, error = %e, "Failed to update webhook log");
        }
    }
}
