//! In-memory store.
//!
//! All tables sit behind one `RwLock`, so every trait method is a single
//! critical section and therefore atomic. Sessions are keyed by an insertion
//! sequence so scans return them in creation order.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use proposal_core::error::NotFoundCode;
use proposal_core::limits::MAX_WEBHOOK_LOGS;
use proposal_core::substitute::VariableMap;
use proposal_core::{
    ClientMetadata, EngagementUpdate, Error, Owner, Presentation, PresentationPatch, Result,
    Rollup, SessionRecord, Template, Version, WebhookLog,
};

use crate::{Page, PresentationListing, PresentationQuery, SessionUpsert, Store};

#[derive(Default)]
struct Tables {
    owners: HashMap<Uuid, Owner>,
    presentations: HashMap<Uuid, Presentation>,
    presentation_slugs: HashMap<String, Uuid>,
    versions: HashMap<Uuid, Version>,
    version_slugs: HashMap<String, Uuid>,
    /// View and edit tokens of every version.
    tokens: HashSet<String>,
    sessions: BTreeMap<u64, SessionRecord>,
    /// (version id, client session id) -> sequence
    session_keys: HashMap<(Uuid, String), u64>,
    /// record id -> sequence
    session_records: HashMap<Uuid, u64>,
    rollups: HashMap<Uuid, Rollup>,
    /// slug -> template
    templates: BTreeMap<String, Template>,
    /// Oldest first, at most `MAX_WEBHOOK_LOGS`.
    webhook_logs: VecDeque<WebhookLog>,
    next_seq: u64,
}

impl Tables {
    fn presentation(&self, id: Uuid) -> Result<&Presentation> {
        self.presentations
            .get(&id)
            .ok_or_else(|| Error::not_found(NotFoundCode::Presentation))
    }

    fn version(&self, id: Uuid) -> Result<&Version> {
        self.versions
            .get(&id)
            .ok_or_else(|| Error::not_found(NotFoundCode::Version))
    }

    fn rollup_mut(&mut self, presentation_id: Uuid) -> Result<&mut Rollup> {
        self.rollups
            .get_mut(&presentation_id)
            .ok_or_else(|| Error::not_found(NotFoundCode::Analytics))
    }

    fn remove_version(&mut self, id: Uuid) -> Option<Version> {
        let version = self.versions.remove(&id)?;
        self.version_slugs.remove(&version.version_slug);
        self.tokens.remove(&version.view_token);
        self.tokens.remove(&version.edit_token);

        let doomed: Vec<u64> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.version_id == id)
            .map(|(seq, _)| *seq)
            .collect();
        for seq in doomed {
            if let Some(record) = self.sessions.remove(&seq) {
                self.session_keys.remove(&(record.version_id, record.session_id));
                self.session_records.remove(&record.id);
            }
        }

        Some(version)
    }
}

/// Store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of session records across all versions.
    pub fn session_count(&self) -> usize {
        self.tables.read().sessions.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_owner(&self, owner: Owner) -> Result<Owner> {
        let mut t = self.tables.write();
        if let Some(existing) = t.owners.values().find(|o| o.email == owner.email) {
            return Ok(existing.clone());
        }
        t.owners.insert(owner.id, owner.clone());
        Ok(owner)
    }

    async fn get_owner(&self, id: Uuid) -> Result<Owner> {
        self.tables
            .read()
            .owners
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(NotFoundCode::Owner))
    }

    async fn insert_presentation(&self, presentation: Presentation) -> Result<Presentation> {
        let mut t = self.tables.write();
        if !t.owners.contains_key(&presentation.owner_id) {
            return Err(Error::not_found(NotFoundCode::Owner));
        }
        if t.presentation_slugs.contains_key(&presentation.slug) {
            return Err(Error::conflict(format!(
                "presentation slug '{}' is taken",
                presentation.slug
            )));
        }

        t.presentation_slugs
            .insert(presentation.slug.clone(), presentation.id);
        t.rollups.insert(
            presentation.id,
            Rollup::new(presentation.id, presentation.created_at),
        );
        t.presentations
            .insert(presentation.id, presentation.clone());
        Ok(presentation)
    }

    async fn get_presentation(&self, id: Uuid) -> Result<Presentation> {
        self.tables.read().presentation(id).cloned()
    }

    async fn list_presentations(&self, query: &PresentationQuery) -> Result<Page<PresentationListing>> {
        let t = self.tables.read();

        let mut version_counts: HashMap<Uuid, usize> = HashMap::new();
        for v in t.versions.values() {
            *version_counts.entry(v.presentation_id).or_default() += 1;
        }

        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let mut matching: Vec<&Presentation> = t
            .presentations
            .values()
            .filter(|p| search.map_or(true, |s| p.matches(s)))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.slug.cmp(&b.slug)));

        let listings = matching
            .into_iter()
            .map(|p| PresentationListing {
                presentation: p.clone(),
                version_count: version_counts.get(&p.id).copied().unwrap_or(0),
            })
            .collect();

        Ok(Page::slice(listings, query.page, query.limit))
    }

    async fn update_presentation(
        &self,
        id: Uuid,
        patch: PresentationPatch,
        now: DateTime<Utc>,
    ) -> Result<Presentation> {
        let mut t = self.tables.write();
        let presentation = t
            .presentations
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(NotFoundCode::Presentation))?;
        presentation.apply(patch, now);
        Ok(presentation.clone())
    }

    async fn delete_presentation(&self, id: Uuid) -> Result<()> {
        let mut t = self.tables.write();
        let presentation = t
            .presentations
            .remove(&id)
            .ok_or_else(|| Error::not_found(NotFoundCode::Presentation))?;
        t.presentation_slugs.remove(&presentation.slug);
        t.rollups.remove(&id);

        let versions: Vec<Uuid> = t
            .versions
            .values()
            .filter(|v| v.presentation_id == id)
            .map(|v| v.id)
            .collect();
        for version_id in &versions {
            t.remove_version(*version_id);
        }

        debug!(presentation_id = %id, versions = versions.len(), "Deleted presentation");
        Ok(())
    }

    async fn insert_version(&self, version: Version) -> Result<Version> {
        let mut t = self.tables.write();
        t.presentation(version.presentation_id)?;

        if t.version_slugs.contains_key(&version.version_slug) {
            return Err(Error::conflict(format!(
                "version slug '{}' is taken",
                version.version_slug
            )));
        }
        if version.view_token == version.edit_token
            || t.tokens.contains(&version.view_token)
            || t.tokens.contains(&version.edit_token)
        {
            return Err(Error::conflict("version token already in use"));
        }

        t.version_slugs
            .insert(version.version_slug.clone(), version.id);
        t.tokens.insert(version.view_token.clone());
        t.tokens.insert(version.edit_token.clone());
        t.versions.insert(version.id, version.clone());
        Ok(version)
    }

    async fn get_version(&self, id: Uuid) -> Result<Version> {
        self.tables.read().version(id).cloned()
    }

    async fn get_version_by_slug(&self, slug: &str) -> Result<Version> {
        let t = self.tables.read();
        let id = t
            .version_slugs
            .get(slug)
            .ok_or_else(|| Error::not_found(NotFoundCode::Version))?;
        t.version(*id).cloned()
    }

    async fn list_versions(&self, presentation_id: Uuid) -> Result<Vec<Version>> {
        let t = self.tables.read();
        let mut versions: Vec<Version> = t
            .versions
            .values()
            .filter(|v| v.presentation_id == presentation_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(versions)
    }

    async fn update_variables(
        &self,
        id: Uuid,
        variables: VariableMap,
        now: DateTime<Utc>,
    ) -> Result<Version> {
        let mut t = self.tables.write();
        let version = t
            .versions
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(NotFoundCode::Version))?;
        version.set_variables(variables, now);
        Ok(version.clone())
    }

    async fn delete_version(&self, id: Uuid) -> Result<()> {
        let mut t = self.tables.write();
        t.remove_version(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(NotFoundCode::Version))
    }

    async fn upsert_session(
        &self,
        version_id: Uuid,
        session_id: &str,
        metadata: ClientMetadata,
        now: DateTime<Utc>,
    ) -> Result<SessionUpsert> {
        let mut t = self.tables.write();
        t.version(version_id)?;

        let key = (version_id, session_id.to_string());
        if let Some(seq) = t.session_keys.get(&key).copied() {
            let record = t
                .sessions
                .get_mut(&seq)
                .ok_or_else(|| Error::internal("session index out of sync"))?;
            record.touch(now);
            return Ok(SessionUpsert {
                record: record.clone(),
                created: false,
            });
        }

        let record = SessionRecord::new(version_id, session_id, metadata, now);
        let seq = t.next_seq;
        t.next_seq += 1;
        t.session_keys.insert(key, seq);
        t.session_records.insert(record.id, seq);
        t.sessions.insert(seq, record.clone());

        Ok(SessionUpsert {
            record,
            created: true,
        })
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let t = self.tables.read();
        Ok(t
            .sessions
            .values()
            .find(|s| s.session_id == session_id)
            .cloned())
    }

    async fn apply_engagement(
        &self,
        record_id: Uuid,
        update: &EngagementUpdate,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord> {
        let mut t = self.tables.write();
        let seq = t
            .session_records
            .get(&record_id)
            .copied()
            .ok_or_else(|| Error::not_found(NotFoundCode::Session))?;
        let record = t
            .sessions
            .get_mut(&seq)
            .ok_or_else(|| Error::not_found(NotFoundCode::Session))?;
        record.apply(update, now);
        Ok(record.clone())
    }

    async fn sessions_for_version(&self, version_id: Uuid) -> Result<Vec<SessionRecord>> {
        let t = self.tables.read();
        Ok(t
            .sessions
            .values()
            .filter(|s| s.version_id == version_id)
            .cloned()
            .collect())
    }

    async fn sessions_for_presentation(&self, presentation_id: Uuid) -> Result<Vec<SessionRecord>> {
        let t = self.tables.read();
        let versions: HashSet<Uuid> = t
            .versions
            .values()
            .filter(|v| v.presentation_id == presentation_id)
            .map(|v| v.id)
            .collect();
        Ok(t
            .sessions
            .values()
            .filter(|s| versions.contains(&s.version_id))
            .cloned()
            .collect())
    }

    async fn get_rollup(&self, presentation_id: Uuid) -> Result<Rollup> {
        self.tables
            .read()
            .rollups
            .get(&presentation_id)
            .cloned()
            .ok_or_else(|| Error::not_found(NotFoundCode::Analytics))
    }

    async fn record_view(
        &self,
        presentation_id: Uuid,
        new_session: bool,
        now: DateTime<Utc>,
    ) -> Result<Rollup> {
        let mut t = self.tables.write();
        let rollup = t.rollup_mut(presentation_id)?;
        rollup.record_view(new_session, now);
        Ok(rollup.clone())
    }

    async fn set_avg_time_spent(
        &self,
        presentation_id: Uuid,
        avg_time_spent: f64,
        now: DateTime<Utc>,
    ) -> Result<Rollup> {
        let mut t = self.tables.write();
        let rollup = t.rollup_mut(presentation_id)?;
        rollup.avg_time_spent = avg_time_spent;
        rollup.updated_at = now;
        Ok(rollup.clone())
    }

    async fn insert_template(&self, template: Template) -> Result<Template> {
        let mut t = self.tables.write();
        if t.templates.contains_key(&template.slug) {
            return Err(Error::conflict(format!(
                "template slug '{}' already exists",
                template.slug
            )));
        }
        t.templates.insert(template.slug.clone(), template.clone());
        Ok(template)
    }

    async fn get_template_by_slug(&self, slug: &str) -> Result<Template> {
        self.tables
            .read()
            .templates
            .get(slug)
            .cloned()
            .ok_or_else(|| Error::not_found(NotFoundCode::Template))
    }

    async fn list_templates(&self) -> Result<Vec<Template>> {
        Ok(self.tables.read().templates.values().cloned().collect())
    }

    async fn insert_webhook_log(&self, log: WebhookLog) -> Result<WebhookLog> {
        let mut t = self.tables.write();
        t.webhook_logs.push_back(log.clone());
        while t.webhook_logs.len() > MAX_WEBHOOK_LOGS {
            if let Some(dropped) = t.webhook_logs.pop_front() {
                debug!(log_id = %dropped.id, "Webhook log pruned");
            }
        }
        Ok(log)
    }

    async fn update_webhook_log(&self, log: WebhookLog) -> Result<WebhookLog> {
        let mut t = self.tables.write();
        let slot = t
            .webhook_logs
            .iter_mut()
            .find(|l| l.id == log.id)
            .ok_or_else(|| Error::internal(format!("webhook log {} missing", log.id)))?;
        *slot = log.clone();
        Ok(log)
    }

    async fn list_webhook_logs(&self, limit: usize) -> Result<Vec<WebhookLog>> {
        let t = self.tables.read();
        Ok(t.webhook_logs.iter().rev().take(limit).cloned().collect())
    }

    async fn ping(&self) -> Result<()> {
        let _guard = self.tables.read();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
