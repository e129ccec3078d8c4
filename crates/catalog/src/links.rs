//! Shareable view/edit links for versions.

use serde::Serialize;
use url::Url;

use proposal_core::{Error, Result, Version};

/// View and edit URLs for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionLinks {
    pub view_url: String,
    pub edit_url: String,
}

/// Builds links under the public frontend base URL.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base: Url,
}

impl LinkBuilder {
    pub fn new(frontend_url: &str) -> Result<Self> {
        let mut base = Url::parse(frontend_url)
            .map_err(|e| Error::validation(format!("frontend url {:?}: {}", frontend_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::validation(format!(
                "frontend url {:?} cannot be a base",
                frontend_url
            )));
        }
        // join() replaces the last segment unless the path ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn links(&self, version: &Version) -> Result<VersionLinks> {
        Ok(VersionLinks {
            view_url: self.build("view", &version.version_slug, &version.view_token)?,
            edit_url: self.build("edit", &version.version_slug, &version.edit_token)?,
        })
    }

    fn build(&self, mode: &str, slug: &str, token: &str) -> Result<String> {
        let mut url = self
            .base
            .join(&format!("{}/{}", mode, slug))
            .map_err(|e| Error::internal(format!("link for {}: {}", slug, e)))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url.into())
    }
}
