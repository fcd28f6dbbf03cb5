// ABOUTME: Registry endpoint configuration for the local and remote repositories.
// ABOUTME: Holds URL, pull prefix, credentials, meta headers, and the insecure flag.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::runtime::{RegistryAccess, RegistryAuth};
use crate::types::{ImageRef, ParseImageRefError};

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRepository {
    #[serde(default)]
    pub url: String,

    /// Namespace joined in front of image names when pulling from or
    /// pushing to this repository.
    #[serde(default)]
    pub pull_prefix: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta_headers: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
}

impl RemoteRepository {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_pull_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.pull_prefix = prefix.into();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn requires_auth(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Credentials for daemon pull/push calls, if any are configured.
    pub fn auth(&self) -> Option<RegistryAuth> {
        if !self.requires_auth() {
            return None;
        }
        Some(RegistryAuth {
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            server: self.host(),
        })
    }

    /// Everything a daemon pull or push against this repository needs.
    pub fn access(&self) -> RegistryAccess {
        RegistryAccess {
            auth: self.auth(),
            insecure: self.insecure,
            meta_headers: self.meta_headers.clone(),
        }
    }

    /// Registry host (with port, if any) taken from the URL.
    ///
    /// Scheme-less URLs such as `registry.local:5000` are accepted.
    pub fn host(&self) -> Option<String> {
        let url = self.url.trim();
        if url.is_empty() {
            return None;
        }
        let parsed = Url::parse(url)
            .ok()
            .filter(|u| u.has_host())
            .or_else(|| Url::parse(&format!("https://{}", url)).ok())?;

        let host = parsed.host_str()?;
        match parsed.port() {
            Some(port) => Some(format!("{}:{}", host, port)),
            None => Some(host.to_string()),
        }
    }

    /// Whether the URL explicitly names the `http` scheme.
    pub fn is_plain_http(&self) -> bool {
        self.url
            .trim()
            .get(..7)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http://"))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("repository url cannot be empty".to_string());
        }
        if self.host().is_none() {
            return Err(format!("repository url has no host: {}", self.url));
        }
        if self.is_plain_http() && !self.insecure {
            return Err(format!(
                "plain http url requires insecure: true: {}",
                self.url
            ));
        }
        Ok(())
    }

    /// The name an image carries in this repository's namespace.
    pub fn qualify(&self, image: &ImageRef) -> Result<ImageRef, ParseImageRefError> {
        image.with_prefix(&self.pull_prefix)
    }
}

// Hand-written so passwords never end up in logs.
impl fmt::Debug for RemoteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteRepository")
            .field("url", &self.url)
            .field("pull_prefix", &self.pull_prefix)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("meta_headers", &self.meta_headers)
            .field("insecure", &self.insecure)
            .finish()
    }
}
