// ABOUTME: Tag listing over the OCI distribution API using oci-client.
// ABOUTME: Handles pull-scoped auth, per-host insecure transport, and tag pagination.

use std::collections::HashSet;

use async_trait::async_trait;
use oci_client::client::{ClientConfig, ClientProtocol};
use oci_client::errors::{OciDistributionError, OciErrorCode};
use oci_client::secrets::RegistryAuth as OciAuth;
use oci_client::{Client, Reference};

use super::{RegistryError, TagLister};
use crate::config::RemoteRepository;
use crate::runtime::traits::sealed::Sealed;
use crate::types::ImageRef;

/// Tags requested per page.
const PAGE_SIZE: usize = 100;

/// Upper bound on pages fetched for a single repository.
const MAX_PAGES: usize = 1000;

/// [`TagLister`] backed by the OCI distribution API.
///
/// A fresh client is built per call so that each repository's transport
/// settings and credentials stay scoped to that repository.
#[derive(Debug, Clone, Default)]
pub struct OciTagLister;

impl OciTagLister {
    pub fn new() -> Self {
        Self
    }
}

/// How a client reaches a registry host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Https,
    /// HTTPS without certificate verification.
    HttpsUnverified,
    Http,
}

/// Transports to try for a repository, in order.
///
/// Insecure repositories get HTTPS with verification off first and fall
/// back to plain HTTP when that cannot connect. An explicit `http://` URL
/// goes straight to HTTP.
fn transports(repo: &RemoteRepository) -> &'static [Transport] {
    if !repo.insecure {
        &[Transport::Https]
    } else if repo.is_plain_http() {
        &[Transport::Http]
    } else {
        &[Transport::HttpsUnverified, Transport::Http]
    }
}

fn client_config(host: &str, transport: Transport) -> ClientConfig {
    match transport {
        Transport::Https => ClientConfig::default(),
        Transport::HttpsUnverified => ClientConfig {
            accept_invalid_certificates: true,
            ..Default::default()
        },
        Transport::Http => ClientConfig {
            protocol: ClientProtocol::HttpsExcept(vec![host.to_string()]),
            ..Default::default()
        },
    }
}

fn oci_auth(repo: &RemoteRepository) -> OciAuth {
    if repo.requires_auth() {
        OciAuth::Basic(
            repo.username.clone().unwrap_or_default(),
            repo.password.clone().unwrap_or_default(),
        )
    } else {
        OciAuth::Anonymous
    }
}

fn classify(err: OciDistributionError, host: &str, repository: &str) -> RegistryError {
    match &err {
        OciDistributionError::RegistryError { envelope, .. }
            if envelope
                .errors
                .iter()
                .any(|e| e.code == OciErrorCode::NameUnknown) =>
        {
            RegistryError::NotFound(repository.to_string())
        }
        OciDistributionError::ServerError { code: 404, .. } => {
            RegistryError::NotFound(repository.to_string())
        }
        OciDistributionError::RequestError(_) => RegistryError::Connection {
            registry: host.to_string(),
            message: err.to_string(),
        },
        _ => RegistryError::Query {
            repository: repository.to_string(),
            message: err.to_string(),
        },
    }
}

impl Sealed for OciTagLister {}

#[async_trait]
impl TagLister for OciTagLister {
    async fn list_tags(
        &self,
        repo: &RemoteRepository,
        image: &ImageRef,
    ) -> Result<Vec<String>, RegistryError> {
        let host = repo
            .host()
            .ok_or_else(|| RegistryError::InvalidEndpoint(repo.url.clone()))?;
        let repository = format!("{}/{}", host, image.path());

        let reference = Reference::with_tag(
            host.clone(),
            image.path().to_string(),
            "latest".to_string(),
        );
        // list_tags authenticates with pull scope on first use.
        let auth = oci_auth(repo);

        let transports = transports(repo);
        let mut outcome = Err(RegistryError::InvalidEndpoint(repo.url.clone()));
        for (idx, transport) in transports.iter().enumerate() {
            let client = Client::try_from(client_config(&host, *transport)).map_err(|e| {
                RegistryError::Connection {
                    registry: host.clone(),
                    message: e.to_string(),
                }
            })?;
            outcome = list_all(&client, &reference, &auth, &host, &repository).await;
            match &outcome {
                Err(RegistryError::Connection { message, .. }) if idx + 1 < transports.len() => {
                    tracing::debug!(
                        registry = %host,
                        transport = ?transport,
                        error = %message,
                        "registry unreachable, trying next transport"
                    );
                }
                _ => break,
            }
        }

        let tags = outcome?;
        tracing::debug!(repository = %repository, count = tags.len(), "listed tags");
        Ok(tags)
    }
}

/// Fetch every page of a repository's tag list.
///
/// Stops on a short page, or on a page that brings nothing new, which is
/// what a registry ignoring `last=` looks like. Duplicates are dropped.
async fn list_all(
    client: &Client,
    reference: &Reference,
    auth: &OciAuth,
    host: &str,
    repository: &str,
) -> Result<Vec<String>, RegistryError> {
    let mut tags = Vec::new();
    let mut seen = HashSet::new();
    let mut last: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let page = client
            .list_tags(reference, auth, Some(PAGE_SIZE), last.as_deref())
            .await
            .map_err(|e| classify(e, host, repository))?;

        let full = page.tags.len() >= PAGE_SIZE;
        let next = page.tags.last().cloned();
        let mut fresh = 0;
        for tag in page.tags {
            if seen.insert(tag.clone()) {
                tags.push(tag);
                fresh += 1;
            }
        }

        if !full || fresh == 0 || next.is_none() || next == last {
            break;
        }
        last = next;
    }

    Ok(tags)
}
