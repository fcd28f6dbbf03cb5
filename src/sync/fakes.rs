// ABOUTME: In-memory runtime and tag lister doubles for worker tests.
// ABOUTME: Record every call so tests can assert order and count.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::config::RemoteRepository;
use crate::registry::{RegistryError, TagLister};
use crate::runtime::traits::sealed::Sealed;
use crate::runtime::{ImageError, ImageOps, RegistryAccess};
use crate::types::ImageRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Pull(String),
    Tag(String, String),
    Push(String),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRuntime {
    calls: Arc<Mutex<Vec<Call>>>,
    failing_pulls: HashSet<String>,
    fail_tag: bool,
    fail_push: bool,
}

impl FakeRuntime {
    pub(crate) fn failing_pull(mut self, tagged: &str) -> Self {
        self.failing_pulls.insert(tagged.to_string());
        self
    }

    pub(crate) fn failing_tag(mut self) -> Self {
        self.fail_tag = true;
        self
    }

    pub(crate) fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

impl Sealed for FakeRuntime {}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        tag: &str,
        _access: &RegistryAccess,
    ) -> Result<(), ImageError> {
        let name = reference.tagged(tag);
        self.calls.lock().push(Call::Pull(name.clone()));
        if self.failing_pulls.contains(&name) {
            return Err(ImageError::PullFailed(name));
        }
        Ok(())
    }

    async fn tag_image(
        &self,
        source: &ImageRef,
        target: &ImageRef,
        tag: &str,
    ) -> Result<(), ImageError> {
        self.calls
            .lock()
            .push(Call::Tag(source.tagged(tag), target.tagged(tag)));
        if self.fail_tag {
            return Err(ImageError::TagFailed(source.tagged(tag)));
        }
        Ok(())
    }

    async fn push_image(
        &self,
        reference: &ImageRef,
        tag: &str,
        _access: &RegistryAccess,
    ) -> Result<(), ImageError> {
        let name = reference.tagged(tag);
        self.calls.lock().push(Call::Push(name.clone()));
        if self.fail_push {
            return Err(ImageError::PushFailed(name));
        }
        Ok(())
    }
}

/// Opens a gated [`FakeLister`]. Once open it stays open.
#[derive(Debug)]
pub(crate) struct Gate(watch::Sender<bool>);

impl Gate {
    pub(crate) fn open(&self) {
        self.0.send_replace(true);
    }
}

#[derive(Debug, Clone)]
enum Listing {
    Tags(Vec<String>),
    Fail,
}

/// Tag listings keyed by repository URL and image path. Anything not
/// registered is reported as not found.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeLister {
    listings: HashMap<(String, String), Listing>,
    unreachable: HashSet<String>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    call_count: Option<Arc<watch::Sender<usize>>>,
    gate: Option<watch::Receiver<bool>>,
}

impl FakeLister {
    pub(crate) fn with_tags(mut self, url: &str, path: &str, tags: &[&str]) -> Self {
        self.listings.insert(
            (url.to_string(), path.to_string()),
            Listing::Tags(tags.iter().map(|t| t.to_string()).collect()),
        );
        self
    }

    pub(crate) fn failing_listing(mut self, url: &str, path: &str) -> Self {
        self.listings
            .insert((url.to_string(), path.to_string()), Listing::Fail);
        self
    }

    pub(crate) fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    /// Block every listing until the returned gate opens.
    pub(crate) fn gated(mut self) -> (Self, Gate) {
        let (tx, rx) = watch::channel(false);
        self.gate = Some(rx);
        self.call_count = Some(Arc::new(watch::channel(0).0));
        (self, Gate(tx))
    }

    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    /// Wait until at least `n` listings have started. Only for gated listers.
    pub(crate) async fn wait_for_calls(&self, n: usize) {
        if let Some(count) = &self.call_count {
            let mut rx = count.subscribe();
            let _ = rx.wait_for(|c| *c >= n).await;
        }
    }
}

impl Sealed for FakeLister {}

#[async_trait]
impl TagLister for FakeLister {
    async fn list_tags(
        &self,
        repo: &RemoteRepository,
        image: &ImageRef,
    ) -> Result<Vec<String>, RegistryError> {
        let key = (repo.url.clone(), image.path().to_string());
        self.calls.lock().push(key.clone());
        if let Some(count) = &self.call_count {
            count.send_modify(|c| *c += 1);
        }

        if let Some(gate) = &self.gate {
            let mut gate = gate.clone();
            let _ = gate.wait_for(|open| *open).await;
        }

        if self.unreachable.contains(&repo.url) {
            return Err(RegistryError::Connection {
                registry: repo.url.clone(),
                message: "connection refused".to_string(),
            });
        }

        match self.listings.get(&key) {
            Some(Listing::Tags(tags)) => Ok(tags.clone()),
            Some(Listing::Fail) => Err(RegistryError::Query {
                repository: format!("{}/{}", repo.url, image.path()),
                message: "unauthorized".to_string(),
            }),
            None => Err(RegistryError::NotFound(image.path().to_string())),
        }
    }
}
