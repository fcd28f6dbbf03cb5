// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Pulls, tags and pushes images on Docker or Podman via the Docker-compatible API.

use crate::config::DockerConfig;
use crate::runtime::detection::resolve_runtime;
use crate::runtime::error::RuntimeError;
use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ImageError, ImageOps, RegistryAccess, RegistryAuth, RuntimeInfo, RuntimeInfoError,
    RuntimeMetadata,
};
use crate::runtime::types::RuntimeType;
use crate::types::ImageRef;
use async_trait::async_trait;
use base64::Engine;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::query_parameters::{CreateImageOptions, PushImageOptions, TagImageOptions};
use futures::StreamExt;
use http_body_util::BodyExt;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_image_pull_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(image_name.to_string())
        }
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 401 || *status_code == 403 =>
        {
            ImageError::AuthenticationFailed(format!("{}: {}", image_name, e))
        }
        _ => ImageError::PullFailed(format!("{}: {}", image_name, e)),
    }
}

fn map_image_tag_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(image_name.to_string())
        }
        _ => ImageError::TagFailed(format!("{}: {}", image_name, e)),
    }
}

fn map_image_push_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(image_name.to_string())
        }
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 401 || *status_code == 403 =>
        {
            ImageError::AuthenticationFailed(format!("{}: {}", image_name, e))
        }
        _ => ImageError::PushFailed(format!("{}: {}", image_name, e)),
    }
}

fn docker_credentials(auth: Option<&RegistryAuth>) -> Option<DockerCredentials> {
    auth.map(|a| DockerCredentials {
        username: Some(a.username.clone()),
        password: Some(a.password.clone()),
        serveraddress: a.server.clone(),
        ..Default::default()
    })
}

/// Value for the libpod `X-Registry-Auth` header: base64url-encoded JSON.
fn registry_auth_header(auth: &RegistryAuth) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(&serde_json::json!({
        "username": auth.username,
        "password": auth.password,
        "serveraddress": auth.server.clone().unwrap_or_default(),
    }))?;
    Ok(base64::engine::general_purpose::URL_SAFE.encode(json))
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
///
/// Supports both Docker and Podman via Docker-compatible API.
/// For Podman, uses the native libpod API when a registry is marked insecure,
/// since only libpod can relax TLS verification per request.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
    socket_path: Option<String>,
}

impl std::fmt::Debug for BollardRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BollardRuntime")
            .field("runtime_type", &self.runtime_type)
            .field("socket_path", &self.socket_path)
            .finish()
    }
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
            socket_path: None,
        }
    }

    /// Create a new BollardRuntime with socket path for libpod API access.
    pub fn new_with_socket(client: Docker, runtime_type: RuntimeType, socket_path: String) -> Self {
        Self {
            client,
            runtime_type,
            socket_path: Some(socket_path),
        }
    }

    /// Connect to the container daemon described by the config.
    ///
    /// Handles environment-based connection, unix sockets (with runtime
    /// detection), plain TCP/HTTP, and TCP with TLS client certificates.
    pub fn connect(config: &DockerConfig) -> Result<Self, RuntimeError> {
        let timeout = config.timeout.as_secs();
        let runtime_type = config.runtime.unwrap_or(RuntimeType::Docker);

        if config.load_from_environment {
            let client = Docker::connect_with_defaults()
                .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
            return Ok(Self::new(client, runtime_type));
        }

        let endpoint = config.endpoint.trim();

        if config.socket_path().is_some() {
            let socket = resolve_runtime(&config.socket_override())?;
            let client =
                Docker::connect_with_unix(&socket.path, timeout, bollard::API_DEFAULT_VERSION)
                    .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
            return Ok(Self::new_with_socket(client, socket.runtime_type, socket.path));
        }

        let is_tcp = ["tcp://", "http://", "https://"]
            .iter()
            .any(|scheme| endpoint.starts_with(scheme));
        if !is_tcp {
            return Err(RuntimeInfoError::InvalidEndpoint(endpoint.to_string()).into());
        }

        let client = if config.use_tls {
            let tls = &config.tls_config;
            let (Some(key), Some(cert), Some(ca)) =
                (&tls.key_pem_path, &tls.cert_pem_path, &tls.ca_pem_path)
            else {
                return Err(RuntimeInfoError::ConnectionFailed(
                    "TLS enabled but certificate paths are incomplete".to_string(),
                )
                .into());
            };
            Docker::connect_with_ssl(
                endpoint,
                key,
                cert,
                ca,
                timeout,
                bollard::API_DEFAULT_VERSION,
            )
        } else {
            Docker::connect_with_http(endpoint, timeout, bollard::API_DEFAULT_VERSION)
        }
        .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        Ok(Self::new(client, runtime_type))
    }

    /// Get the runtime type (Docker or Podman).
    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    fn use_libpod(&self, access: &RegistryAccess) -> bool {
        access.insecure && self.runtime_type.relaxes_tls_per_request() && self.socket_path.is_some()
    }

    /// POST to the libpod API over the unix socket and wait for the
    /// progress stream to finish.
    ///
    /// Used for pulls and pushes against insecure registries with
    /// `tlsVerify=false`. Meta headers and credentials ride along as headers.
    async fn libpod_post(
        &self,
        uri: &str,
        image_name: &str,
        access: &RegistryAccess,
        failed: fn(String) -> ImageError,
    ) -> Result<(), ImageError> {
        let socket_path = self
            .socket_path
            .as_ref()
            .ok_or_else(|| failed("socket path not available for libpod API".to_string()))?;

        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| failed(format!("failed to connect to socket: {}", e)))?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| failed(format!("HTTP handshake failed: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("libpod connection error: {}", e);
            }
        });

        let mut builder = hyper::Request::builder()
            .method("POST")
            .uri(uri)
            .header("Host", "localhost");

        for (name, values) in &access.meta_headers {
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        if let Some(auth) = &access.auth {
            let header = registry_auth_header(auth)
                .map_err(|e| failed(format!("failed to encode credentials: {}", e)))?;
            builder = builder.header("X-Registry-Auth", header);
        }

        let req = builder
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .map_err(|e| failed(format!("failed to build request: {}", e)))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| failed(format!("request failed: {}", e)))?;

        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| failed(format!("failed to read response: {}", e)))?;
        let body_bytes = body.to_bytes();
        let body_text = String::from_utf8_lossy(&body_bytes);

        if !status.is_success() {
            return Err(failed(format!(
                "{}: libpod API error: {}",
                image_name, body_text
            )));
        }

        // Progress is streamed as JSON lines; failures show up inline.
        if body_text.contains("\"error\"") && !body_text.contains("\"error\":null") {
            return Err(failed(format!("{}: {}", image_name, body_text)));
        }

        Ok(())
    }
}

// Implement Sealed trait to allow runtime trait implementations
impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        Ok(RuntimeMetadata {
            name: self.runtime_type.display_name().to_string(),
            version: info.server_version.unwrap_or_default(),
            api_version: format!(
                "{}.{}",
                bollard::API_DEFAULT_VERSION.major_version,
                bollard::API_DEFAULT_VERSION.minor_version
            ),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        tag: &str,
        access: &RegistryAccess,
    ) -> Result<(), ImageError> {
        let image_name = reference.tagged(tag);

        if self.use_libpod(access) {
            let uri = format!(
                "/v4.0.0/libpod/images/pull?reference={}&tlsVerify=false",
                urlencoding::encode(&image_name)
            );
            return self
                .libpod_post(&uri, &image_name, access, ImageError::PullFailed)
                .await;
        }

        let opts = CreateImageOptions {
            from_image: Some(reference.to_string()),
            tag: Some(tag.to_string()),
            ..Default::default()
        };

        // Pull returns a stream of progress updates - consume it
        let mut stream =
            self.client
                .create_image(Some(opts), None, docker_credentials(access.auth.as_ref()));
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_image_pull_error(e, &image_name))?;
        }

        Ok(())
    }

    async fn tag_image(
        &self,
        source: &ImageRef,
        target: &ImageRef,
        tag: &str,
    ) -> Result<(), ImageError> {
        let source_name = source.tagged(tag);

        let opts = TagImageOptions {
            repo: Some(target.to_string()),
            tag: Some(tag.to_string()),
            ..Default::default()
        };

        self.client
            .tag_image(&source_name, Some(opts))
            .await
            .map_err(|e| map_image_tag_error(e, &source_name))
    }

    async fn push_image(
        &self,
        reference: &ImageRef,
        tag: &str,
        access: &RegistryAccess,
    ) -> Result<(), ImageError> {
        let image_name = reference.tagged(tag);

        if self.use_libpod(access) {
            let uri = format!(
                "/v4.0.0/libpod/images/{}/push?tlsVerify=false",
                urlencoding::encode(&image_name)
            );
            return self
                .libpod_post(&uri, &image_name, access, ImageError::PushFailed)
                .await;
        }

        let opts = PushImageOptions {
            tag: Some(tag.to_string()),
            ..Default::default()
        };

        let mut stream = self.client.push_image(
            &reference.to_string(),
            Some(opts),
            docker_credentials(access.auth.as_ref()),
        );
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_image_push_error(e, &image_name))?;
        }

        Ok(())
    }
}
