// ABOUTME: Image repository name parsing and namespace qualification.
// ABOUTME: Handles formats like nginx, library/nginx, registry:5000/org/app.

use std::fmt;
use thiserror::Error;

/// Namespace that bare image names (no `/`) are placed into.
pub const DEFAULT_NAMESPACE: &str = "library";

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image name cannot be empty")]
    Empty,

    #[error("image name exceeds maximum length of {MAX_NAME_LEN} characters")]
    TooLong,

    #[error("invalid character in image name: {0:?}")]
    InvalidChar(char),

    #[error("invalid image name format: {0}")]
    InvalidFormat(String),

    #[error("image name must not carry a tag or digest: {0}")]
    UnexpectedTag(String),
}

/// A repository name such as `library/nginx` or `registry.local:5000/org/app`.
///
/// Unlike a full pull reference this never carries a tag: tags are tracked
/// separately as the desired versions of a target image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageRef {
    registry: Option<String>,
    path: String,
}

impl ImageRef {
    /// Parse a repository name exactly as written.
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }
        if input.len() > MAX_NAME_LEN {
            return Err(ParseImageRefError::TooLong);
        }

        for c in input.chars() {
            if !c.is_ascii_alphanumeric()
                && c != '/'
                && c != ':'
                && c != '.'
                && c != '-'
                && c != '_'
                && c != '@'
            {
                return Err(ParseImageRefError::InvalidChar(c));
            }
        }

        if input.contains('@') {
            return Err(ParseImageRefError::UnexpectedTag(input.to_string()));
        }

        let (registry, path) = Self::split_registry(input);

        if path.contains(':') {
            return Err(ParseImageRefError::UnexpectedTag(input.to_string()));
        }

        if let Some(registry) = registry {
            Self::validate_registry(registry, input)?;
        }
        for component in path.split('/') {
            Self::validate_component(component, input)?;
        }

        Ok(Self {
            registry: registry.map(str::to_string),
            path: path.to_string(),
        })
    }

    /// Qualify a declared image name into the default namespace, then parse it.
    ///
    /// `nginx` becomes `library/nginx`; anything that already has a `/` is
    /// parsed unchanged.
    pub fn qualify(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if !input.is_empty() && !input.contains('/') {
            return Self::parse(&format!("{}/{}", DEFAULT_NAMESPACE, input));
        }
        Self::parse(input)
    }

    /// Join a pull prefix in front of this name.
    ///
    /// An empty prefix yields the name unchanged.
    pub fn with_prefix(&self, prefix: &str) -> Result<Self, ParseImageRefError> {
        let prefix = prefix.trim().trim_end_matches('/');
        if prefix.is_empty() {
            return Ok(self.clone());
        }
        Self::parse(&format!("{}/{}", prefix, self))
    }

    // A registry is present if the first component contains a dot or colon,
    // or is "localhost".
    fn split_registry(input: &str) -> (Option<&str>, &str) {
        match input.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first), rest)
            }
            _ => (None, input),
        }
    }

    fn validate_registry(registry: &str, input: &str) -> Result<(), ParseImageRefError> {
        let (host, port) = match registry.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (registry, None),
        };

        let host_ok = !host.is_empty()
            && !host.starts_with(['.', '-'])
            && !host.ends_with(['.', '-'])
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        let port_ok = port.is_none_or(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

        if host_ok && port_ok {
            Ok(())
        } else {
            Err(ParseImageRefError::InvalidFormat(input.to_string()))
        }
    }

    // Path components are lowercase alphanumerics joined by single
    // separators: '.', '_', "__" or any run of '-'.
    fn validate_component(component: &str, input: &str) -> Result<(), ParseImageRefError> {
        let invalid = || ParseImageRefError::InvalidFormat(input.to_string());

        let bytes = component.as_bytes();
        let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
            return Err(invalid());
        };
        if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
            return Err(invalid());
        }

        let mut separator = String::new();
        for c in component.chars() {
            if c.is_ascii_uppercase() {
                return Err(invalid());
            }
            if c.is_ascii_alphanumeric() {
                let valid_separator = separator.is_empty()
                    || separator == "."
                    || separator == "_"
                    || separator == "__"
                    || separator.chars().all(|s| s == '-');
                if !valid_separator {
                    return Err(invalid());
                }
                separator.clear();
            } else {
                separator.push(c);
            }
        }
        Ok(())
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    /// Repository path without the registry, e.g. `library/nginx`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Render as `name:tag` for logging and daemon calls.
    pub fn tagged(&self, tag: &str) -> String {
        format!("{}:{}", self, tag)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.path)
    }
}
