// ABOUTME: Target image declarations: an image name plus its desired versions.
// ABOUTME: Replaced wholesale whenever the configuration is reloaded.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetImage {
    pub image: String,

    /// Tags that should exist in the local repository.
    #[serde(default)]
    pub versions: Vec<String>,
}

impl TargetImage {
    pub fn new<I, S>(image: impl Into<String>, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image: image.into(),
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }
}
