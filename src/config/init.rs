// ABOUTME: Config scaffolding for new installations.
// ABOUTME: Creates a commented config.yaml template in the home directory.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::config_path;

const TEMPLATE: &str = r#"# Container daemon used to pull, tag and push images.
# Leave endpoint empty to auto-detect a local Podman or Docker socket.
dockerConfig:
  endpoint: unix:///var/run/docker.sock
  # runtime: docker
  # loadFromEnvironment: false
  # useTls: false
  # tlsConfig:
  #   caPemPath: /etc/imagesync/ca.pem
  #   certPemPath: /etc/imagesync/cert.pem
  #   keyPemPath: /etc/imagesync/key.pem

# Local repository that images are pushed into.
repo:
  url: https://registry.local:5000
  pullPrefix: registry.local:5000
  # username: pusher
  # password: secret
  # insecure: false

# Remote repositories to pull from, tried in this order.
remoteRepos:
  - url: https://registry-1.docker.io
    pullPrefix: ""

# Images and the versions that should exist in the local repository.
images:
  - image: nginx
    versions: ["1.25", "1.26"]

# Recheck even without config changes. Set to null to disable.
resyncInterval: 10m
"#;

/// Write a template config into `home`, creating the directory if needed.
pub fn init_config(home: &Path, force: bool) -> Result<PathBuf> {
    let path = config_path(home);

    if path.exists() && !force {
        return Err(Error::AlreadyExists(path));
    }

    std::fs::create_dir_all(home).map_err(|source| Error::HomeDir {
        path: home.to_path_buf(),
        source,
    })?;
    std::fs::write(&path, TEMPLATE)?;

    Ok(path)
}
