// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, defaults, create-or-read, and shared config snapshots.

use imagesync::config::*;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
repo:
  url: https://registry.local:5000
images:
  - image: nginx
    versions: ["1.21"]
"#;
        let config = SyncConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.repo.url, "https://registry.local:5000");
        assert!(config.remote_repos.is_empty());
        assert_eq!(config.images[0].image, "nginx");
        assert_eq!(config.resync_interval, Some(Duration::from_secs(600)));
        assert_eq!(config.watch_debounce, Duration::from_secs(1));
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
dockerConfig:
  endpoint: tcp://10.0.0.2:2376
  runtime: podman
  useTls: true
  timeout: 30s
  tlsConfig:
    caPemPath: /certs/ca.pem
    certPemPath: /certs/cert.pem
    keyPemPath: /certs/key.pem

repo:
  url: https://registry.local:5000
  pullPrefix: registry.local:5000
  username: pusher
  password: secret
  insecure: true

remoteRepos:
  - url: https://registry-1.docker.io
  - url: https://mirror.example.com
    pullPrefix: mirror.example.com
    metaHeaders:
      X-Meta-Team: ["platform"]

images:
  - image: nginx
    versions: ["1.21", "1.22"]
  - image: bitnami/redis
    versions: ["7.2"]

resyncInterval: 5m
watchDebounce: 250ms
"#;
        let config = SyncConfig::from_yaml(yaml).unwrap();

        let docker = &config.docker_config;
        assert_eq!(docker.endpoint, "tcp://10.0.0.2:2376");
        assert_eq!(docker.runtime, Some(imagesync::runtime::RuntimeType::Podman));
        assert!(docker.use_tls);
        assert_eq!(docker.timeout, Duration::from_secs(30));
        assert_eq!(
            docker.tls_config.ca_pem_path.as_deref(),
            Some(std::path::Path::new("/certs/ca.pem"))
        );

        assert!(config.repo.insecure);
        assert!(config.repo.requires_auth());
        assert_eq!(config.remote_repos.len(), 2);
        assert_eq!(
            config.remote_repos[1].meta_headers["X-Meta-Team"],
            vec!["platform".to_string()]
        );
        assert_eq!(config.images[1].versions, vec!["7.2"]);
        assert_eq!(config.resync_interval, Some(Duration::from_secs(300)));
        assert_eq!(config.watch_debounce, Duration::from_millis(250));
    }

    #[test]
    fn null_resync_disables_it() {
        let config = SyncConfig::from_yaml("resyncInterval: null\n").unwrap();
        assert_eq!(config.resync_interval, None);
    }

    #[test]
    fn yaml_roundtrip_keeps_camel_case_keys() {
        let mut config = SyncConfig::default();
        config.remote_repos.push(RemoteRepository::new("https://a.example.com").with_pull_prefix("a.example.com"));
        config.images.push(TargetImage::new("nginx", ["1.21"]));

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("remoteRepos:"));
        assert!(yaml.contains("pullPrefix: a.example.com"));
        assert!(!yaml.contains("password"));

        let parsed = SyncConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}

mod validation {
    use super::*;

    fn valid() -> SyncConfig {
        SyncConfig {
            docker_config: DockerConfig {
                endpoint: DEFAULT_DOCKER_ENDPOINT.to_string(),
                ..Default::default()
            },
            repo: RemoteRepository::new("https://registry.local:5000"),
            remote_repos: vec![RemoteRepository::new("https://registry-1.docker.io")],
            images: vec![TargetImage::new("nginx", ["1.21"])],
            ..Default::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn missing_local_repo_with_targets_fails() {
        let config = SyncConfig {
            repo: RemoteRepository::default(),
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("repo"));
    }

    #[test]
    fn empty_config_needs_no_local_repo() {
        let config = SyncConfig {
            docker_config: valid().docker_config,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn remote_without_host_fails() {
        let mut config = valid();
        config.remote_repos.push(RemoteRepository::new(""));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("remoteRepos[1]"));
    }

    #[test]
    fn empty_image_name_fails() {
        let mut config = valid();
        config.images.push(TargetImage::new(" ", ["1"]));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("images[1]"));
    }

    #[test]
    fn empty_endpoint_fails_unless_from_environment() {
        let mut config = valid();
        config.docker_config.endpoint.clear();
        assert!(config.validate().is_err());

        config.docker_config.load_from_environment = true;
        assert!(config.validate().is_ok());
    }
}

mod files {
    use super::*;

    #[test]
    fn create_or_read_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path());

        let (created, fresh) = SyncConfig::create_or_read(&path).unwrap();
        assert!(fresh);
        assert!(path.exists());
        assert!(!created.docker_config.endpoint.is_empty());

        let (read, fresh) = SyncConfig::create_or_read(&path).unwrap();
        assert!(!fresh);
        assert_eq!(read, created);
    }

    #[test]
    fn resolve_home_defaults_to_etc() {
        assert_eq!(
            resolve_home(None).unwrap(),
            std::path::PathBuf::from(DEFAULT_HOME_DIR)
        );
    }

    #[test]
    fn resolve_home_makes_relative_paths_absolute() {
        let home = resolve_home(Some(std::path::Path::new("state"))).unwrap();
        assert!(home.is_absolute());
        assert!(home.ends_with("state"));
    }

    #[test]
    fn init_template_is_a_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_config(dir.path(), false).unwrap();
        let config = SyncConfig::load(&path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.images[0].image, "nginx");
    }
}

mod shared {
    use super::*;

    #[test]
    fn snapshot_copies_local_remotes_and_targets() {
        let shared = SharedConfig::new(SyncConfig {
            repo: RemoteRepository::new("https://registry.local:5000").with_pull_prefix("acme"),
            remote_repos: vec![
                RemoteRepository::new("https://a.example.com"),
                RemoteRepository::new("https://b.example.com"),
            ],
            images: vec![TargetImage::new("nginx", ["1.21"])],
            ..Default::default()
        });

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.local.pull_prefix, "acme");
        let urls: Vec<_> = snapshot.remotes.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, ["https://a.example.com", "https://b.example.com"]);
        assert_eq!(snapshot.targets.len(), 1);
    }

    #[test]
    fn clones_observe_replacements() {
        let shared = SharedConfig::default();
        let other = shared.clone();
        other.replace(SyncConfig {
            remote_repos: vec![RemoteRepository::new("https://a.example.com")],
            ..Default::default()
        });
        assert!(shared.has_remote_repositories());
        assert_eq!(shared.read(|c| c.remote_repos.len()), 1);
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let shared = SharedConfig::default();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if i == 0 {
                            shared.replace(SyncConfig {
                                images: vec![TargetImage::new("nginx", ["1.21"])],
                                ..Default::default()
                            });
                        } else {
                            let snapshot = shared.snapshot();
                            assert!(snapshot.targets.len() <= 1);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.snapshot().targets.len(), 1);
    }
}
