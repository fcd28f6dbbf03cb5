// ABOUTME: Integration tests for the sync worker's public surface.
// ABOUTME: Tag diffing, availability ordering, and the wake/quit lifecycle.

use imagesync::config::{DockerConfig, RemoteRepository, SharedConfig, SyncConfig, TargetImage};
use imagesync::registry::OciTagLister;
use imagesync::runtime::BollardRuntime;
use imagesync::sync::*;
use imagesync::types::ImageRef;
use std::collections::BTreeSet;
use std::time::Duration;

fn set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

mod diffing {
    use super::*;

    #[test]
    fn scenario_one_missing_tag() {
        assert_eq!(needed_tags(["1.21", "1.22"], ["1.21"]), set(&["1.22"]));
    }

    #[test]
    fn present_extras_are_ignored() {
        assert_eq!(needed_tags(["1.21"], ["1.20", "1.21", "latest"]), set(&[]));
    }

    #[test]
    fn duplicate_desired_tags_collapse() {
        assert_eq!(needed_tags(["7", "7", "8"], ["8"]), set(&["7"]));
    }
}

mod availability {
    use super::*;

    #[test]
    fn work_item_only_records_needed_tags() {
        let mut item = WorkItem::new(
            TargetImage::new("nginx", ["1.21", "1.22"]),
            ImageRef::qualify("nginx").unwrap(),
            set(&["1.22"]),
        );
        let remote = RemoteRepository::new("https://mirror.example.com");

        item.record_remote_tags(&remote, &["1.20", "1.21", "1.22"]);

        assert_eq!(item.availability.len(), 1);
        assert_eq!(item.availability.tags().collect::<Vec<_>>(), ["1.22"]);
        let first = item.availability.candidates("1.22").unwrap().first();
        assert_eq!(first.source.url, "https://mirror.example.com");
        assert_eq!(first.tag, "1.22");
    }

    #[test]
    fn sources_are_kept_in_probe_order() {
        let mut map = AvailabilityMap::default();
        for url in ["https://r1.example.com", "https://r2.example.com", "https://r3.example.com"] {
            map.record(&RemoteRepository::new(url), "1.22");
        }
        let order: Vec<_> = map
            .candidates("1.22")
            .unwrap()
            .iter()
            .map(|c| c.source.url.clone())
            .collect();
        assert_eq!(
            order,
            ["https://r1.example.com", "https://r2.example.com", "https://r3.example.com"]
        );
    }
}

mod lifecycle {
    use super::*;

    // A config with no remotes never touches the network, so a lazily
    // connected runtime is enough to drive the real worker.
    fn idle_worker() -> (ImageSyncWorker<BollardRuntime, OciTagLister>, SyncHandle) {
        let runtime = BollardRuntime::connect(&DockerConfig {
            endpoint: "tcp://127.0.0.1:2375".to_string(),
            ..Default::default()
        })
        .unwrap();
        let config = SharedConfig::new(SyncConfig {
            images: vec![TargetImage::new("nginx", ["1.21"])],
            ..Default::default()
        });
        ImageSyncWorker::new(config, runtime, OciTagLister::new())
    }

    #[tokio::test]
    async fn single_pass_without_remotes_needs_nothing() {
        let (worker, handle) = idle_worker();
        let report = worker.run_pass().await;
        assert_eq!(report.needed, 0);
        assert!(report.transfers.is_empty());
        assert!(!report.interrupted);
        assert_eq!(handle.status().passes_completed, 1);
    }

    #[tokio::test]
    async fn wake_runs_another_pass_and_quit_is_idempotent() {
        let (worker, handle) = idle_worker();
        let task = tokio::spawn(worker.run());
        let mut status = handle.subscribe();

        tokio::time::timeout(
            Duration::from_secs(5),
            status.wait_for(|s| s.state == WorkerState::Sleeping && s.passes_completed == 1),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(handle.wake(), WakeOutcome::Queued);
        tokio::time::timeout(
            Duration::from_secs(5),
            status.wait_for(|s| s.state == WorkerState::Sleeping && s.passes_completed == 2),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(handle.quit());
        assert!(!handle.quit());
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(handle.status().state, WorkerState::Terminated);
        assert!(handle.status().state.is_terminal());
        assert_eq!(handle.wake(), WakeOutcome::Terminated);
    }
}
