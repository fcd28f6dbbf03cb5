// ABOUTME: Per-pass planning data: needed tag sets, source availability, and work items.
// ABOUTME: Pure data and set arithmetic; no I/O happens here.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use nonempty::NonEmpty;

use crate::config::{RemoteRepository, TargetImage};
use crate::types::ImageRef;

/// Desired tags not yet present locally.
///
/// Membership is exact string equality; the result does not depend on the
/// order either input is enumerated in.
pub fn needed_tags<D, P>(desired: D, present: P) -> BTreeSet<String>
where
    D: IntoIterator,
    D::Item: AsRef<str>,
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    let present: HashSet<String> = present
        .into_iter()
        .map(|t| t.as_ref().to_string())
        .collect();
    desired
        .into_iter()
        .map(|t| t.as_ref().to_string())
        .filter(|t| !present.contains(t))
        .collect()
}

/// A repository observed to hold a needed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: RemoteRepository,
    pub tag: String,
}

/// Tag to candidate sources, in the order the sources were probed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityMap {
    entries: BTreeMap<String, NonEmpty<Candidate>>,
}

impl AvailabilityMap {
    /// Append `source` as a candidate for `tag`. A source is recorded at
    /// most once per tag.
    pub fn record(&mut self, source: &RemoteRepository, tag: &str) {
        let candidate = Candidate {
            source: source.clone(),
            tag: tag.to_string(),
        };
        match self.entries.get_mut(tag) {
            Some(list) => {
                if !list.iter().any(|c| c.source == *source) {
                    list.push(candidate);
                }
            }
            None => {
                self.entries
                    .insert(tag.to_string(), NonEmpty::new(candidate));
            }
        }
    }

    pub fn candidates(&self, tag: &str) -> Option<&NonEmpty<Candidate>> {
        self.entries.get(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Everything one pass knows about a target that is missing tags.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub target: TargetImage,
    pub reference: ImageRef,
    pub needed: BTreeSet<String>,
    pub availability: AvailabilityMap,
}

impl WorkItem {
    pub fn new(target: TargetImage, reference: ImageRef, needed: BTreeSet<String>) -> Self {
        Self {
            target,
            reference,
            needed,
            availability: AvailabilityMap::default(),
        }
    }

    /// Record the needed tags found in a remote listing. Returns how many
    /// of the listed tags were needed.
    pub fn record_remote_tags<S: AsRef<str>>(
        &mut self,
        source: &RemoteRepository,
        listed: &[S],
    ) -> usize {
        let mut matched = 0;
        for tag in listed {
            let tag = tag.as_ref();
            if self.needed.contains(tag) {
                self.availability.record(source, tag);
                matched += 1;
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(needed: &[&str]) -> WorkItem {
        WorkItem::new(
            TargetImage::new("nginx", needed.iter().copied()),
            ImageRef::qualify("nginx").unwrap(),
            needed.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn needed_is_desired_minus_present() {
        let needed = needed_tags(["1.21", "1.22"], ["1.21"]);
        assert_eq!(needed, BTreeSet::from(["1.22".to_string()]));
    }

    #[test]
    fn nothing_present_means_everything_needed() {
        let present: [&str; 0] = [];
        let needed = needed_tags(["1.21", "1.22"], present);
        assert_eq!(needed.len(), 2);
    }

    #[test]
    fn tags_compare_as_plain_strings() {
        let needed = needed_tags(["1.0", "v1.0"], ["1.0.0", "v1.0"]);
        assert_eq!(needed, BTreeSet::from(["1.0".to_string()]));
    }

    #[test]
    fn candidates_keep_probe_order() {
        let r1 = RemoteRepository::new("https://r1.example.com");
        let r2 = RemoteRepository::new("https://r2.example.com");
        let mut work = item(&["1.22"]);

        assert_eq!(work.record_remote_tags(&r1, &["1.21", "1.22"]), 1);
        assert_eq!(work.record_remote_tags(&r2, &["1.22"]), 1);

        let candidates = work.availability.candidates("1.22").unwrap();
        let urls: Vec<_> = candidates.iter().map(|c| c.source.url.as_str()).collect();
        assert_eq!(urls, ["https://r1.example.com", "https://r2.example.com"]);
        assert!(work.availability.candidates("1.21").is_none());
    }

    #[test]
    fn repeated_listing_does_not_duplicate_a_source() {
        let r1 = RemoteRepository::new("https://r1.example.com");
        let mut work = item(&["1.22"]);
        work.record_remote_tags(&r1, &["1.22", "1.22"]);
        assert_eq!(work.availability.candidates("1.22").unwrap().len(), 1);
    }

    proptest! {
        #[test]
        fn needed_ignores_enumeration_order(
            desired in proptest::collection::vec("[a-z0-9.]{1,6}", 0..12),
            present in proptest::collection::vec("[a-z0-9.]{1,6}", 0..12),
        ) {
            let forward = needed_tags(&desired, &present);

            let mut desired_rev = desired.clone();
            desired_rev.reverse();
            let mut present_rev = present.clone();
            present_rev.reverse();
            let backward = needed_tags(&desired_rev, &present_rev);

            prop_assert_eq!(&forward, &backward);
            for tag in &forward {
                prop_assert!(desired.contains(tag));
                prop_assert!(!present.contains(tag));
            }
            for tag in &desired {
                prop_assert_eq!(forward.contains(tag), !present.contains(tag));
            }
        }
    }
}
