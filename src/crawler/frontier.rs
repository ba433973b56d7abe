//! Breadth-first crawl frontier
//!
//! Tracks the pending queue and the visited set of one job. A URL is keyed by
//! its canonical form, so `/a#top` and `/a` are the same page, but entries
//! keep the URL as it was linked (minus the fragment) for navigation. The frontier
//! keeps `visited` and `pending` disjoint: a URL is either waiting to be
//! processed or has already been handed out, never both.

use crate::url::{canonicalize, extract_domain, is_same_domain};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// URL to navigate, as linked, without its fragment
    pub url: Url,

    /// Link distance from the source URL
    pub depth: u32,
}

/// Pending and visited sets for a single job
#[derive(Debug)]
pub struct Frontier {
    domain: String,
    page_limit: usize,
    pending: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Seeds the frontier with the source URL
    ///
    /// The job's domain is taken from the source URL's host.
    pub fn new(source: &Url, page_limit: usize) -> Self {
        let mut source = source.clone();
        source.set_fragment(None);
        let domain = extract_domain(&source).unwrap_or_default();

        let mut frontier = Self {
            domain,
            page_limit,
            pending: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
        };

        frontier.queued.insert(page_key(&source));
        frontier.pending.push_back(FrontierEntry {
            url: source,
            depth: 0,
        });
        frontier
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Pops the next URL to process and marks it visited
    ///
    /// Returns `None` once the queue is empty or the page limit is reached.
    pub fn next(&mut self) -> Option<FrontierEntry> {
        while self.visited.len() < self.page_limit {
            let entry = self.pending.pop_front()?;
            let key = page_key(&entry.url);
            self.queued.remove(&key);

            if self.visited.contains(&key) || !is_same_domain(&entry.url, &self.domain) {
                tracing::trace!("Discarding {}", key);
                continue;
            }

            self.visited.insert(key);
            return Some(entry);
        }
        None
    }

    /// Queues the links discovered on a page, in discovery order
    ///
    /// Links that leave the domain, or that are already visited or pending,
    /// are dropped. Returns how many links were queued.
    pub fn ingest<I>(&mut self, links: I, depth: u32) -> usize
    where
        I: IntoIterator<Item = Url>,
    {
        let mut added = 0;

        for link in links {
            if !matches!(link.scheme(), "http" | "https") {
                continue;
            }

            let mut link = link;
            link.set_fragment(None);
            if !is_same_domain(&link, &self.domain) {
                continue;
            }

            let key = page_key(&link);
            if self.visited.contains(&key) || self.queued.contains(&key) {
                continue;
            }

            self.queued.insert(key);
            self.pending.push_back(FrontierEntry { url: link, depth });
            added += 1;
        }

        added
    }

    /// True once as many URLs have been handed out as the limit allows
    pub fn limit_reached(&self) -> bool {
        self.visited.len() >= self.page_limit
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Visited/pending key of a URL
fn page_key(url: &Url) -> String {
    canonicalize(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn urls(list: &[&str]) -> Vec<Url> {
        list.iter().map(|s| url(s)).collect()
    }

    #[test]
    fn test_seeded_with_source() {
        let mut frontier = Frontier::new(&url("https://example.com/#intro"), 10);
        assert_eq!(frontier.domain(), "example.com");
        assert_eq!(frontier.pending_count(), 1);

        let first = frontier.next().unwrap();
        assert_eq!(first.url.as_str(), "https://example.com/");
        assert_eq!(first.depth, 0);
        assert!(frontier.next().is_none());
    }

    #[test]
    fn test_breadth_first_order() {
        let mut frontier = Frontier::new(&url("https://example.com/"), 10);
        frontier.next().unwrap();

        frontier.ingest(urls(&["https://example.com/a", "https://example.com/b"]), 1);

        let a = frontier.next().unwrap();
        frontier.ingest(urls(&["https://example.com/a/deep"]), 2);

        let b = frontier.next().unwrap();
        let deep = frontier.next().unwrap();

        assert_eq!(a.url.path(), "/a");
        assert_eq!(b.url.path(), "/b");
        assert_eq!(deep.url.path(), "/a/deep");
        assert_eq!(deep.depth, 2);
    }

    #[test]
    fn test_entries_keep_the_linked_query() {
        let mut frontier = Frontier::new(&url("https://example.com/"), 10);
        frontier.next().unwrap();

        let added = frontier.ingest(
            urls(&[
                "https://example.com/search?print",
                "https://example.com/q?b=x%20y&a=1",
                "https://example.com/p?utm_source=x&id=7#top",
            ]),
            1,
        );
        assert_eq!(added, 3);

        let handed_out: Vec<String> = std::iter::from_fn(|| frontier.next())
            .map(|entry| entry.url.to_string())
            .collect();
        assert_eq!(
            handed_out,
            vec![
                "https://example.com/search?print",
                "https://example.com/q?b=x%20y&a=1",
                "https://example.com/p?utm_source=x&id=7",
            ]
        );
    }

    #[test]
    fn test_query_variants_are_one_page() {
        let mut frontier = Frontier::new(&url("https://example.com/"), 10);
        frontier.next().unwrap();

        let added = frontier.ingest(
            urls(&[
                "https://example.com/p?id=7&lang=en",
                "https://example.com/p?lang=en&id=7",
                "https://example.com/p?id=7&utm_source=x&lang=en",
            ]),
            1,
        );
        assert_eq!(added, 1);
        assert_eq!(
            frontier.next().unwrap().url.as_str(),
            "https://example.com/p?id=7&lang=en"
        );
    }

    #[test]
    fn test_dedup_against_visited_and_pending() {
        let mut frontier = Frontier::new(&url("https://example.com/"), 10);
        frontier.next().unwrap();

        let added = frontier.ingest(
            urls(&[
                "https://example.com/",
                "https://example.com/a",
                "https://example.com/a#section",
                "https://example.com/a",
            ]),
            1,
        );

        assert_eq!(added, 1);
        assert_eq!(frontier.pending_count(), 1);

        frontier.next().unwrap();
        assert_eq!(frontier.ingest(urls(&["https://example.com/a"]), 2), 0);
        assert_eq!(frontier.visited_count(), 2);
    }

    #[test]
    fn test_domain_scope() {
        let mut frontier = Frontier::new(&url("https://example.com/"), 10);
        frontier.next().unwrap();

        let added = frontier.ingest(
            urls(&[
                "https://other.com/",
                "https://sub.example.com/",
                "mailto:me@example.com",
                "https://EXAMPLE.com/upper",
            ]),
            1,
        );

        assert_eq!(added, 1);
        assert_eq!(frontier.next().unwrap().url.path(), "/upper");
    }

    #[test]
    fn test_page_limit() {
        let mut frontier = Frontier::new(&url("https://example.com/"), 2);
        frontier.next().unwrap();
        frontier.ingest(
            urls(&[
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c",
            ]),
            1,
        );

        assert!(frontier.next().is_some());
        assert!(frontier.limit_reached());
        assert!(frontier.next().is_none());
        assert_eq!(frontier.visited_count(), 2);
        assert_eq!(frontier.pending_count(), 2);
    }

    #[test]
    fn test_exhausted_below_limit() {
        let mut frontier = Frontier::new(&url("https://example.com/"), 5);
        frontier.next().unwrap();

        assert!(frontier.next().is_none());
        assert!(frontier.is_exhausted());
        assert!(!frontier.limit_reached());
    }

    #[test]
    fn test_limit_of_one() {
        let mut frontier = Frontier::new(&url("https://example.com/"), 1);
        frontier.next().unwrap();
        frontier.ingest(urls(&["https://example.com/a"]), 1);

        assert!(frontier.limit_reached());
        assert!(frontier.next().is_none());
    }
}
