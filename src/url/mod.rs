//! URL handling module for Sumi-Shutter
//!
//! Pure helpers for normalizing caller input, validating URLs, resolving
//! discovered hrefs and deciding whether a link stays inside a job's domain.
//! Nothing here fails loudly on a malformed link: link extraction must be
//! able to skip bad hrefs without aborting the page.

mod domain;
mod normalize;
mod resolve;

pub use domain::{domain_of, extract_domain, is_same_domain};
pub use normalize::{canonicalize, is_valid_url, normalize_url, validate_source_url};
pub use resolve::resolve_link;
