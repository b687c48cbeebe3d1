//! Static origin/region deny-list for protected usage.

use std::collections::HashSet;

/// Origins that may only operate in normal mode.
pub const BLOCKED_ORIGINS: &[&str] = &["kiosko_publico", "demo_anonima"];

/// Regions that may only operate in normal mode. Empty for now.
pub const BLOCKED_REGIONS: &[&str] = &[];

/// Deny-set policy evaluated against a guard's origin and region.
#[derive(Debug, Clone)]
pub struct UsagePolicy {
    blocked_origins: HashSet<String>,
    blocked_regions: HashSet<String>,
}

impl UsagePolicy {
    /// Build a policy from explicit deny-sets.
    pub fn new<O, R>(blocked_origins: O, blocked_regions: R) -> Self
    where
        O: IntoIterator,
        O::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            blocked_origins: blocked_origins.into_iter().map(Into::into).collect(),
            blocked_regions: blocked_regions.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `false` if either the origin or the region is denied.
    pub fn allows(&self, origin: &str, region: &str) -> bool {
        !self.blocked_origins.contains(origin) && !self.blocked_regions.contains(region)
    }
}

impl Default for UsagePolicy {
    fn default() -> Self {
        Self::new(
            BLOCKED_ORIGINS.iter().copied(),
            BLOCKED_REGIONS.iter().copied(),
        )
    }
}
