//! Collaborator interface for the one live cloud lookup the configuration
//! engine performs: listing the availability zones of a region.
//!
//! Provisioning itself never goes through this crate; a [`ZoneProvider`] is
//! handed in by the caller and queried exactly once per document
//! construction. Lookup failures are propagated untouched, with no retry or
//! backoff, and callers wrap the lookup with their own timeout policy if they
//! need one.

use snafu::Snafu;

/// Sentinel region marking a document as an unfilled template.
///
/// Recognized by exact match. Documents using it skip the availability-zone
/// cross-check entirely, so templates validate without cloud access.
pub const TEMPLATE_REGION: &str = "__FILL__";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("availability zone lookup failed for region {region:?}: {message}"))]
    ZoneLookup { region: String, message: String },
}

/// Returns the availability zones of a region.
pub trait ZoneProvider {
    /// The ordered list of zone names available in `region`.
    fn availability_zones(&self, region: &str) -> Result<Vec<String>, Error>;
}

/// A [`ZoneProvider`] backed by a fixed list, independent of the region.
///
/// Useful for offline validation runs and tests.
#[derive(Clone, Debug, Default)]
pub struct FixedZones(Vec<String>);

impl FixedZones {
    pub fn new<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(zones.into_iter().map(Into::into).collect())
    }
}

impl ZoneProvider for FixedZones {
    fn availability_zones(&self, _region: &str) -> Result<Vec<String>, Error> {
        Ok(self.0.clone())
    }
}
