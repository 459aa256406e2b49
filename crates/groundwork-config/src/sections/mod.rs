//! Versioned configuration sections.
//!
//! Every section follows the same pattern: a typed record with a static
//! [`RecordSchema`](crate::schema::RecordSchema), one `from_<version>` entry
//! point per historical schema version that still needs support, and a
//! `load` used by the document aggregator once the raw tree has been
//! normalized to the newest shape. Older versions normalize to the same
//! in-memory shape the newest version produces.

use serde_yaml::Mapping;
use snafu::Snafu;

use crate::{
    loader,
    schema::{self, RecordSchema},
    validate::{Report, Violations},
};

pub mod certs;
pub mod cluster;
pub mod dns;
pub mod install;
pub mod network;
pub mod nodegroup;
pub mod storage;

pub use certs::CertsConfig;
pub use cluster::ClusterConfig;
pub use dns::DnsConfig;
pub use install::InstallConfig;
pub use network::NetworkConfig;
pub use nodegroup::{MachineImage, ManagedNodegroup, NodegroupBase, UnmanagedNodegroup};
pub use storage::StorageConfig;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(transparent)]
    Load { source: loader::Error },

    #[snafu(transparent)]
    Validation { source: Violations },
}

/// Runs the standalone pipeline for one section: structural check first,
/// batched and fatal as a whole, then typed load with residual warnings.
///
/// Used by the per-version section entry points; the document aggregator
/// drives the same steps itself with a shared [`Report`].
pub(crate) fn load_standalone<T>(
    scope: &str,
    section_schema: &RecordSchema,
    raw: Mapping,
    report: Report,
    load: impl FnOnce(Mapping, &mut Report) -> Result<T, loader::Error>,
) -> Result<T, Error> {
    let mut report = report;
    schema::check_record(scope, section_schema, &raw, &mut report);
    let mut report = report.checkpoint()?;
    let section = load(raw, &mut report)?;
    report.finish()?;
    Ok(section)
}
