//! The top-level configuration document.
//!
//! A document is constructed exactly once from a raw YAML tree: the schema
//! version tag selects a migration function that normalizes the tree to the
//! newest shape, the structural visitor checks the normalized tree against
//! the declared schema, typed construction loads every section, and the
//! whole-document checks (reserved tag, availability zones) run on the
//! result. Either every check passes and the document is returned, or
//! construction fails with all violations joined into one error. The
//! document is immutable afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use snafu::{OptionExt, ResultExt, Snafu};

use crate::{
    cloud::{self, TEMPLATE_REGION, ZoneProvider},
    loader, render,
    schema::{self, FieldKind, RecordSchema, field},
    sections::{
        CertsConfig, ClusterConfig, DnsConfig, InstallConfig, NetworkConfig, StorageConfig,
        certs, cluster, dns, install, network, storage,
    },
    validate::{Report, Violation, Violations},
};

/// The newest supported schema version. Loaded documents are normalized to
/// this version regardless of the tag they were authored against.
pub const SCHEMA_VERSION: &str = "0.0.2";

/// Tag key injected into [`ConfigDocument::effective_tags`]. Supplying it
/// directly in the document's tag mapping is an error.
pub const DEPLOY_ID_TAG: &str = "groundwork-deploy-id";

const SUPPORTED_VERSIONS: [&str; 3] = ["0.0.0", "0.0.1", "0.0.2"];

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse configuration document"))]
    Parse { source: serde_yaml::Error },

    #[snafu(display("configuration document is not a mapping"))]
    NotAMapping,

    #[snafu(display("configuration document carries no schema version tag"))]
    MissingSchemaVersion,

    #[snafu(display(
        "unsupported schema version {version:?}, expected one of {SUPPORTED_VERSIONS:?}"
    ))]
    UnsupportedSchemaVersion { version: String },

    #[snafu(display("required section {name:?} is missing"))]
    MissingSection { name: &'static str },

    #[snafu(transparent)]
    Load { source: loader::Error },

    #[snafu(transparent)]
    Validation { source: Violations },

    #[snafu(transparent)]
    ZoneLookup { source: cloud::Error },
}

pub(crate) static DOCUMENT_SCHEMA: RecordSchema = RecordSchema {
    doc: "",
    base: None,
    fields: &[
        field("schema", FieldKind::Str),
        field("name", FieldKind::Str),
        field("region", FieldKind::Str),
        field("account_id", FieldKind::Str),
        field("tags", FieldKind::StrMap),
        field("create_iam_roles_for_service_accounts", FieldKind::Bool),
        field("network", FieldKind::Record(&network::SCHEMA)),
        field("storage", FieldKind::Record(&storage::SCHEMA)),
        field("dns", FieldKind::Record(&dns::SCHEMA)),
        field("cluster", FieldKind::Record(&cluster::SCHEMA)),
        field("certificates", FieldKind::Record(&certs::SCHEMA)),
        field("install", FieldKind::Record(&install::SCHEMA)),
    ],
};

/// A fully migrated and validated configuration document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigDocument {
    pub schema: String,
    /// Deployment name. Prefixes provisioned resource names and doubles as
    /// the deployment identifier tag value.
    pub name: String,
    pub region: String,
    pub account_id: String,
    /// User-supplied tags. Never contains [`DEPLOY_ID_TAG`]; see
    /// [`Self::effective_tags`].
    pub tags: BTreeMap<String, String>,
    pub create_iam_roles_for_service_accounts: bool,
    pub network: NetworkConfig,
    pub storage: Option<StorageConfig>,
    pub dns: Option<DnsConfig>,
    pub cluster: ClusterConfig,
    pub certificates: Option<CertsConfig>,
    pub install: Option<InstallConfig>,
}

/// Top-level scalar fields, loaded after the sections have been popped.
/// `name`, `region` and `account_id` are the only required keys in the
/// whole document.
#[derive(Debug, Deserialize)]
struct RootFields {
    name: String,
    region: String,
    account_id: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    create_iam_roles_for_service_accounts: bool,
}

impl ConfigDocument {
    /// Parses and loads a document from YAML text.
    pub fn from_yaml(text: &str, zones: &dyn ZoneProvider) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text).context(ParseSnafu)?;
        let Value::Mapping(raw) = value else {
            return NotAMappingSnafu.fail();
        };
        Self::load(raw, zones)
    }

    /// Loads a document from a raw mapping: version dispatch, migration,
    /// structural check, typed construction, whole-document checks.
    ///
    /// An unknown schema version tag is fatal before any other field is
    /// inspected.
    pub fn load(mut raw: Mapping, zones: &dyn ZoneProvider) -> Result<Self> {
        let version = raw
            .get(&Value::from("schema"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .context(MissingSchemaVersionSnafu)?;

        let mut report = Report::default();
        match version.as_str() {
            "0.0.0" => Self::migrate_from_0_0_0(&mut raw, &mut report),
            "0.0.1" => Self::migrate_from_0_0_1(&mut raw),
            "0.0.2" => Self::migrate_from_0_0_2(&mut raw),
            _ => return UnsupportedSchemaVersionSnafu { version }.fail(),
        }
        tracing::debug!(%version, "normalized configuration document");

        Self::build(raw, report, zones)
    }

    /// Normalizes a 0.0.0 tree to the newest shape: the availability zone
    /// list moves from the document root into the network section, the
    /// unmanaged node group map gains its current name, and keys later
    /// versions introduced are dropped with a warning.
    fn migrate_from_0_0_0(raw: &mut Mapping, report: &mut Report) {
        if let Some(zones) = raw.remove(&Value::from("availability_zones")) {
            if !zones.is_null() {
                let network = raw
                    .entry(Value::from("network"))
                    .or_insert_with(|| Value::Mapping(Mapping::new()));
                if let Some(network) = network.as_mapping_mut() {
                    network.insert("availability_zones".into(), zones);
                }
            }
        }

        // 0.0.0 predates the service-account role flag; it always loads as
        // false.
        if raw
            .remove(&Value::from("create_iam_roles_for_service_accounts"))
            .is_some()
        {
            report.unknown_key("config", "create_iam_roles_for_service_accounts");
        }

        if let Some(cluster) = raw
            .get_mut(&Value::from("cluster"))
            .and_then(Value::as_mapping_mut)
        {
            ClusterConfig::migrate_0_0_0(cluster);
        }
        if let Some(install) = raw
            .get_mut(&Value::from("install"))
            .and_then(Value::as_mapping_mut)
        {
            InstallConfig::migrate_0_0_0(install, report);
        }
    }

    /// 0.0.1 documents already use the newest shape for every section.
    fn migrate_from_0_0_1(_raw: &mut Mapping) {}

    // NOTE: on the next schema change, fill this out and drop 0.0.0 support.
    fn migrate_from_0_0_2(raw: &mut Mapping) {
        Self::migrate_from_0_0_1(raw);
    }

    fn build(mut raw: Mapping, mut report: Report, zones: &dyn ZoneProvider) -> Result<Self> {
        schema::check_record("config", &DOCUMENT_SCHEMA, &raw, &mut report);
        let mut report = report.checkpoint()?;

        raw.remove(&Value::from("schema"));
        let network = take_section(&mut raw, "network", &mut report, NetworkConfig::load)?
            .context(MissingSectionSnafu { name: "network" })?;
        let cluster = take_section(&mut raw, "cluster", &mut report, ClusterConfig::load)?
            .context(MissingSectionSnafu { name: "cluster" })?;
        let storage = take_section(&mut raw, "storage", &mut report, StorageConfig::load)?;
        let dns = take_section(&mut raw, "dns", &mut report, DnsConfig::load)?;
        let certificates = take_section(&mut raw, "certificates", &mut report, CertsConfig::load)?;
        let install = take_section(&mut raw, "install", &mut report, InstallConfig::load)?;

        let (root, residual): (RootFields, loader::Residual) =
            loader::load_record("config", &DOCUMENT_SCHEMA, raw)?;
        report.unused_keys("config", &residual);

        if root.tags.contains_key(DEPLOY_ID_TAG) {
            report.violation(Violation::ReservedTag {
                key: DEPLOY_ID_TAG.to_owned(),
            });
        }

        let document = Self {
            schema: SCHEMA_VERSION.to_owned(),
            name: root.name,
            region: root.region,
            account_id: root.account_id,
            tags: root.tags,
            create_iam_roles_for_service_accounts: root.create_iam_roles_for_service_accounts,
            network,
            storage,
            dns,
            cluster,
            certificates,
            install,
        };
        document.check_zones(zones, &mut report)?;

        report.finish()?;
        Ok(document)
    }

    /// Cross-checks every node group's explicit zone list against the zones
    /// the cloud account reports for the region, truncated to
    /// `network.max_azs`. Skipped entirely for template documents, so a
    /// template validates without cloud access.
    fn check_zones(&self, zones: &dyn ZoneProvider, report: &mut Report) -> Result<()> {
        if self.region == TEMPLATE_REGION {
            return Ok(());
        }

        let mut available = zones.availability_zones(&self.region)?;
        available.truncate(self.network.max_azs);

        let groups = self
            .cluster
            .managed_nodegroups
            .iter()
            .map(|(name, group)| (name, &group.base))
            .chain(
                self.cluster
                    .unmanaged_nodegroups
                    .iter()
                    .map(|(name, group)| (name, &group.base)),
            );
        for (group, base) in groups {
            if base.availability_zones.is_empty() {
                continue;
            }
            let bad: Vec<String> = base
                .availability_zones
                .iter()
                .filter(|zone| !available.contains(zone))
                .cloned()
                .collect();
            if !bad.is_empty() {
                report.violation(Violation::ZonesUnavailable {
                    group: group.clone(),
                    zones: bad,
                    available: available.clone(),
                });
            }
        }
        Ok(())
    }

    /// The user tags plus the injected deployment identifier tag. The stored
    /// [`Self::tags`] mapping never contains the identifier; it is computed
    /// here and folded back into plain tags on render.
    pub fn effective_tags(&self) -> BTreeMap<String, String> {
        let mut tags = self.tags.clone();
        tags.insert(DEPLOY_ID_TAG.to_owned(), self.name.clone());
        tags
    }

    /// Serializes the document back to canonical YAML; see [`render`].
    pub fn render(&self, disable_comments: bool) -> Result<String, render::Error> {
        render::render(self, disable_comments)
    }

    /// An unfilled template at the newest schema version. Identity fields
    /// hold the fill-in sentinel, so the template loads without contacting
    /// the zone provider.
    pub fn template() -> Self {
        let mut cluster = ClusterConfig {
            version: "1.27".to_owned(),
            max_nodegroup_azs: 3,
            ..ClusterConfig::default()
        };
        cluster.managed_nodegroups.insert(
            "compute".to_owned(),
            crate::sections::ManagedNodegroup {
                base: crate::sections::NodegroupBase {
                    disk_size: 100,
                    min_size: 1,
                    max_size: 10,
                    instance_types: vec!["m5.2xlarge".to_owned()],
                    ssm_agent: true,
                    ..crate::sections::NodegroupBase::default()
                },
                spot: false,
                desired_size: 1,
            },
        );

        Self {
            schema: SCHEMA_VERSION.to_owned(),
            name: TEMPLATE_REGION.to_owned(),
            region: TEMPLATE_REGION.to_owned(),
            account_id: TEMPLATE_REGION.to_owned(),
            tags: BTreeMap::new(),
            create_iam_roles_for_service_accounts: false,
            network: NetworkConfig::default(),
            storage: Some(StorageConfig::default()),
            dns: None,
            cluster,
            certificates: None,
            install: Some(InstallConfig::default()),
        }
    }
}

/// Pops one section out of the document root and loads it with the shared
/// report. Absent and null sections load as [`None`].
fn take_section<T>(
    raw: &mut Mapping,
    name: &'static str,
    report: &mut Report,
    load: impl FnOnce(&str, Mapping, &mut Report) -> Result<T, loader::Error>,
) -> Result<Option<T>> {
    let Some(value) = raw.remove(&Value::from(name)) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }

    let scope = format!("config.{name}");
    let section = loader::expect_mapping(&scope, value)?;
    Ok(Some(load(&scope, section, report)?))
}
