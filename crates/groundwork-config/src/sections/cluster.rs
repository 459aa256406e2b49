//! Kubernetes cluster settings and the node group maps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::{
    loader::{self, Residual},
    schema::{FieldKind, RecordSchema, commented, field, hidden},
    validate::Report,
};

use super::nodegroup::{
    MANAGED_SCHEMA, ManagedNodegroup, NODEGROUP_BASE_DOC, UNMANAGED_SCHEMA, UnmanagedNodegroup,
};

const SCOPE: &str = "config.cluster";

pub(crate) static SCHEMA: RecordSchema = RecordSchema {
    doc: "\
Cluster-wide settings plus the managed and unmanaged node groups, keyed by a
user-chosen group name. Global labels and tags are applied to every node of
every group.",
    base: None,
    fields: &[
        field("version", FieldKind::Str),
        field("private_api", FieldKind::Bool),
        field("max_nodegroup_azs", FieldKind::Int),
        field("global_node_labels", FieldKind::StrMap),
        field("global_node_tags", FieldKind::StrMap),
        hidden("secrets_encryption_key_arn", FieldKind::Str),
        commented(
            "managed_nodegroups",
            FieldKind::RecordMap(&MANAGED_SCHEMA),
            NODEGROUP_BASE_DOC,
        ),
        field(
            "unmanaged_nodegroups",
            FieldKind::RecordMap(&UNMANAGED_SCHEMA),
        ),
    ],
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Kubernetes control plane version.
    pub version: String,
    pub private_api: bool,
    /// Upper bound on the zones any single node group spans.
    pub max_nodegroup_azs: usize,
    pub global_node_labels: BTreeMap<String, String>,
    pub global_node_tags: BTreeMap<String, String>,
    pub secrets_encryption_key_arn: Option<String>,
    #[serde(skip_deserializing)]
    pub managed_nodegroups: BTreeMap<String, ManagedNodegroup>,
    #[serde(skip_deserializing)]
    pub unmanaged_nodegroups: BTreeMap<String, UnmanagedNodegroup>,
}

impl ClusterConfig {
    /// 0.0.0 named the unmanaged node group map `nodegroups`.
    pub fn from_0_0_0(mut raw: Mapping) -> Result<Self, super::Error> {
        Self::migrate_0_0_0(&mut raw);
        Self::from_0_0_1(raw)
    }

    pub fn from_0_0_1(raw: Mapping) -> Result<Self, super::Error> {
        super::load_standalone(SCOPE, &SCHEMA, raw, Report::default(), |raw, report| {
            Self::load(SCOPE, raw, report)
        })
    }

    pub(crate) fn migrate_0_0_0(raw: &mut Mapping) {
        let unmanaged = Value::from("unmanaged_nodegroups");
        if !raw.contains_key(&unmanaged) {
            if let Some(groups) = raw.remove(&Value::from("nodegroups")) {
                raw.insert(unmanaged, groups);
            }
        }
    }

    pub(crate) fn load(
        scope: &str,
        mut raw: Mapping,
        report: &mut Report,
    ) -> Result<Self, loader::Error> {
        let managed = take_nodegroups(&mut raw, "managed_nodegroups", scope, report, |scope, group, raw, report| {
            ManagedNodegroup::load(scope, group, raw, report)
        })?;
        let unmanaged = take_nodegroups(&mut raw, "unmanaged_nodegroups", scope, report, |scope, group, raw, report| {
            UnmanagedNodegroup::load(scope, group, raw, report)
        })?;

        let (mut cluster, residual): (Self, Residual) = loader::load_record(scope, &SCHEMA, raw)?;
        report.unused_keys(scope, &residual);
        cluster.managed_nodegroups = managed;
        cluster.unmanaged_nodegroups = unmanaged;
        Ok(cluster)
    }
}

/// Pops one node group map out of `raw` and loads every group through the
/// two-pass base/variant loader. An absent or null map yields an empty map,
/// never an error.
fn take_nodegroups<T>(
    raw: &mut Mapping,
    key: &str,
    scope: &str,
    report: &mut Report,
    load: impl Fn(&str, &str, Mapping, &mut Report) -> Result<T, loader::Error>,
) -> Result<BTreeMap<String, T>, loader::Error> {
    let mut groups = BTreeMap::new();
    let Some(value) = raw.remove(&Value::from(key)) else {
        return Ok(groups);
    };
    if value.is_null() {
        return Ok(groups);
    }

    let entries = loader::expect_mapping(&format!("{scope}.{key}"), value)?;
    for (name, group_raw) in entries {
        let name = crate::schema::key_string(&name);
        let group_scope = format!("{scope}.{key}.{name}");
        let group_raw = loader::expect_mapping(&group_scope, group_raw)?;
        let group = load(&group_scope, &name, group_raw, report)?;
        groups.insert(name, group);
    }
    Ok(groups)
}
