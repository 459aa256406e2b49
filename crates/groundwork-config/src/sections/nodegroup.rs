//! Compute node group specifications.
//!
//! Managed and unmanaged node groups share one base field set; loading a
//! group runs the field loader twice, first against the base fields and then
//! against the variant-specific fields, so the residual report only names
//! keys neither pass consumed. Policy checks never fail fast: every
//! violation across every group in a document is collected and raised once.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::Mapping;

use crate::{
    loader::{self, Residual},
    schema::{FieldKind, RecordSchema, field},
    validate::{Report, Violation},
};

type Result<T, E = loader::Error> = std::result::Result<T, E>;

/// Documentation for the shared node group base schema. Rendered once, ahead
/// of the managed node group section.
pub(crate) const NODEGROUP_BASE_DOC: &str = "\
Node groups scale sets of worker machines. Fields shared by both kinds:
disk_size, key_name, min_size, max_size, machine_image (ami_id + user_data),
availability_zones, instance_types, labels, tags, ssm_agent.
Managed groups additionally accept: spot, desired_size.
Unmanaged groups additionally accept: gpu, taints.";

pub(crate) static MACHINE_IMAGE_SCHEMA: RecordSchema = RecordSchema {
    doc: "",
    base: None,
    fields: &[
        field("ami_id", FieldKind::Str),
        field("user_data", FieldKind::Str),
    ],
};

pub(crate) static BASE_SCHEMA: RecordSchema = RecordSchema {
    doc: NODEGROUP_BASE_DOC,
    base: None,
    fields: &[
        field("disk_size", FieldKind::Int),
        field("key_name", FieldKind::Str),
        field("min_size", FieldKind::Int),
        field("max_size", FieldKind::Int),
        field("machine_image", FieldKind::Record(&MACHINE_IMAGE_SCHEMA)),
        field("availability_zones", FieldKind::StrSeq),
        field("instance_types", FieldKind::StrSeq),
        field("labels", FieldKind::StrMap),
        field("tags", FieldKind::StrMap),
        field("ssm_agent", FieldKind::Bool),
    ],
};

pub(crate) static MANAGED_SCHEMA: RecordSchema = RecordSchema {
    doc: "",
    base: Some(&BASE_SCHEMA),
    fields: &[
        field("spot", FieldKind::Bool),
        field("desired_size", FieldKind::Int),
    ],
};

pub(crate) static UNMANAGED_SCHEMA: RecordSchema = RecordSchema {
    doc: "",
    base: Some(&BASE_SCHEMA),
    fields: &[
        field("gpu", FieldKind::Bool),
        field("taints", FieldKind::StrMap),
    ],
};

/// Which provisioning mode a node group uses. Managed groups delegate node
/// bootstrap to the cloud platform, unmanaged groups bring their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum NodegroupKind {
    Managed,
    Unmanaged,
}

/// A custom machine image plus the bootstrap user data it requires.
///
/// A custom image bypasses the platform bootstrap path, so `user_data` has to
/// carry everything the platform would otherwise apply.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, Serialize)]
pub struct MachineImage {
    pub ami_id: String,
    #[serde(default)]
    pub user_data: Option<String>,
}

/// Fields shared by managed and unmanaged node groups.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, Serialize)]
#[serde(default)]
pub struct NodegroupBase {
    pub disk_size: u64,
    pub key_name: Option<String>,
    pub min_size: u64,
    pub max_size: u64,
    pub machine_image: Option<MachineImage>,
    pub availability_zones: Vec<String>,
    pub instance_types: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub ssm_agent: bool,
}

impl NodegroupBase {
    /// Loads the shared base field set out of `raw`, consuming those keys.
    /// Variant-specific keys are left in place for the second loader pass.
    pub(crate) fn base_load(scope: &str, raw: &mut Mapping) -> Result<Self> {
        let recognized = loader::split_fields(raw, &BASE_SCHEMA);
        loader::from_mapping(scope, recognized)
    }

    /// Cross-field rules tied to a custom machine image. The conflict
    /// message deliberately names all three incompatible fields as one
    /// combined violation, whichever of them is actually set.
    fn check_machine_image(
        &self,
        kind: NodegroupKind,
        group: &str,
        taints: &BTreeMap<String, String>,
        report: &mut Report,
    ) {
        let Some(image) = &self.machine_image else {
            return;
        };

        if image.user_data.as_deref().is_none_or(str::is_empty) {
            report.violation(Violation::UserDataRequired {
                kind,
                group: group.to_owned(),
            });
        }
        if self.ssm_agent || !self.labels.is_empty() || !taints.is_empty() {
            report.violation(Violation::MachineImageConflict {
                kind,
                group: group.to_owned(),
            });
        }
    }
}

/// A node group whose lifecycle the cloud platform manages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ManagedNodegroup {
    #[serde(flatten)]
    pub base: NodegroupBase,
    pub spot: bool,
    pub desired_size: u64,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ManagedFields {
    spot: bool,
    desired_size: u64,
}

impl ManagedNodegroup {
    pub(crate) fn load(
        scope: &str,
        group: &str,
        mut raw: Mapping,
        report: &mut Report,
    ) -> Result<Self> {
        let base = NodegroupBase::base_load(scope, &mut raw)?;
        let (fields, residual): (ManagedFields, Residual) =
            loader::load_record(scope, &MANAGED_SCHEMA, raw)?;
        report.unused_keys(scope, &residual);

        let nodegroup = Self {
            base,
            spot: fields.spot,
            desired_size: fields.desired_size,
        };
        nodegroup.check(group, report);
        Ok(nodegroup)
    }

    fn check(&self, group: &str, report: &mut Report) {
        let no_taints = BTreeMap::new();
        self.base
            .check_machine_image(NodegroupKind::Managed, group, &no_taints, report);

        // min_size 0 would let the autoscaler drain the group entirely,
        // which managed bootstrap cannot recover from.
        if self.base.min_size == 0 {
            report.violation(Violation::MinSizeTooSmall {
                kind: NodegroupKind::Managed,
                group: group.to_owned(),
                value: self.base.min_size,
            });
        }
    }
}

/// A node group the deployment bootstraps itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UnmanagedNodegroup {
    #[serde(flatten)]
    pub base: NodegroupBase,
    pub gpu: bool,
    pub taints: BTreeMap<String, String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UnmanagedFields {
    gpu: bool,
    taints: BTreeMap<String, String>,
}

impl UnmanagedNodegroup {
    pub(crate) fn load(
        scope: &str,
        group: &str,
        mut raw: Mapping,
        report: &mut Report,
    ) -> Result<Self> {
        let base = NodegroupBase::base_load(scope, &mut raw)?;
        let (fields, residual): (UnmanagedFields, Residual) =
            loader::load_record(scope, &UNMANAGED_SCHEMA, raw)?;
        report.unused_keys(scope, &residual);

        let nodegroup = Self {
            base,
            gpu: fields.gpu,
            taints: fields.taints,
        };
        nodegroup.check(group, report);
        Ok(nodegroup)
    }

    fn check(&self, group: &str, report: &mut Report) {
        self.base
            .check_machine_image(NodegroupKind::Unmanaged, group, &self.taints, report);
    }
}
