//! Network topology for the deployment.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::{
    loader::{self, Residual},
    schema::{FieldKind, RecordSchema, field, hidden},
    validate::Report,
};

const SCOPE: &str = "config.network";

static BASTION_SCHEMA: RecordSchema = RecordSchema {
    doc: "Optional bastion host used to reach the private API and nodes.",
    base: None,
    fields: &[
        field("enabled", FieldKind::Bool),
        field("key_name", FieldKind::Str),
        field("instance_type", FieldKind::Str),
        field("ingress_cidrs", FieldKind::StrSeq),
    ],
};

pub(crate) static SCHEMA: RecordSchema = RecordSchema {
    doc: "\
Network topology: either a network created for the deployment (create: true)
or an existing one adopted by id. Subnet masks and the maximum availability
zone count shape everything provisioned on top.",
    base: None,
    fields: &[
        field("create", FieldKind::Bool),
        hidden("id", FieldKind::Str),
        field("cidr", FieldKind::Str),
        field("public_cidr_mask", FieldKind::Int),
        field("private_cidr_mask", FieldKind::Int),
        field("availability_zones", FieldKind::StrSeq),
        field("max_azs", FieldKind::Int),
        field("gateway_endpoints", FieldKind::Bool),
        field("bastion", FieldKind::Record(&BASTION_SCHEMA)),
    ],
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct BastionConfig {
    pub enabled: bool,
    pub key_name: Option<String>,
    pub instance_type: String,
    pub ingress_cidrs: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whether to create the network or adopt an existing one by `id`.
    pub create: bool,
    pub id: Option<String>,
    pub cidr: String,
    pub public_cidr_mask: u8,
    pub private_cidr_mask: u8,
    pub availability_zones: Vec<String>,
    /// Upper bound on the availability zones used by the deployment. The
    /// zone list reported by the cloud account is truncated to this count.
    pub max_azs: usize,
    pub gateway_endpoints: bool,
    #[serde(skip_deserializing)]
    pub bastion: Option<BastionConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            create: true,
            id: None,
            cidr: "10.0.0.0/16".to_owned(),
            public_cidr_mask: 27,
            private_cidr_mask: 19,
            availability_zones: Vec::new(),
            max_azs: 3,
            gateway_endpoints: true,
            bastion: None,
        }
    }
}

impl NetworkConfig {
    /// In 0.0.0 documents the availability zone list lived at the document
    /// root; the root migration folds it into this section before loading.
    pub fn from_0_0_0(raw: Mapping) -> Result<Self, super::Error> {
        Self::from_0_0_1(raw)
    }

    pub fn from_0_0_1(raw: Mapping) -> Result<Self, super::Error> {
        super::load_standalone(SCOPE, &SCHEMA, raw, Report::default(), |raw, report| {
            Self::load(SCOPE, raw, report)
        })
    }

    pub(crate) fn load(
        scope: &str,
        mut raw: Mapping,
        report: &mut Report,
    ) -> Result<Self, loader::Error> {
        let bastion = loader::take_section::<BastionConfig>(
            &mut raw,
            "bastion",
            scope,
            &BASTION_SCHEMA,
            report,
        )?;
        let (mut network, residual): (Self, Residual) = loader::load_record(scope, &SCHEMA, raw)?;
        report.unused_keys(scope, &residual);
        network.bastion = bastion;
        Ok(network)
    }
}
