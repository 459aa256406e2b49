//! TLS certificates requested for the deployment.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::{
    loader::{self, Residual},
    schema::{FieldKind, RecordSchema, field},
    validate::Report,
};

const SCOPE: &str = "config.certificates";

static CERTIFICATE_SCHEMA: RecordSchema = RecordSchema {
    doc: "",
    base: None,
    fields: &[
        field("domain", FieldKind::Str),
        field("zone_id", FieldKind::Str),
    ],
};

pub(crate) static SCHEMA: RecordSchema = RecordSchema {
    doc: "\
Certificates issued for the deployment, validated via DNS records in the
named zone.",
    base: None,
    fields: &[field(
        "certificates",
        FieldKind::RecordSeq(&CERTIFICATE_SCHEMA),
    )],
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct CertificateSpec {
    pub domain: String,
    pub zone_id: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct CertsConfig {
    #[serde(skip_deserializing)]
    pub certificates: Vec<CertificateSpec>,
}

impl CertsConfig {
    pub fn from_0_0_0(raw: Mapping) -> Result<Self, super::Error> {
        super::load_standalone(SCOPE, &SCHEMA, raw, Report::default(), |raw, report| {
            Self::load(SCOPE, raw, report)
        })
    }

    pub(crate) fn load(
        scope: &str,
        mut raw: Mapping,
        report: &mut Report,
    ) -> Result<Self, loader::Error> {
        let mut certificates = Vec::new();
        if let Some(value) = raw.remove(&Value::from("certificates")) {
            if !value.is_null() {
                let entries = loader::expect_sequence(&format!("{scope}.certificates"), value)?;
                for (index, entry) in entries.into_iter().enumerate() {
                    let entry_scope = format!("{scope}.certificates.[{index}]");
                    let entry = loader::expect_mapping(&entry_scope, entry)?;
                    let (certificate, residual): (CertificateSpec, Residual) =
                        loader::load_record(&entry_scope, &CERTIFICATE_SCHEMA, entry)?;
                    report.unused_keys(&entry_scope, &residual);
                    certificates.push(certificate);
                }
            }
        }

        let (mut certs, residual): (Self, Residual) = loader::load_record(scope, &SCHEMA, raw)?;
        report.unused_keys(scope, &residual);
        certs.certificates = certificates;
        Ok(certs)
    }
}
