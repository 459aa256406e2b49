//! Installer options handed to the platform installer after provisioning.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::{
    loader::{self, Residual},
    schema::{FieldKind, RecordSchema, field, hidden},
    validate::Report,
};

const SCOPE: &str = "config.install";

pub(crate) static SCHEMA: RecordSchema = RecordSchema {
    doc: "\
Options forwarded to the platform installer. The overrides mapping is passed
through verbatim and never inspected here.",
    base: None,
    fields: &[
        field("hostname", FieldKind::Str),
        field("access_list", FieldKind::StrSeq),
        field("registry_username", FieldKind::Str),
        hidden("registry_password", FieldKind::Str),
        field("overrides", FieldKind::RawMap),
    ],
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct InstallConfig {
    pub hostname: Option<String>,
    pub access_list: Vec<String>,
    pub registry_username: Option<String>,
    pub registry_password: Option<String>,
    pub overrides: Mapping,
}

impl InstallConfig {
    /// 0.0.0 predates `access_list`; a value present anyway is surfaced as
    /// an unrecognized key, the same as any other unknown field.
    pub fn from_0_0_0(mut raw: Mapping) -> Result<Self, super::Error> {
        let mut report = Report::default();
        Self::migrate_0_0_0(&mut raw, &mut report);
        super::load_standalone(SCOPE, &SCHEMA, raw, report, |raw, report| {
            Self::load(SCOPE, raw, report)
        })
    }

    pub fn from_0_0_1(raw: Mapping) -> Result<Self, super::Error> {
        super::load_standalone(SCOPE, &SCHEMA, raw, Report::default(), |raw, report| {
            Self::load(SCOPE, raw, report)
        })
    }

    pub(crate) fn migrate_0_0_0(raw: &mut Mapping, report: &mut Report) {
        if raw.remove(&serde_yaml::Value::from("access_list")).is_some() {
            report.unknown_key(SCOPE, "access_list");
        }
    }

    pub(crate) fn load(
        scope: &str,
        raw: Mapping,
        report: &mut Report,
    ) -> Result<Self, loader::Error> {
        let (install, residual): (Self, Residual) = loader::load_record(scope, &SCHEMA, raw)?;
        report.unused_keys(scope, &residual);
        Ok(install)
    }
}
