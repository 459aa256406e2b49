//! DNS zones the deployment is allowed to manage records in.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::{
    loader::{self, Residual},
    schema::{FieldKind, RecordSchema, field},
    validate::Report,
};

const SCOPE: &str = "config.dns";

pub(crate) static SCHEMA: RecordSchema = RecordSchema {
    doc: "\
Hosted DNS zones, by id. The deployment gets permission to manage records
in these zones, nothing is created or destroyed here.",
    base: None,
    fields: &[field("zone_ids", FieldKind::StrSeq)],
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct DnsConfig {
    pub zone_ids: Vec<String>,
}

impl DnsConfig {
    pub fn from_0_0_0(raw: Mapping) -> Result<Self, super::Error> {
        super::load_standalone(SCOPE, &SCHEMA, raw, Report::default(), |raw, report| {
            Self::load(SCOPE, raw, report)
        })
    }

    pub(crate) fn load(
        scope: &str,
        raw: Mapping,
        report: &mut Report,
    ) -> Result<Self, loader::Error> {
        let (dns, residual): (Self, Residual) = loader::load_record(scope, &SCHEMA, raw)?;
        report.unused_keys(scope, &residual);
        Ok(dns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_ids_load() {
        let raw = serde_yaml::from_str("zone_ids: [Z0522194BNY3VF7QK1DX]\n").unwrap();
        let dns = DnsConfig::from_0_0_0(raw).unwrap();
        assert_eq!(dns.zone_ids, ["Z0522194BNY3VF7QK1DX"]);
    }
}
