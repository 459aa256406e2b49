//! Batched validation reporting.
//!
//! Document construction never fails fast: violations discovered across the
//! whole document are collected into a [`Report`] and raised exactly once,
//! joined into a single [`Violations`] error, so a user sees every problem in
//! one pass. Residual-key warnings are informational only and never escalate
//! to errors, even in aggregate.

use std::fmt::Display;

use snafu::Snafu;

use crate::{loader::Residual, sections::nodegroup::NodegroupKind};

/// A single validation failure discovered while constructing a document.
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Violation {
    #[snafu(display("{path} type ({expected}) does not match value: [{value}]"))]
    TypeMismatch {
        path: String,
        expected: &'static str,
        value: String,
    },

    #[snafu(display(
        "{kind} nodegroup [{group}]: user_data must be provided when specifying a custom machine image"
    ))]
    UserDataRequired { kind: NodegroupKind, group: String },

    #[snafu(display(
        "{kind} nodegroup [{group}]: ssm_agent, labels and taints are not supported when specifying a custom machine image"
    ))]
    MachineImageConflict { kind: NodegroupKind, group: String },

    #[snafu(display("{kind} nodegroup [{group}] has min_size of {value}, but the minimum is 1"))]
    MinSizeTooSmall {
        kind: NodegroupKind,
        group: String,
        value: u64,
    },

    #[snafu(display("tag {key:?} is reserved and cannot be overridden"))]
    ReservedTag { key: String },

    #[snafu(display(
        "nodegroup [{group}] availability zones {zones:?} don't exist in the zones available to this deployment {available:?}"
    ))]
    ZonesUnavailable {
        group: String,
        zones: Vec<String>,
        available: Vec<String>,
    },
}

/// A non-empty collection of [`Violation`]s, one per line.
#[derive(Debug, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Display for Violations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl Violations {
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }
}

/// Collects warnings and violations over one document construction run.
#[derive(Debug, Default)]
pub struct Report {
    warnings: Vec<String>,
    violations: Vec<Violation>,
}

impl Report {
    pub fn violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Surfaces residual keys left over after a loader pass as one warning
    /// naming the scope and every unconsumed key.
    pub fn unused_keys(&mut self, scope: &str, residual: &Residual) {
        if residual.is_empty() {
            return;
        }
        self.warn(format!(
            "Unused/unsupported config entries in {scope}: {keys:?}",
            keys = residual.keys()
        ));
    }

    /// Surfaces one key a migration function dropped because the document's
    /// schema version predates it.
    pub fn unknown_key(&mut self, scope: &str, key: &str) {
        self.warn(format!(
            "Unused/unsupported config entries in {scope}: [{key:?}]"
        ));
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Fails with every violation collected so far, or passes the report
    /// through untouched. Used between the structural and typed-construction
    /// phases: a structurally broken tree cannot be loaded, but everything
    /// wrong with it is still reported at once.
    pub fn checkpoint(self) -> Result<Self, Violations> {
        if self.violations.is_empty() {
            Ok(self)
        } else {
            Err(Violations(self.violations))
        }
    }

    /// Consumes the report, returning the collected warnings on success or
    /// every violation as one error.
    pub fn finish(self) -> Result<Vec<String>, Violations> {
        if self.violations.is_empty() {
            Ok(self.warnings)
        } else {
            Err(Violations(self.violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_join_one_per_line() {
        let mut report = Report::default();
        report.violation(Violation::TypeMismatch {
            path: "config.name".to_owned(),
            expected: "str",
            value: "42".to_owned(),
        });
        report.violation(Violation::ReservedTag {
            key: "groundwork-deploy-id".to_owned(),
        });

        let violations = report.finish().unwrap_err();
        let rendered = violations.to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("config.name"));
        assert!(lines[1].contains("groundwork-deploy-id"));
    }

    #[test]
    fn clean_report_returns_warnings() {
        let report = Report::default();
        assert_eq!(report.finish().unwrap(), Vec::<String>::new());
    }
}
