//! Configuration engine for the groundwork Kubernetes platform.
//!
//! Accepts a user-authored, schema-versioned YAML document, migrates it to
//! the newest schema, validates it structurally and against the cloud
//! account's availability zones, and renders it back as canonical commented
//! YAML. Provisioning itself happens elsewhere; the validated
//! [`ConfigDocument`] is plain data consumed by the provisioning backend,
//! and the only live cloud call is the [`ZoneProvider`] lookup.

pub mod cloud;
pub mod document;
pub mod loader;
pub mod render;
pub mod schema;
pub mod sections;
pub mod validate;

pub use cloud::{FixedZones, TEMPLATE_REGION, ZoneProvider};
pub use document::{ConfigDocument, DEPLOY_ID_TAG, SCHEMA_VERSION};
