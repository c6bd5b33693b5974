//! # Object Metadata Helpers
//!
//! Finalizers are treated as a set: adding is idempotent and removing drops
//! every occurrence, so repeated reconciles never leave duplicates behind.

use crate::crd::RDSInstance;
use kube::api::ObjectMeta;

pub fn has_finalizer(meta: &ObjectMeta, finalizer: &str) -> bool {
    meta.finalizers
        .as_ref()
        .is_some_and(|finalizers| finalizers.iter().any(|f| f == finalizer))
}

/// Add `finalizer` unless already present
pub fn add_finalizer(meta: &mut ObjectMeta, finalizer: &str) {
    let finalizers = meta.finalizers.get_or_insert_with(Vec::new);
    let mut seen = std::collections::HashSet::new();
    finalizers.retain(|f| seen.insert(f.clone()));
    if !seen.contains(finalizer) {
        finalizers.push(finalizer.to_string());
    }
}

/// Remove every occurrence of `finalizer`
pub fn remove_finalizer(meta: &mut ObjectMeta, finalizer: &str) {
    if let Some(finalizers) = meta.finalizers.as_mut() {
        finalizers.retain(|f| f != finalizer);
        if finalizers.is_empty() {
            meta.finalizers = None;
        }
    }
}

/// Deterministic name of the external instance backing `record`
///
/// Stable across retries so a re-run after a partial failure targets the
/// same instance. Returns `None` until the API server has assigned a UID.
pub fn external_name(record: &RDSInstance) -> Option<String> {
    let uid = record.metadata.uid.as_deref().filter(|uid| !uid.is_empty())?;
    Some(format!("{}-{}", record.spec.engine, uid))
}
