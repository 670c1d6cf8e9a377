//! The translated, runtime-facing creation request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A fully translated container creation request.
///
/// Derived only, never constructed directly by callers: it is a pure
/// function of (descriptor, logging config, connection context), so
/// translating the same inputs twice yields identical values. Ordered
/// maps keep repeated translations byte-identical when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationSpec {
    /// Container name (the module name).
    pub name: String,
    /// Full image reference, `image:tag`.
    pub image: String,
    /// Environment entries as `KEY=value`, declared order, with the
    /// scoped connection entry last.
    pub env: Vec<String>,
    /// Container labels; always carries a `version` entry.
    pub labels: BTreeMap<String, String>,
    /// Port map keyed by `"<container-port>/<protocol>"`; each key holds
    /// its host ports in input order.
    pub port_bindings: BTreeMap<String, Vec<String>>,
    /// Log driver name.
    pub log_driver: String,
    /// Log driver options.
    pub log_options: BTreeMap<String, String>,
}
