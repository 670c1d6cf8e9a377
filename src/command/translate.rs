//! Pure translation from a module descriptor to a runtime creation spec.

use std::collections::{BTreeMap, HashSet};

use crate::config::CONNECTION_STRING_KEY;
use crate::error::ValidationError;
use crate::module::{LoggingConfig, ModuleDescriptor};
use crate::runtime::CreationSpec;

/// Translates a module descriptor into a runtime creation spec.
///
/// Total and side-effect-free: the same inputs always produce the same
/// spec, and all validation happens here, before any runtime I/O. The
/// connection string is scoped to the module with a `;ModuleId=<name>`
/// suffix and injected last, overriding any declared entry under the
/// same key.
pub fn translate(
    module: &ModuleDescriptor,
    logging: &LoggingConfig,
    connection_string: &str,
) -> Result<CreationSpec, ValidationError> {
    if module.name.trim().is_empty() {
        return Err(ValidationError::BlankName);
    }
    if !is_valid_container_name(&module.name) {
        return Err(ValidationError::InvalidName(module.name.clone()));
    }
    if module.image.trim().is_empty() {
        return Err(ValidationError::BlankImage);
    }
    if module.tag.trim().is_empty() {
        return Err(ValidationError::BlankTag);
    }

    // Duplicate declared keys fail fast; last-writer-wins would silently
    // drop a declared value.
    let mut seen = HashSet::new();
    for (key, _) in &module.env {
        if !seen.insert(key.as_str()) {
            return Err(ValidationError::DuplicateEnvKey(key.clone()));
        }
    }

    let scoped = format!("{connection_string};ModuleId={}", module.name);
    let mut env: Vec<String> = module
        .env
        .iter()
        .filter(|(key, _)| key != CONNECTION_STRING_KEY)
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    env.push(format!("{CONNECTION_STRING_KEY}={scoped}"));

    let mut port_bindings: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for binding in &module.port_bindings {
        port_bindings
            .entry(binding.runtime_key())
            .or_default()
            .push(binding.host_port.clone());
    }

    // Labels are additive; `version` is always present so the module
    // version stays inspectable even without runtime-side versioning.
    let mut labels = BTreeMap::new();
    labels.insert("version".to_string(), module.version.clone());

    Ok(CreationSpec {
        name: module.name.clone(),
        image: module.image_ref(),
        env,
        labels,
        port_bindings,
        log_driver: logging.driver().to_string(),
        log_options: logging.options().clone(),
    })
}

/// Docker container names must match `[a-zA-Z0-9][a-zA-Z0-9_.-]*`.
fn is_valid_container_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
