//! Loading of the static binding table.

use std::fs;
use std::path::Path;

use log::info;

use crate::error::{Error, Result};
use crate::types::Binding;

/// Reads and validates the JSON binding file. Any problem here is fatal at
/// startup, so errors name the offending entry.
pub fn load(path: &Path) -> Result<Vec<Binding>> {
    let data = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Unable to open binding file {}: {}",
            path.display(),
            e
        ))
    })?;
    let bindings = parse(&data)?;
    info!(
        "Loaded {} bindings from {}",
        bindings.len(),
        path.display()
    );
    Ok(bindings)
}

pub fn parse(data: &str) -> Result<Vec<Binding>> {
    let bindings: Vec<Binding> = serde_json::from_str(data)?;
    for (i, binding) in bindings.iter().enumerate() {
        validate(binding).map_err(|msg| Error::Config(format!("binding #{}: {}", i, msg)))?;
    }
    Ok(bindings)
}

fn validate(binding: &Binding) -> std::result::Result<(), String> {
    if binding.domain.trim().is_empty() {
        return Err("empty domain".into());
    }
    if binding.container.trim().is_empty() {
        return Err(format!("empty container for domain {}", binding.domain));
    }
    if binding.port == 0 {
        return Err(format!("port 0 for domain {}", binding.domain));
    }
    Ok(())
}
