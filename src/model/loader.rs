// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Workflow definition loading from YAML or JSON files.

use crate::errors::ValidationError;
use crate::model::Workflow;
use crate::planner::validate_workflow;
use std::fs;
use std::path::Path;

/// Load a workflow definition from a file.
///
/// The format is chosen by extension: `.json` parses as JSON, anything else
/// as YAML (YAML is a superset, so `.yaml`/`.yml` and extensionless files all
/// go through the YAML parser).
pub fn load_workflow<P: AsRef<Path>>(path: P) -> Result<Workflow, Box<dyn std::error::Error>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let workflow = if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
        serde_json::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };

    Ok(workflow)
}

/// Load a workflow definition and validate it structurally.
///
/// Returns the parsed workflow together with any validation errors, so
/// callers can report all problems at once instead of failing on the first.
pub fn load_and_validate_workflow<P: AsRef<Path>>(
    path: P,
) -> Result<Workflow, Box<dyn std::error::Error>> {
    let workflow = load_workflow(path)?;

    if let Err(errors) = validate_workflow(&workflow) {
        let joined = errors
            .iter()
            .map(ValidationError::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(joined.into());
    }

    Ok(workflow)
}
