use crate::paths::TransformRules;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Optional defaults loaded from a configuration file. Command-line flags take
/// precedence over every field here.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub transform: TransformRules,
}
