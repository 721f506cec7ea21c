use crate::host::{HostContext, HostVersion, NATIVE_HOOK_SINCE, ServiceRegistry};
use crate::params::StartParameters;
use crate::path::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

pub const CURRENT_VERSION: i32 = 1;
pub const DEFAULT_PATH: &str = "./mirakle.yml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub version: i32,
    pub host: Host,
    pub start_parameters: StartParameters,
    pub remote: Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Host {
    pub version: String,
    pub services: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Remote {
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    pub issues: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.issues.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.issues.first() {
            write!(
                f,
                "configuration validation failed: {}: {}",
                first.field, first.message
            )
        } else {
            write!(f, "configuration validation failed")
        }
    }
}

impl std::error::Error for ValidationErrors {}

pub fn load(path: &Path) -> Result<Config, String> {
    let cfg = parse(path)?;
    validate(&cfg).map_err(|e| e.to_string())?;
    Ok(cfg)
}

pub fn parse(path: &Path) -> Result<Config, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
    let cfg: Config = serde_yaml::from_str(&text).map_err(|e| format!("parse config yaml: {e}"))?;
    Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<(), ValidationErrors> {
    let mut issues = ValidationErrors::new();

    if cfg.version != CURRENT_VERSION {
        issues.add("version", format!("must be {CURRENT_VERSION}"));
    }

    validate_host(&mut issues, &cfg.host);
    validate_start_parameters(&mut issues, &cfg.start_parameters);

    if issues.has_issues() {
        Err(issues)
    } else {
        Ok(())
    }
}

impl Config {
    pub fn host_version(&self) -> Result<HostVersion, String> {
        if self.host.version.trim().is_empty() {
            return Ok(NATIVE_HOOK_SINCE);
        }

        self.host
            .version
            .parse()
            .map_err(|e| format!("host.version: {e}"))
    }

    /// Capabilities handed to the plugin. The service registry is only present
    /// when the config declares one.
    pub fn host_context(&self) -> Result<HostContext, String> {
        let context = HostContext::new(self.host_version()?);
        Ok(match &self.host.services {
            Some(services) => context.with_services(ServiceRegistry::new(services.clone())),
            None => context,
        })
    }
}

fn validate_host(issues: &mut ValidationErrors, host: &Host) {
    if !host.version.trim().is_empty() && host.version.parse::<HostVersion>().is_err() {
        issues.add("host.version", "must look like <major>.<minor>[.<patch>]");
    }

    if let Some(services) = &host.services {
        for (name, value) in services {
            if name.trim().is_empty() {
                issues.add("host.services", "service names must not be empty");
            }
            if value.trim().is_empty() {
                issues.add(format!("host.services.{name}"), "must not be empty");
            }
        }
    }
}

fn validate_start_parameters(issues: &mut ValidationErrors, params: &StartParameters) {
    for (idx, build) in params.included_builds.iter().enumerate() {
        if build.trim().is_empty() {
            issues.add(
                format!("start_parameters.included_builds[{idx}]"),
                "must not be empty",
            );
        }
    }
}
