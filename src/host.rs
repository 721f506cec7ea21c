//! Seams towards the host build tool: its version, the capabilities it injects
//! and the build-finished hook in its native and legacy flavours.

use crate::error::MirakleError;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use tracing::{debug, warn};

/// First host release whose build-finished hook accepts a typed action.
pub const NATIVE_HOOK_SINCE: HostVersion = HostVersion::new(3, 4, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HostVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl HostVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn supports_native_hook(&self) -> bool {
        *self >= NATIVE_HOOK_SINCE
    }
}

impl FromStr for HostVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let mut parts = text.split('.');
        let mut next = |required: bool| -> Result<u32, String> {
            match parts.next() {
                Some(part) => part
                    .parse::<u32>()
                    .map_err(|_| format!("invalid host version {text:?}")),
                None if required => Err(format!("invalid host version {text:?}")),
                None => Ok(0),
            }
        };

        let major = next(true)?;
        let minor = next(true)?;
        let patch = next(false)?;

        if parts.next().is_some() {
            return Err(format!("invalid host version {text:?}"));
        }

        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

/// Outcome handed to build-finished callbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    pub failure: Option<String>,
}

pub type BuildFinishedAction = Box<dyn FnOnce(&BuildResult, &mut dyn Write) -> io::Result<()>>;

/// Deferred work that runs once the host reports the build as finished.
///
/// Actions run in registration order and are consumed by [`fire`], so a
/// second call runs nothing.
///
/// [`fire`]: BuildFinishedHook::fire
pub trait BuildFinishedHook {
    fn register(&mut self, action: BuildFinishedAction);
    fn fire(&mut self, result: &BuildResult, out: &mut dyn Write) -> io::Result<()>;
    fn pending(&self) -> usize;
}

#[derive(Default)]
pub struct NativeHook {
    actions: Vec<BuildFinishedAction>,
}

impl NativeHook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BuildFinishedHook for NativeHook {
    fn register(&mut self, action: BuildFinishedAction) {
        self.actions.push(action);
    }

    fn fire(&mut self, result: &BuildResult, out: &mut dyn Write) -> io::Result<()> {
        for action in std::mem::take(&mut self.actions) {
            action(result, out)?;
        }
        Ok(())
    }

    fn pending(&self) -> usize {
        self.actions.len()
    }
}

type UntypedAction = Box<dyn FnOnce(&dyn Any, &mut dyn Write) -> io::Result<()>>;

/// Hook for hosts that only hand callbacks an untyped payload.
///
/// Typed actions are wrapped in adapters that downcast the payload; a payload
/// that is not a [`BuildResult`] skips the action.
#[derive(Default)]
pub struct LegacyShim {
    actions: Vec<UntypedAction>,
}

impl LegacyShim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire_untyped(&mut self, payload: &dyn Any, out: &mut dyn Write) -> io::Result<()> {
        for action in std::mem::take(&mut self.actions) {
            action(payload, out)?;
        }
        Ok(())
    }
}

impl BuildFinishedHook for LegacyShim {
    fn register(&mut self, action: BuildFinishedAction) {
        self.actions.push(Box::new(move |payload, out| {
            match payload.downcast_ref::<BuildResult>() {
                Some(result) => action(result, out),
                None => {
                    warn!("build finished payload is not a build result; skipping action");
                    Ok(())
                }
            }
        }));
    }

    fn fire(&mut self, result: &BuildResult, out: &mut dyn Write) -> io::Result<()> {
        self.fire_untyped(result, out)
    }

    fn pending(&self) -> usize {
        self.actions.len()
    }
}

pub fn select_hook(version: HostVersion) -> Box<dyn BuildFinishedHook> {
    if version.supports_native_hook() {
        debug!(%version, "using native build finished hook");
        Box::new(NativeHook::new())
    } else {
        debug!(%version, "using legacy build finished shim");
        Box::new(LegacyShim::new())
    }
}

/// Named services the host exposes to the plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRegistry {
    services: BTreeMap<String, String>,
}

impl ServiceRegistry {
    pub fn new(services: BTreeMap<String, String>) -> Self {
        Self { services }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.services.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

/// What the host hands the plugin when it is applied.
#[derive(Debug, Clone)]
pub struct HostContext {
    version: HostVersion,
    services: Option<ServiceRegistry>,
}

impl HostContext {
    pub fn new(version: HostVersion) -> Self {
        Self {
            version,
            services: None,
        }
    }

    pub fn with_services(mut self, services: ServiceRegistry) -> Self {
        self.services = Some(services);
        self
    }

    pub fn version(&self) -> HostVersion {
        self.version
    }

    pub fn services(&self) -> Result<&ServiceRegistry, MirakleError> {
        self.services
            .as_ref()
            .ok_or_else(|| MirakleError::MissingCapability("service registry".to_string()))
    }

    pub fn build_finished_hook(&self) -> Box<dyn BuildFinishedHook> {
        select_hook(self.version)
    }
}
