use mirakle::error::MirakleError;
use mirakle::host::{
    BuildFinishedHook, BuildResult, HostContext, HostVersion, NativeHook, ServiceRegistry,
    select_hook,
};
use std::collections::BTreeMap;
use std::io::Write;

#[test]
fn hook_selection_follows_host_version() {
    let legacy = HostVersion::new(3, 3, 0);
    let native = HostVersion::new(3, 4, 0);
    assert!(!legacy.supports_native_hook());
    assert!(native.supports_native_hook());
    assert!(HostVersion::new(4, 0, 0).supports_native_hook());

    let mut out = Vec::new();
    for version in [legacy, native] {
        let mut hook = select_hook(version);
        hook.register(Box::new(move |_, out: &mut dyn Write| {
            writeln!(out, "{version}")
        }));
        hook.fire(&BuildResult::default(), &mut out).expect("fire");
    }
    assert_eq!(String::from_utf8(out).expect("utf8"), "3.3\n3.4\n");
}

#[test]
fn native_hook_passes_result_and_runs_once() {
    let mut hook = NativeHook::new();
    hook.register(Box::new(|result, out: &mut dyn Write| {
        writeln!(out, "{}", result.failure.as_deref().unwrap_or("ok"))
    }));
    assert_eq!(hook.pending(), 1);

    let mut out = Vec::new();
    let result = BuildResult {
        failure: Some("compile failed".to_string()),
    };
    hook.fire(&result, &mut out).expect("fire");
    hook.fire(&result, &mut out).expect("fire again");
    assert_eq!(String::from_utf8(out).expect("utf8"), "compile failed\n");
}

#[test]
fn missing_service_registry_fails_fast() {
    let context = HostContext::new(HostVersion::new(4, 10, 0));
    let err = context.services().expect_err("no registry");
    assert_eq!(
        err,
        MirakleError::MissingCapability("service registry".to_string())
    );
    assert!(err.to_string().contains("service registry"));
}

#[test]
fn injected_service_registry_is_available() {
    let mut services = BTreeMap::new();
    services.insert("rsync".to_string(), "/usr/bin/rsync".to_string());

    let context =
        HostContext::new(HostVersion::new(4, 10, 0)).with_services(ServiceRegistry::new(services));
    let registry = context.services().expect("registry");
    assert_eq!(registry.get("rsync"), Some("/usr/bin/rsync"));
    assert_eq!(registry.get("ssh"), None);
}

#[test]
fn version_display() {
    assert_eq!(HostVersion::new(3, 4, 0).to_string(), "3.4");
    assert_eq!(HostVersion::new(4, 10, 2).to_string(), "4.10.2");
}
