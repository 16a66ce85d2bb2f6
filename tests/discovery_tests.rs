//! Extension discovery tests
//!
//! Fake modules service for the phase logic, then the built-in modules
//! service against a real modules directory.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::Level;

use modos::bootstrap::{Bootstrap, BootstrapOptions, BootstrapPhase, ModuleOutcome};
use modos::config::RuntimeConfig;
use modos::module::{default_core_definitions, ModuleLoader, ModuleState};
use modos::services::builtin_factories;

mod common;
use common::*;

fn core_table() -> Vec<modos::ModuleDefinition> {
    vec![critical("logger"), critical("modules").depends_on(["logger"])]
}

fn with_service(harness: &Harness, log: &Arc<RecordingLogger>) -> Bootstrap {
    Bootstrap::new(core_table(), harness.loader()).with_bootstrap_logger(log.clone())
}

#[tokio::test]
async fn test_scenario_failing_extension_does_not_stop_siblings() {
    let mut harness = Harness::new();
    harness
        .modules(&["logger", "beta", "gamma"])
        .module("alpha", Behavior::failing_initialize());
    harness.modules_service(
        vec![extension("alpha"), extension("beta"), extension("gamma")],
        &["alpha", "beta", "gamma"],
    );
    let log = Arc::new(RecordingLogger::default());

    let mut bootstrap = with_service(&harness, &log);
    let report = bootstrap.bootstrap().await.unwrap();

    assert_eq!(report.failed(), vec!["alpha"]);
    assert!(!bootstrap.registry().contains("alpha"));
    assert_eq!(
        bootstrap.registry().names(),
        vec!["logger", "modules", "beta", "gamma"]
    );
    assert!(log.contains(Level::WARN, "alpha"));
    assert!(bootstrap.has_completed_phase(BootstrapPhase::ModuleDiscovery));
}

#[tokio::test]
async fn test_extension_with_missing_dependency_is_skipped() {
    let mut harness = Harness::new();
    harness.modules(&["logger", "weather", "radar"]);
    let mut weather = extension("weather");
    weather.dependencies = vec!["geo".to_string()];
    let mut radar = extension("radar");
    radar.dependencies = vec!["logger".to_string()];
    harness.modules_service(vec![weather, radar], &["weather", "radar"]);
    let log = Arc::new(RecordingLogger::default());

    let mut bootstrap = with_service(&harness, &log);
    let report = bootstrap.bootstrap().await.unwrap();

    assert!(matches!(
        report.outcome("weather"),
        Some(ModuleOutcome::Skipped(reason)) if reason.contains("geo")
    ));
    assert!(!bootstrap.registry().contains("weather"));
    assert!(bootstrap.registry().contains("radar"));
    assert!(!harness.events.of("initialize").contains(&"weather".to_string()));
}

#[tokio::test]
async fn test_only_enabled_extensions_load_in_scan_order() {
    let mut harness = Harness::new();
    harness.modules(&["logger", "a", "b", "c"]);
    harness.modules_service(
        vec![extension("c"), extension("a"), extension("b")],
        &["a", "c", "not-scanned"],
    );
    let log = Arc::new(RecordingLogger::default());

    let mut bootstrap = with_service(&harness, &log);
    bootstrap.bootstrap().await.unwrap();

    assert_eq!(
        bootstrap.registry().names(),
        vec!["logger", "modules", "c", "a"]
    );
}

#[tokio::test]
async fn test_only_critical_extensions_start() {
    let mut harness = Harness::new();
    harness
        .modules(&["logger", "daemon", "plugin"])
        .module("grumpy", Behavior::failing_start());
    let mut daemon = extension("daemon");
    daemon.critical = true;
    let mut grumpy = extension("grumpy");
    grumpy.critical = true;
    harness.modules_service(
        vec![daemon, extension("plugin"), grumpy],
        &["daemon", "plugin", "grumpy"],
    );
    let log = Arc::new(RecordingLogger::default());

    let mut bootstrap = with_service(&harness, &log);
    let report = bootstrap.bootstrap().await.unwrap();

    // A critical extension failing is still only skipped
    assert_eq!(report.failed(), vec!["grumpy"]);
    assert_eq!(harness.events.of("start"), vec!["logger", "daemon", "grumpy"]);
    // Started but unregistered, so it is stopped right away
    assert_eq!(harness.events.of("stop"), vec!["grumpy"]);
    assert_eq!(
        bootstrap.registry().state_of("daemon"),
        Some(&ModuleState::Running)
    );
    assert_eq!(
        bootstrap.registry().state_of("plugin"),
        Some(&ModuleState::Initialized)
    );
}

#[tokio::test]
async fn test_discarded_extension_stop_failure_is_logged() {
    let mut harness = Harness::new();
    harness.modules(&["logger"]).module(
        "stubborn",
        Behavior {
            fail_start: true,
            fail_stop: true,
            ..Behavior::default()
        },
    );
    let mut stubborn = extension("stubborn");
    stubborn.critical = true;
    harness.modules_service(vec![stubborn], &["stubborn"]);
    let log = Arc::new(RecordingLogger::default());

    let mut bootstrap = with_service(&harness, &log);
    let report = bootstrap.bootstrap().await.unwrap();

    assert_eq!(report.failed(), vec!["stubborn"]);
    assert_eq!(harness.events.of("stop"), vec!["stubborn"]);
    assert!(log.contains(Level::WARN, "Failed to stop discarded extension stubborn"));
    assert!(!bootstrap.registry().contains("stubborn"));
}

#[tokio::test]
async fn test_extension_named_like_core_module_is_skipped() {
    let mut harness = Harness::new();
    harness.modules(&["logger"]);
    harness.modules_service(vec![extension("logger")], &["logger"]);
    let log = Arc::new(RecordingLogger::default());

    let mut bootstrap = with_service(&harness, &log);
    let report = bootstrap.bootstrap().await.unwrap();

    assert!(matches!(
        report.outcome("logger"),
        Some(ModuleOutcome::Skipped(_))
    ));
    assert_eq!(harness.events.of("initialize"), vec!["logger"]);
    assert_eq!(bootstrap.registry().len(), 2);
}

#[tokio::test]
async fn test_missing_modules_service_skips_phase() {
    let mut harness = Harness::new();
    harness.modules(&["logger"]);
    let log = Arc::new(RecordingLogger::default());

    let mut bootstrap =
        Bootstrap::new(vec![critical("logger")], harness.loader()).with_bootstrap_logger(log.clone());
    bootstrap.bootstrap().await.unwrap();

    assert!(log.contains(Level::WARN, "skipping module discovery"));
    assert_eq!(bootstrap.phase(), BootstrapPhase::Ready);
}

#[tokio::test]
async fn test_failing_scan_skips_phase() {
    let mut harness = Harness::new();
    harness.modules(&["logger", "beta"]);
    harness.failing_modules_service(vec![extension("beta")], &["beta"]);
    let log = Arc::new(RecordingLogger::default());

    let mut bootstrap = with_service(&harness, &log);
    let report = bootstrap.bootstrap().await.unwrap();

    assert!(log.contains(Level::WARN, "Module discovery failed, skipping phase"));
    assert!(report.outcome("beta").is_none());
    assert!(!bootstrap.registry().contains("beta"));
    assert_eq!(bootstrap.phase(), BootstrapPhase::Ready);
}

#[tokio::test]
async fn test_discovery_can_be_disabled() {
    let mut harness = Harness::new();
    harness.modules(&["logger", "beta"]);
    harness.modules_service(vec![extension("beta")], &["beta"]);
    let log = Arc::new(RecordingLogger::default());

    let mut bootstrap = Bootstrap::new(core_table(), harness.loader())
        .with_options(BootstrapOptions {
            discovery: false,
            ..BootstrapOptions::default()
        })
        .with_bootstrap_logger(log.clone());
    bootstrap.bootstrap().await.unwrap();

    assert!(!bootstrap.registry().contains("beta"));
    assert_eq!(bootstrap.phase(), BootstrapPhase::Ready);
}

fn write_manifest(modules_dir: &Path, name: &str, extra: &str) -> std::path::PathBuf {
    let dir = modules_dir.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("module.toml"),
        format!("name = \"{}\"\nversion = \"0.1.0\"\n{}", name, extra),
    )
    .unwrap();
    dir
}

fn runtime_config(temp: &TempDir) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.modules.modules_dir = temp.path().join("modules");
    config.modules.data_dir = temp.path().join("data");
    config
}

#[tokio::test]
async fn test_builtin_modules_service_discovers_from_disk() {
    let temp = TempDir::new().unwrap();
    let config = runtime_config(&temp);
    let weather = write_manifest(
        &config.modules.modules_dir,
        "weather",
        "dependencies = [\"logger\"]\n",
    );
    write_manifest(&config.modules.modules_dir, "dormant", "enabled = false\n");
    write_manifest(
        &config.modules.modules_dir,
        "orphan",
        "dependencies = [\"geo\"]\n",
    );

    let events = EventLog::default();
    let mut factories = builtin_factories(&config);
    for (name, dir) in [
        ("weather", weather),
        ("dormant", config.modules.modules_dir.join("dormant")),
        ("orphan", config.modules.modules_dir.join("orphan")),
    ] {
        let events = events.clone();
        factories.register_constructor(dir.to_string_lossy().into_owned(), move || {
            Box::new(TestModule::new(name, events.clone(), Behavior::default()))
                as Box<dyn modos::Module>
        });
    }

    let log = Arc::new(RecordingLogger::default());
    let mut bootstrap = Bootstrap::new(
        default_core_definitions(),
        ModuleLoader::new(factories, &config.modules.data_dir),
    )
    .with_bootstrap_logger(log.clone());
    let report = bootstrap.bootstrap().await.unwrap();

    assert!(report.skipped().contains(&"orphan"));
    assert_eq!(
        bootstrap.registry().names(),
        vec!["logger", "modules", "cli", "weather"]
    );
    assert_eq!(events.of("initialize"), vec!["weather"]);

    let state = std::fs::read_to_string(config.modules.data_dir.join("modules.json")).unwrap();
    let state: serde_json::Value = serde_json::from_str(&state).unwrap();
    for core in ["logger", "modules", "cli"] {
        assert_eq!(state["modules"][core]["core"], true, "{} not persisted", core);
    }

    let health = bootstrap.health().await;
    assert!(health.iter().any(|(name, status)| name == "modules" && status.healthy));

    bootstrap.shutdown().await;
    assert!(bootstrap.registry().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_backed_extension_lifecycle() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let config = runtime_config(&temp);
    let dir = write_manifest(
        &config.modules.modules_dir,
        "sleeper",
        "critical = true\nentry_point = \"run.sh\"\n",
    );
    let script = dir.join("run.sh");
    std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let log = Arc::new(RecordingLogger::default());
    let mut bootstrap = Bootstrap::new(
        default_core_definitions(),
        ModuleLoader::new(builtin_factories(&config), &config.modules.data_dir),
    )
    .with_bootstrap_logger(log.clone());
    bootstrap.bootstrap().await.unwrap();

    assert_eq!(
        bootstrap.registry().state_of("sleeper"),
        Some(&ModuleState::Running)
    );
    assert!(config.modules.data_dir.join("sleeper").is_dir());
    let health = bootstrap.health().await;
    assert!(health.iter().any(|(name, status)| name == "sleeper" && status.healthy));

    let shutdown = bootstrap.shutdown().await;
    assert!(shutdown.is_clean());
    assert_eq!(shutdown.visited.first().map(String::as_str), Some("sleeper"));
}
