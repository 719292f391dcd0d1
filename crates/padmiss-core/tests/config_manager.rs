//! Integration tests for `ConfigManager`.
//!
//! Every test runs against a fresh temporary directory, either as the
//! Padmiss base directory (default-path mode) or as the parent of an explicit
//! config file.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use padmiss_core::{
    ConfigManager, Configuration, DeviceConfig, ErrorKind, FifoConfig, ScannerConfig,
};
use tempfile::TempDir;

fn fresh_base() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let base = dir.path().join(".padmiss");
    (dir, base)
}

fn sample_config(manager: &ConfigManager) -> Configuration {
    let mut cfg = manager.default_config();
    cfg.api_key = "0123456789abcdef".to_string();
    cfg.scores_dir = PathBuf::from("/srv/stepmania/Save");
    cfg.hide_on_start = true;
    cfg.webserver = Some(true);
    cfg.devices.push(DeviceConfig::scanner(
        "/dev/bus/usb/001/004",
        ScannerConfig {
            id_vendor: "08ff".to_string(),
            id_product: "0009".to_string(),
            port_number: Some(3),
            bus: Some(1),
        },
    ));
    cfg.devices.push(DeviceConfig::fifo("player2", "/tmp/pipe"));
    cfg
}

// ── Bootstrap ─────────────────────────────────────────────────────────────────

#[test]
fn test_first_load_bootstraps_directories_and_defaults() {
    // Arrange
    let (_dir, base) = fresh_base();
    let manager = ConfigManager::with_base_dir(&base);

    // Act
    let cfg = manager.load_config().expect("first load");

    // Assert
    assert!(base.is_dir(), "base directory must be created");
    assert!(base.join("backups").is_dir(), "backups directory must be created");
    assert!(base.join("config.json").is_file(), "default document must be written");
    assert_eq!(cfg, Configuration::defaults(base.join("backups")));
    assert_eq!(cfg.api_url.as_str(), "https://api.padmiss.com/");
    assert_eq!(cfg.profile_dir_name, "StepMania 5");
    assert_eq!(cfg.webserver, Some(false));
}

#[test]
fn test_bootstrap_keeps_existing_document() {
    // Arrange: a document that differs from the defaults is already there
    let (_dir, base) = fresh_base();
    let manager = ConfigManager::with_base_dir(&base);
    let cfg = sample_config(&manager);
    manager.save_config(&cfg).expect("save");

    // Act
    let loaded = manager.load_config().expect("load");

    // Assert
    assert_eq!(loaded, cfg);
    assert!(base.join("backups").is_dir(), "missing backups dir is still created");
}

#[test]
fn test_bootstrap_notifies_listeners_once() {
    let (_dir, base) = fresh_base();
    let manager = ConfigManager::with_base_dir(&base);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    manager.on_change(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    manager.load_config().expect("first load");
    manager.load_config().expect("second load");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ── has_valid_config ──────────────────────────────────────────────────────────

#[test]
fn test_has_valid_config_before_and_after_save() {
    // Arrange
    let (_dir, base) = fresh_base();
    let manager = ConfigManager::with_base_dir(&base);

    // Assert: nothing on disk yet
    assert!(!manager.has_valid_config());

    // Act
    manager.save_config(&manager.default_config()).expect("save");

    // Assert
    assert!(manager.has_valid_config());
}

#[test]
fn test_has_valid_config_does_not_inspect_contents() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");
    fs::write(&path, "this is not json").expect("write");

    let manager = ConfigManager::with_config_file(&path);

    assert!(manager.has_valid_config());
    assert_eq!(manager.load_config().unwrap_err().kind(), ErrorKind::Validation);
}

// ── Round trip ────────────────────────────────────────────────────────────────

#[test]
fn test_save_then_load_round_trips() {
    // Arrange
    let (_dir, base) = fresh_base();
    let manager = ConfigManager::with_base_dir(&base);
    let cfg = sample_config(&manager);

    // Act
    manager.save_config(&cfg).expect("save");
    let loaded = manager.load_config().expect("load");

    // Assert
    assert_eq!(loaded, cfg);
}

#[test]
fn test_round_trip_preserves_device_order() {
    let (_dir, base) = fresh_base();
    let manager = ConfigManager::with_base_dir(&base);
    let mut cfg = manager.default_config();
    for name in ["c", "a", "b", "a"] {
        cfg.devices.push(DeviceConfig::fifo(name, format!("/tmp/{name}")));
    }

    manager.save_config(&cfg).expect("save");
    let loaded = manager.load_config().expect("load");

    let order: Vec<&str> = loaded.devices.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(order, vec!["c", "a", "b", "a"]);
}

#[test]
fn test_fifo_device_round_trips_exactly() {
    // Arrange
    let dir = TempDir::new().expect("temp dir");
    let manager = ConfigManager::with_config_file(dir.path().join("config.json"));
    let mut cfg = manager.default_config();
    cfg.devices.push(DeviceConfig {
        path: "player1".to_string(),
        device_type: "fifo".to_string(),
        config: None,
        fifo_config: Some(FifoConfig {
            path: PathBuf::from("/tmp/pipe"),
        }),
    });

    // Act
    manager.save_config(&cfg).expect("save");
    let loaded = manager.load_config().expect("load");

    // Assert
    let fifo = loaded.devices[0].fifo_config.as_ref().expect("fifoConfig");
    assert_eq!(fifo.path, PathBuf::from("/tmp/pipe"));
    assert_eq!(loaded.devices[0].device_type, "fifo");
    assert_eq!(loaded, cfg);
}

#[test]
fn test_saving_twice_is_byte_identical() {
    // Arrange
    let (_dir, base) = fresh_base();
    let manager = ConfigManager::with_base_dir(&base);
    let cfg = sample_config(&manager);

    // Act
    manager.save_config(&cfg).expect("first save");
    let first = fs::read(manager.config_path()).expect("read first");
    manager.save_config(&cfg).expect("second save");
    let second = fs::read(manager.config_path()).expect("read second");

    // Assert
    assert_eq!(first, second);
}

#[test]
fn test_saved_file_is_sorted_and_four_space_indented() {
    let (_dir, base) = fresh_base();
    let manager = ConfigManager::with_base_dir(&base);

    manager.save_config(&manager.default_config()).expect("save");
    let text = fs::read_to_string(manager.config_path()).expect("read");

    let keys: Vec<&str> = text
        .lines()
        .filter(|line| line.starts_with("    \"") && !line.starts_with("     "))
        .filter_map(|line| line.trim_start().split('"').nth(1))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    assert_eq!(keys.first(), Some(&"apiKey"));
    assert!(text.ends_with("}\n"));
}

#[test]
fn test_save_overwrites_whole_file() {
    // Arrange: a longer document followed by a shorter one
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");
    let manager = ConfigManager::with_config_file(&path);
    let long = sample_config(&manager);
    let short = manager.default_config();

    // Act
    manager.save_config(&long).expect("save long");
    manager.save_config(&short).expect("save short");

    // Assert
    let text = fs::read_to_string(&path).expect("read");
    assert_eq!(text, short.to_pretty_json().expect("render"));
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_api_url_fails_validation() {
    // Arrange
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");
    let mut doc: serde_json::Value =
        serde_json::from_str(&Configuration::defaults("/b").to_pretty_json().unwrap()).unwrap();
    doc["apiUrl"] = serde_json::json!("not-a-url");
    fs::write(&path, doc.to_string()).expect("write");
    let manager = ConfigManager::with_config_file(&path);

    // Act
    let err = manager.load_config().unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.violations().len(), 1);
    assert_eq!(err.violations()[0].field, "apiUrl");
}

#[test]
fn test_malformed_json_fails_validation() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");
    fs::write(&path, "{ \"apiUrl\": \"https://api.padmiss.com/\", ").expect("write");

    let err = ConfigManager::with_config_file(&path).load_config().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.violations()[0].field, "$");
}

#[test]
fn test_invalid_existing_file_is_not_replaced_by_defaults() {
    // Arrange
    let (_dir, base) = fresh_base();
    fs::create_dir_all(&base).expect("mkdir");
    fs::write(base.join("config.json"), "[]").expect("write");
    let manager = ConfigManager::with_base_dir(&base);

    // Act
    let err = manager.load_config().unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(fs::read_to_string(base.join("config.json")).unwrap(), "[]");
}

#[test]
fn test_missing_explicit_path_is_not_found_and_creates_nothing() {
    // Arrange
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("missing").join("config.json");
    let manager = ConfigManager::new(Some(path.clone())).expect("manager");

    // Act
    let err = manager.load_config().unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!dir.path().join("missing").exists(), "no directory may be created");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_unwritable_location_is_io_error() {
    // Arrange: a regular file sits where the base directory should be
    let dir = TempDir::new().expect("temp dir");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "x").expect("write");
    let manager = ConfigManager::with_base_dir(blocker.join(".padmiss"));

    // Act
    let err = manager.save_config(&manager.default_config()).unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Io);
}

// ── Listeners ─────────────────────────────────────────────────────────────────

#[test]
fn test_listeners_run_in_order_after_write() {
    // Arrange
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");
    let manager = ConfigManager::with_config_file(&path);
    let cfg = sample_config(&manager);
    let expected = cfg.to_pretty_json().expect("render");
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second"] {
        let log = Arc::clone(&log);
        let path = path.clone();
        let expected = expected.clone();
        manager.on_change(move || {
            // The file is complete by the time any listener runs.
            let on_disk = fs::read_to_string(&path).unwrap_or_default();
            assert_eq!(on_disk, expected);
            log.lock().unwrap().push(name.to_string());
        });
    }

    // Act
    manager.save_config(&cfg).expect("save");

    // Assert
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn test_removed_listener_is_not_called() {
    let (_dir, base) = fresh_base();
    let manager = ConfigManager::with_base_dir(&base);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = manager.on_change(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(manager.remove_listener(id));
    manager.save_config(&manager.default_config()).expect("save");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(manager.listeners().is_empty());
}

#[test]
fn test_concurrent_saves_leave_a_valid_file() {
    // Arrange
    let (_dir, base) = fresh_base();
    let manager = Arc::new(ConfigManager::with_base_dir(&base));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    manager.on_change(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Act
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let mut cfg = manager.default_config();
                cfg.api_key = format!("key-{i}");
                manager.save_config(&cfg).expect("save");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    // Assert
    let loaded = manager.load_config().expect("load");
    assert!(loaded.api_key.starts_with("key-"));
    assert_eq!(calls.load(Ordering::SeqCst), 8);
}
