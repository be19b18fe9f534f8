//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Defaults for missing files and missing keys
//! - Integration with MarkEngine (display settings reach decorations)

use camino::{Utf8Path, Utf8PathBuf};
use markfiles::services::LocalFileSystem;
use markfiles::{ConfigManager, DisplayMode, MarkEngine, MarkFilesConfig, Workspace};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
}

#[test]
fn test_load_default_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    // Config file doesn't exist, should return defaults
    let config = manager.load_config().unwrap();

    assert_eq!(config.display_mode, DisplayMode::Both);
    assert_eq!(config.marked_file_icon, "✓");
    assert!(config.autoload_from_scope);
    assert_eq!(config.scope_file_name, "scope");
    assert_eq!(config.scope_file_extension, "txt");
    assert!(!config.debug_mode);
}

#[test]
fn test_save_and_load_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = manager.load_config().unwrap();
    config.display_mode = DisplayMode::None;
    config.scope_file_extension = "scope".to_string();
    manager.save_config(&config).unwrap();

    let loaded = manager.load_config().unwrap();
    assert_eq!(loaded.display_mode, DisplayMode::None);
    assert_eq!(loaded.scope_file_extension, "scope");
}

#[test]
fn test_saved_file_is_readable_yaml() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    manager.save_config(&MarkFilesConfig::default()).unwrap();

    let text = fs::read_to_string(manager.config_path()).unwrap();
    assert!(text.contains("display_mode: both"));
    assert!(text.contains("autoload_from_scope: true"));
}

#[test]
fn test_hand_written_config_with_unknown_display_mode_fails() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(manager.config_path(), "display_mode: sparkles\n").unwrap();

    assert!(manager.load_config().is_err());
}

#[tokio::test]
async fn test_loaded_config_drives_decorations() {
    let (_temp_dir, root) = create_test_config_dir();
    fs::write(root.join("a.ts"), "").unwrap();
    let manager = ConfigManager::new(root.join(".markfiles")).unwrap();
    fs::write(
        manager.config_path(),
        "display_mode: color\nmarked_file_icon: \"!\"\n",
    )
    .unwrap();

    let engine = MarkEngine::new(
        Workspace::new([&root]),
        Arc::new(LocalFileSystem::new()),
        None,
        manager.load_config().unwrap(),
    );
    engine.toggle(&[root.join("a.ts")]).await;

    let (_cancel_tx, cancel) = watch::channel(false);
    let decoration = engine.decoration(&root.join("a.ts"), &cancel);
    assert!(decoration.color.is_some());
    assert!(decoration.badge.is_none());

    // Switching to icon mode re-notifies the marked file and changes its decoration
    let mut rx = engine.subscribe();
    engine.apply_config(MarkFilesConfig {
        display_mode: DisplayMode::Icon,
        ..manager.load_config().unwrap()
    });
    assert_eq!(rx.try_recv().unwrap().path(), root.join("a.ts").as_path());

    let decoration = engine.decoration(Utf8Path::new(root.join("a.ts").as_str()), &cancel);
    assert_eq!(decoration.badge.as_deref(), Some("!"));
    assert!(decoration.color.is_none());
}
