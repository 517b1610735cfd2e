use notchy::{Config, ConfigLoader, DismissPolicy, MockFileSystem};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

/// Integration tests for ConfigLoader with file system abstraction
#[cfg(test)]
mod config_loader_tests {
    use super::*;

    #[test]
    fn test_config_loading_with_mock_filesystem() {
        let file_system = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");

        let config_content = r#"
[general]
log_level = "debug"

[notifications]
mirror_to_system = true
include_message = false

[login]
enabled = false
cooldown_hours = 12
state_file = "/test/login_state.toml"

[airpods]
poll_interval_ms = 250
device_names = ["Beats"]
"#;
        file_system.add_file(&config_path, config_content.to_string());

        let config_loader = ConfigLoader::new(file_system.clone(), config_path.clone());
        let config = config_loader.load_config().unwrap();

        assert_eq!(config.general.log_level, "debug");
        assert!(config.notifications.mirror_to_system);
        assert!(!config.notifications.include_message);
        assert!(!config.login.enabled);
        assert_eq!(config.login.cooldown_hours, 12);
        assert_eq!(
            config.login.state_path().unwrap(),
            PathBuf::from("/test/login_state.toml")
        );
        assert_eq!(config.airpods.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.airpods.device_names, vec!["Beats".to_string()]);
        // Sections left out keep their defaults
        assert_eq!(config.cpu, Config::default().cpu);
        assert_eq!(config.events.dismiss_policy, DismissPolicy::CompactFirst);

        let read_calls = file_system.get_read_calls();
        assert_eq!(read_calls.len(), 1);
        assert_eq!(read_calls[0], config_path);
    }

    #[test]
    fn test_config_modification_detection() {
        let file_system = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        let config_loader = ConfigLoader::new(file_system.clone(), config_path.clone());

        // Nothing to compare against before the file exists
        assert!(!config_loader.is_config_modified(SystemTime::UNIX_EPOCH).unwrap());

        file_system.add_file(&config_path, "[general]\nlog_level = \"info\"\n".to_string());

        // The mock stamps its first write at epoch + 1000s, then 1000s apart
        let before = SystemTime::UNIX_EPOCH + Duration::from_secs(500);
        let after = SystemTime::UNIX_EPOCH + Duration::from_secs(1500);
        assert!(config_loader.is_config_modified(before).unwrap());
        assert!(!config_loader.is_config_modified(after).unwrap());

        file_system.add_file(&config_path, "[general]\nlog_level = \"warn\"\n".to_string());
        assert!(config_loader.is_config_modified(after).unwrap());
    }

    #[test]
    fn test_default_config_is_written_and_reloadable() {
        let file_system = MockFileSystem::new();
        let config_path = PathBuf::from("/home/user/.config/notchy/config.toml");
        let config_loader = ConfigLoader::new(file_system.clone(), config_path.clone());

        let created = config_loader.load_config().unwrap();
        assert!(config_loader.config_exists());

        let reloaded = config_loader.load_config().unwrap();
        assert_eq!(created, reloaded);

        // Only the first load writes
        assert_eq!(file_system.get_write_calls().len(), 1);
        assert_eq!(
            file_system.get_directory_creation_calls(),
            vec![PathBuf::from("/home/user/.config/notchy")]
        );
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let file_system = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        file_system.add_file(&config_path, "[cpu\nthreshold = ".to_string());

        let config_loader = ConfigLoader::new(file_system, config_path);
        let error = config_loader.load_config().unwrap_err();

        assert!(format!("{error:#}").contains("Invalid config"));
    }

    #[test]
    fn test_unknown_dismiss_policy_is_an_error() {
        let file_system = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        file_system.add_file(
            &config_path,
            "[events]\ndismiss_policy = \"sideways\"\n".to_string(),
        );

        let config_loader = ConfigLoader::new(file_system, config_path);
        assert_err!(config_loader.load_config());
    }

    #[test]
    fn test_read_failure_is_reported() {
        let file_system = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        file_system.add_file(&config_path, String::new());
        file_system.set_read_failure(true);

        let config_loader = ConfigLoader::new(file_system, config_path);
        let error = config_loader.load_config().unwrap_err();

        assert!(format!("{error:#}").contains("Cannot read config"));
    }

    #[test]
    fn test_saved_config_round_trips() {
        let file_system = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        let config_loader = ConfigLoader::new(file_system, config_path);

        let mut config = Config::default();
        config.events.dismiss_policy = DismissPolicy::Immediate;
        config.cpu.threshold = 65.5;
        config.airpods.enabled = false;

        assert_ok!(config_loader.save_config(&config));
        assert_eq!(assert_ok!(config_loader.load_config()), config);
    }
}

/// The same loader against the real file system
mod standard_file_system_tests {
    use super::*;

    #[test]
    fn test_default_config_created_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/notchy/config.toml");
        let config_loader = ConfigLoader::new_production(config_path.clone());

        let config = assert_ok!(config_loader.load_config());

        assert_eq!(config, Config::default());
        assert!(config_path.exists());
        let written = std::fs::read_to_string(&config_path).unwrap();
        assert!(written.contains("dismiss_policy = \"compact_first\""));
    }

    #[test]
    fn test_hand_edited_file_is_picked_up() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[airpods]\nenabled = false\n\n[cpu]\nalert_cooldown_secs = 300\n",
        )
        .unwrap();

        let config_loader = ConfigLoader::for_path(Some(&config_path)).unwrap();
        let config = assert_ok!(config_loader.load_config());

        assert!(!config.airpods.enabled);
        assert_eq!(config.cpu.alert_cooldown(), Duration::from_secs(300));
        assert_eq!(config_loader.get_config_path(), config_path.as_path());
    }
}
