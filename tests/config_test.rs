use std::time::Duration;

use essaygen::config::Config;
use essaygen::config::secrets::ExposeSecret;

// Env vars are process-global, so every case runs in one test.
#[test]
fn config_from_env() {
    unsafe {
        for name in [
            "DEEPSEEK_API_KEY",
            "PORT",
            "DATA_DIR",
            "CHUNK_SIZE",
            "FLUSH_EVERY",
            "REQUEST_DELAY_MS",
            "GENERATION_MODEL",
        ] {
            std::env::remove_var(name);
        }
    }

    // Missing key
    assert!(Config::from_env().is_err());

    // Defaults
    unsafe {
        std::env::set_var("DEEPSEEK_API_KEY", "sk-test-key");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.deepseek_api_key.expose_secret(), "sk-test-key");
    assert_eq!(config.port, 5000);
    assert_eq!(config.storage.chunk_size, 20);
    assert_eq!(config.flush_every, 50);
    assert_eq!(config.request_delay, Duration::from_secs(1));
    assert_eq!(config.model, "deepseek-chat");
    assert!(!config.log_level.is_empty());
    assert!(!format!("{config:?}").contains("sk-test-key"));

    // Overrides
    unsafe {
        std::env::set_var("PORT", "8080");
        std::env::set_var("DATA_DIR", "/tmp/essaygen-config-test");
        std::env::set_var("CHUNK_SIZE", "5");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.storage.chunk_size, 5);
    assert_eq!(
        config.storage.data_dir.to_str(),
        Some("/tmp/essaygen-config-test")
    );

    // Malformed and zero values
    unsafe {
        std::env::set_var("PORT", "eighty");
    }
    assert!(Config::from_env().is_err());
    unsafe {
        std::env::set_var("PORT", "8080");
        std::env::set_var("CHUNK_SIZE", "0");
    }
    assert!(Config::from_env().is_err());
    unsafe {
        std::env::set_var("CHUNK_SIZE", "5");
        std::env::set_var("FLUSH_EVERY", "0");
    }
    assert!(Config::from_env().is_err());

    unsafe {
        for name in [
            "DEEPSEEK_API_KEY",
            "PORT",
            "DATA_DIR",
            "CHUNK_SIZE",
            "FLUSH_EVERY",
        ] {
            std::env::remove_var(name);
        }
    }
}
