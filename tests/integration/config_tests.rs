//! Shipped configuration example

#[cfg(test)]
mod tests {
    use roplant_admin::config::{Config, StorageBackend};

    const EXAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/dashboard.yaml.example");

    #[tokio::test]
    async fn test_example_config_loads() {
        let config = Config::from_file(EXAMPLE).await.unwrap();

        assert_eq!(config.server().port, 8080);
        assert_eq!(config.storage().backend, StorageBackend::Database);
        assert!(config.storage().database.is_sqlite());
        assert_eq!(config.storage().id_max_attempts, 16);
        assert_eq!(config.auth().sign_in.max_attempts, 5);
        // Empty secret is replaced with a generated one
        assert!(config.auth().jwt_secret.len() >= 32);
        assert_eq!(
            config.auth().bootstrap_admin.as_ref().map(|a| a.email.as_str()),
            Some("admin@example.com")
        );
    }
}
