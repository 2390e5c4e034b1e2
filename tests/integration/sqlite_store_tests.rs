//! The application over an in-memory SQLite database

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use crate::common::TestApp;
    use crate::common::fixtures::{client, plant};
    use roplant_admin::config::DatabaseConfig;
    use roplant_admin::core::models::{ResourceAccess, ResourceKind};
    use roplant_admin::storage::{DocumentStore, SeaOrmDocumentStore};
    use roplant_admin::utils::error::DashboardError;
    use serde_json::json;
    use std::sync::Arc;

    async fn sqlite_app() -> TestApp {
        let store = SeaOrmDocumentStore::connect(&DatabaseConfig::sqlite_memory())
            .await
            .unwrap();
        store.migrate().await.unwrap();
        let store: Arc<dyn DocumentStore> = Arc::new(store);
        TestApp::with_store(store).await
    }

    #[tokio::test]
    async fn test_bootstrap_and_sign_in() {
        let ctx = sqlite_app().await;
        assert_eq!(ctx.state.store.backend_name(), "sqlite");
        assert!(!ctx.admin_token().await.is_empty());
    }

    #[tokio::test]
    async fn test_client_grant_gives_plant_access() {
        let ctx = sqlite_app().await;
        let admin = ctx.admin().await;

        ctx.state
            .clients
            .create(&admin, client("", "Acme Water"), Some("C1".to_string()))
            .await
            .unwrap();
        let created = ctx
            .state
            .plants
            .create(&admin, plant("", "Desal One", None, Some("C1")), None)
            .await
            .unwrap();

        let uid = ctx.create_user("ops@plant.io", "operator1").await;
        ctx.state
            .access
            .grant(&admin, &uid, ResourceKind::Client, "C1", ResourceAccess::new(true, true), None)
            .await
            .unwrap();

        let operator = ctx.principal(&uid).await;
        let changes = json!({ "status": "Offline" });
        let updated = ctx
            .state
            .plants
            .update(&operator, &created.id, changes.as_object().unwrap(), Some(1))
            .await
            .unwrap();
        assert_eq!(updated.record.status.to_string(), "Offline");
        assert_eq!(updated.version, 2);

        let stale = ctx
            .state
            .plants
            .update(&operator, &created.id, changes.as_object().unwrap(), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(stale, DashboardError::Conflict(_)));
    }
}
