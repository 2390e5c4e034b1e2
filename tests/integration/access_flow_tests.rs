//! Grants written through the access store change what the next request
//! of that user may do

#[cfg(test)]
mod tests {
    use crate::common::TestApp;
    use crate::common::fixtures::region;
    use roplant_admin::auth::rbac::{
        AccessDecision, DenialReason, GrantSource, Role, can_add_regions, evaluate_access,
        resolve_role,
    };
    use roplant_admin::core::models::{ResourceAccess, ResourceKind};
    use roplant_admin::utils::error::DashboardError;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_grant_changes_role_and_access_on_next_lookup() {
        let ctx = TestApp::new().await;
        let admin = ctx.admin().await;
        for id in ["R1", "R2"] {
            ctx.state
                .regions
                .create(&admin, region("", &format!("Region {}", id)), Some(id.to_string()))
                .await
                .unwrap();
        }
        let uid = ctx.create_user("ops@plant.io", "operator1").await;

        let before = ctx.principal(&uid).await;
        assert_eq!(resolve_role(&before), Role::Default);
        assert_eq!(
            evaluate_access(&before, "R1", ResourceKind::Region).decision,
            AccessDecision::Denied(DenialReason::NoEntry)
        );

        ctx.state
            .access
            .grant(&admin, &uid, ResourceKind::Region, "R1", ResourceAccess::new(true, false), None)
            .await
            .unwrap();

        let after = ctx.principal(&uid).await;
        assert_eq!(resolve_role(&after), Role::RegionAdmin);

        let r1 = evaluate_access(&after, "R1", ResourceKind::Region);
        assert_eq!(r1.decision, AccessDecision::Granted(GrantSource::AccessMap));
        assert_eq!(r1.access, ResourceAccess::new(true, false));
        assert!(!evaluate_access(&after, "R2", ResourceKind::Region).can_read());

        let listed = ctx.state.regions.list(&after).await.unwrap();
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].id, "R1");
    }

    #[tokio::test]
    async fn test_revoke_restores_previous_map() {
        let ctx = TestApp::new().await;
        let admin = ctx.admin().await;
        ctx.state
            .regions
            .create(&admin, region("", "Coastal"), Some("R1".to_string()))
            .await
            .unwrap();
        let uid = ctx.create_user("ops@plant.io", "operator1").await;
        let original = ctx.state.users.get(&admin, &uid).await.unwrap().record;

        ctx.state
            .access
            .grant(&admin, &uid, ResourceKind::Region, "R1", ResourceAccess::FULL, None)
            .await
            .unwrap();
        ctx.state
            .access
            .revoke(&admin, &uid, ResourceKind::Region, "R1", None)
            .await
            .unwrap();

        let restored = ctx.state.users.get(&admin, &uid).await.unwrap().record;
        assert_eq!(restored.region_access, original.region_access);
        assert_eq!(restored.client_access, original.client_access);
        assert_eq!(resolve_role(&ctx.principal(&uid).await), Role::Default);
    }

    #[tokio::test]
    async fn test_capability_flags_round_trip() {
        let ctx = TestApp::new().await;
        let admin = ctx.admin().await;
        let uid = ctx.create_user("ops@plant.io", "operator1").await;
        assert!(!can_add_regions(&ctx.principal(&uid).await));

        let mut changes = BTreeMap::new();
        changes.insert("regions_create".to_string(), Some(true));
        ctx.state
            .users
            .set_capabilities(&admin, &uid, &changes, None)
            .await
            .unwrap();
        assert!(can_add_regions(&ctx.principal(&uid).await));

        changes.insert("regions_create".to_string(), None);
        ctx.state
            .users
            .set_capabilities(&admin, &uid, &changes, None)
            .await
            .unwrap();
        assert!(!can_add_regions(&ctx.principal(&uid).await));
    }

    #[tokio::test]
    async fn test_grant_of_missing_resource_is_not_found() {
        let ctx = TestApp::new().await;
        let admin = ctx.admin().await;
        let uid = ctx.create_user("ops@plant.io", "operator1").await;

        let err = ctx
            .state
            .access
            .grant(&admin, &uid, ResourceKind::Client, "C404", ResourceAccess::FULL, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_sign_in() {
        let ctx = TestApp::new().await;
        let admin = ctx.admin().await;
        let uid = ctx.create_user("ops@plant.io", "operator1").await;

        ctx.state.users.delete(&admin, &uid).await.unwrap();

        let err = ctx
            .state
            .auth
            .sign_in("ops@plant.io", "operator1", "test-client")
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Auth(_)));

        let err = ctx.state.users.delete(&admin, &ctx.admin_uid).await.unwrap_err();
        assert!(matches!(err, DashboardError::BadRequest(_)));
    }
}
