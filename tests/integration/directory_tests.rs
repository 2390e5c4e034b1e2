//! Directory services over shared stores: stale listings, generated ids and
//! dangling references

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{client, plant, region, region_admin, seed, super_admin, user};
    use crate::common::{FlakyStore, TestApp, memory_store};
    use roplant_admin::auth::rbac::Principal;
    use roplant_admin::core::ids::{IdGenerator, is_generated_id};
    use roplant_admin::core::models::Region;
    use roplant_admin::services::plant_view::NOT_AVAILABLE;
    use roplant_admin::services::{CacheLoader, DirectoryCache, DirectoryService, PlantDetail};
    use roplant_admin::storage::{Collection, DocumentStore};
    use roplant_admin::utils::error::DashboardError;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn regions_over(store: Arc<dyn DocumentStore>, ids: IdGenerator) -> DirectoryService<Region> {
        let loader = CacheLoader::new(store.clone(), Arc::new(DirectoryCache::new()));
        DirectoryService::new(store, loader, Arc::new(ids))
    }

    #[tokio::test]
    async fn test_listing_serves_last_snapshot_when_store_fails() {
        let flaky = Arc::new(FlakyStore::new());
        let store: Arc<dyn DocumentStore> = flaky.clone();
        seed(store.as_ref(), Collection::Regions, "R1", &region("R1", "Coastal")).await;
        let regions = regions_over(store, IdGenerator::new(16));
        let root = Principal::from(super_admin("root"));

        let fresh = regions.list(&root).await.unwrap();
        assert_eq!(fresh.items.len(), 1);
        assert!(!fresh.stale);

        flaky.set_failing(true);
        let stale = regions.list(&root).await.unwrap();
        assert_eq!(stale.items.len(), 1);
        assert!(stale.stale);
        assert!(stale.error.is_some());

        flaky.set_failing(false);
        let recovered = regions.list(&root).await.unwrap();
        assert!(!recovered.stale);
        assert!(recovered.error.is_none());
    }

    #[tokio::test]
    async fn test_listing_without_snapshot_is_unavailable() {
        let flaky = Arc::new(FlakyStore::new());
        flaky.set_failing(true);
        let regions = regions_over(flaky, IdGenerator::new(16));

        let err = regions
            .list(&Principal::from(super_admin("root")))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_generated_ids_skip_existing_records() {
        let store = memory_store();
        let seeded_ids = IdGenerator::with_seed(7, 16);
        let mut taken = HashSet::new();
        for _ in 0..3 {
            let id = seeded_ids.candidate();
            seed(store.as_ref(), Collection::Regions, &id, &region(&id, "Taken")).await;
            taken.insert(id);
        }

        // Same seed: the first three candidates collide with seeded records
        let regions = regions_over(store, IdGenerator::with_seed(7, 16));
        let created = regions
            .create(&Principal::from(super_admin("root")), region("", "Fresh"), None)
            .await
            .unwrap();

        assert!(is_generated_id(&created.id));
        assert!(!taken.contains(&created.id));
    }

    #[tokio::test]
    async fn test_generation_gives_up_after_bounded_attempts() {
        let store = memory_store();
        let sampler = IdGenerator::with_seed(11, 2);
        for _ in 0..2 {
            let id = sampler.candidate();
            seed(store.as_ref(), Collection::Regions, &id, &region(&id, "Taken")).await;
        }

        let regions = regions_over(store, IdGenerator::with_seed(11, 2));
        let err = regions
            .create(&Principal::from(super_admin("root")), region("", "Fresh"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Internal(_)));
    }

    #[tokio::test]
    async fn test_plant_visible_through_region_or_client_grant() {
        let store = memory_store();
        seed(
            store.as_ref(),
            Collection::Plants,
            "P1",
            &plant("P1", "North", Some("R1"), Some("C9")),
        )
        .await;
        seed(
            store.as_ref(),
            Collection::Plants,
            "P2",
            &plant("P2", "South", Some("R2"), None),
        )
        .await;
        let ctx = TestApp::with_store(store).await;

        let mut operator = region_admin("op", &[("R1", true, false)]);
        operator
            .client_access
            .insert("C2".to_string(), roplant_admin::core::models::ResourceAccess::new(true, true));
        let listing = ctx.state.plants.list(&Principal::from(operator)).await.unwrap();

        let ids: Vec<&str> = listing.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P1"]);
    }

    #[tokio::test]
    async fn test_deleting_region_leaves_dangling_plant_reference() {
        let ctx = TestApp::new().await;
        let admin = ctx.admin().await;

        ctx.state
            .regions
            .create(&admin, region("", "Coastal"), Some("R1".to_string()))
            .await
            .unwrap();
        ctx.state
            .clients
            .create(&admin, client("", "Acme"), Some("C1".to_string()))
            .await
            .unwrap();
        ctx.state
            .plants
            .create(&admin, plant("", "Desal", Some("R1"), Some("C1")), Some("P1".to_string()))
            .await
            .unwrap();

        ctx.state.regions.delete(&admin, "R1").await.unwrap();

        let stored = ctx.state.plants.get(&admin, "P1").await.unwrap();
        assert_eq!(stored.record.region_id.as_deref(), Some("R1"));

        let detail = PlantDetail::resolve(stored.record, &ctx.state.cache);
        assert_eq!(detail.region_name, NOT_AVAILABLE);
        assert_eq!(detail.client_name, "Acme");
    }

    #[tokio::test]
    async fn test_concurrent_edits_of_different_fields_both_land() {
        let ctx = TestApp::new().await;
        let admin = ctx.admin().await;
        ctx.state
            .regions
            .create(&admin, region("", "Coastal"), Some("R1".to_string()))
            .await
            .unwrap();

        let rename = json!({ "name": "Coastal North" });
        let rephone = json!({ "phone": "+966 555 0100" });
        let (a, b) = tokio::join!(
            ctx.state.regions.update(&admin, "R1", rename.as_object().unwrap(), None),
            ctx.state.regions.update(&admin, "R1", rephone.as_object().unwrap(), None),
        );
        a.unwrap();
        b.unwrap();

        let stored = ctx.state.regions.get(&admin, "R1").await.unwrap();
        assert_eq!(stored.record.name, "Coastal North");
        assert_eq!(stored.record.phone, "+966 555 0100");
        assert_eq!(stored.version, 3);
    }

    #[tokio::test]
    async fn test_unreadable_caller_sees_nothing() {
        let ctx = TestApp::new().await;
        let admin = ctx.admin().await;
        ctx.state
            .regions
            .create(&admin, region("", "Coastal"), Some("R1".to_string()))
            .await
            .unwrap();

        let unreadable = Principal::from_lookup(
            "ghost",
            Err(DashboardError::unavailable("store offline")),
        );
        let listing = ctx.state.regions.list(&unreadable).await.unwrap();
        assert!(listing.items.is_empty());

        let err = ctx.state.regions.get(&unreadable, "R1").await.unwrap_err();
        assert!(matches!(err, DashboardError::Forbidden(_)));

        let nobody = Principal::from(user("nobody", "nobody@plant.io"));
        let err = ctx
            .state
            .regions
            .create(&nobody, region("", "Sneaky"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Forbidden(_)));
    }
}
