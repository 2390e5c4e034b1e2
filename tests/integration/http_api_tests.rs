//! JSON API tests against the fully wired application

#[cfg(test)]
mod tests {
    use crate::common::{ADMIN_EMAIL, ADMIN_PASSWORD, TestApp};
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use roplant_admin::core::models::{ResourceAccess, ResourceKind};
    use roplant_admin::server::HttpServer;
    use serde_json::{Value, json};

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }

    #[actix_web::test]
    async fn test_health_and_version() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/health/detailed").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["store"]["backend"], "memory");
        assert_eq!(body["data"]["users"]["records"], 1);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/version").to_request(),
        )
        .await;
        assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn test_sign_in_sets_session_cookie() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/sign-in")
                .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie");
        assert_eq!(cookie.http_only(), Some(true));
        let cookie_value = cookie.value().to_string();

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["token"], cookie_value.as_str());
        assert_eq!(body["data"]["session"]["email"], ADMIN_EMAIL);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/auth/session")
                .insert_header((header::COOKIE, format!("session={}", cookie_value)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_wrong_password_is_unauthorized() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/sign-in")
                .set_json(json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "AUTH_ERROR");
    }

    #[actix_web::test]
    async fn test_sign_out_revokes_token() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let token = ctx.admin_token().await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/sign-out")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/me")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_me_reports_role_and_capabilities() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let token = ctx.admin_token().await;

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/me")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"]["role"], "super_admin");
        assert_eq!(body["data"]["canAccessUsers"], true);
        assert_eq!(body["data"]["capabilities"]["plants_delete"], true);
        assert_eq!(body["data"]["user"]["email"], ADMIN_EMAIL);
        assert_eq!(body["data"]["user"]["version"], 1);
    }

    #[actix_web::test]
    async fn test_api_requires_session() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;

        for uri in ["/api/v1/regions", "/api/v1/users", "/api/v1/me"] {
            let resp =
                test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_region_crud_and_duplicate_id() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let token = ctx.admin_token().await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/regions")
                .insert_header(bearer(&token))
                .set_json(json!({ "id": "R1", "name": "Coastal" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["id"], "R1");
        assert_eq!(body["data"]["createdBy"], ADMIN_EMAIL);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/regions")
                .insert_header(bearer(&token))
                .set_json(json!({ "id": "R1", "name": "Other" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Conflict: Region ID already exists");

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/regions/R1")
                .insert_header(bearer(&token))
                .set_json(json!({ "name": "Coastal North", "expectedVersion": 1 }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["name"], "Coastal North");
        assert_eq!(body["data"]["version"], 2);

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/regions/R1")
                .insert_header(bearer(&token))
                .set_json(json!({ "name": "Stale edit", "expectedVersion": 1 }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/regions")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["meta"]["stale"], false);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/v1/regions/R1")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/regions/R1")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_plant_validation_errors_are_per_field() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let token = ctx.admin_token().await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/plants")
                .insert_header(bearer(&token))
                .set_json(json!({ "name": "X", "capacity": -5, "phone": "call me" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"]["fields"]["capacity"],
            "Capacity must be a positive number"
        );
        assert!(body["error"]["fields"]["name"].is_string());
        assert!(body["error"]["fields"]["phone"].is_string());
    }

    #[actix_web::test]
    async fn test_plant_detail_resolves_names() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let token = ctx.admin_token().await;

        for (uri, body) in [
            ("/api/v1/regions", json!({ "id": "R1", "name": "Coastal" })),
            (
                "/api/v1/plants",
                json!({
                    "id": "P1",
                    "name": "Desal One",
                    "capacity": "1200",
                    "regionId": "R1",
                    "clientId": "C404"
                }),
            ),
        ] {
            let resp = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri(uri)
                    .insert_header(bearer(&token))
                    .set_json(body)
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::CREATED, "{}", uri);
        }

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/plants/P1/detail")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"]["regionName"], "Coastal");
        assert_eq!(body["data"]["clientName"], "N/A");
        assert_eq!(body["data"]["capacity"], 1200.0);
        assert_eq!(body["meta"]["version"], 1);
    }

    #[actix_web::test]
    async fn test_region_admin_sees_only_granted_regions() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let admin_token = ctx.admin_token().await;

        for id in ["R1", "R2"] {
            let resp = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/api/v1/regions")
                    .insert_header(bearer(&admin_token))
                    .set_json(json!({ "id": id, "name": format!("Region {}", id) }))
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let uid = ctx.create_user("ops@plant.io", "operator1").await;
        ctx.state
            .access
            .grant(
                &ctx.admin().await,
                &uid,
                ResourceKind::Region,
                "R1",
                ResourceAccess::new(true, false),
                None,
            )
            .await
            .unwrap();
        let token = ctx.token("ops@plant.io", "operator1").await;

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/regions")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        let ids: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["R1"]);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/regions/R1/access")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"]["read"], true);
        assert_eq!(body["data"]["write"], false);

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/regions/R1")
                .insert_header(bearer(&token))
                .set_json(json!({ "name": "Renamed" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/regions/R2")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/me")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"]["role"], "region_admin");
        assert_eq!(body["data"]["canAccessUsers"], false);
        assert_eq!(body["data"]["capabilities"]["regions_create"], false);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/users")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_search_is_filtered_by_access() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let admin_token = ctx.admin_token().await;

        for (id, name) in [("R1", "Coastal"), ("R2", "Coastal South")] {
            let resp = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/api/v1/regions")
                    .insert_header(bearer(&admin_token))
                    .set_json(json!({ "id": id, "name": name }))
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let uid = ctx.create_user("ops@plant.io", "operator1").await;
        ctx.state
            .access
            .grant(
                &ctx.admin().await,
                &uid,
                ResourceKind::Region,
                "R1",
                ResourceAccess::new(true, false),
                None,
            )
            .await
            .unwrap();
        let token = ctx.token("ops@plant.io", "operator1").await;

        let search = |token: &str, q: &str| {
            test::TestRequest::get()
                .uri(&format!("/api/v1/search?q={}", q))
                .insert_header(bearer(token))
                .to_request()
        };

        let body: Value =
            test::call_and_read_body_json(&app, search(&admin_token, "COASTAL")).await;
        assert_eq!(body["meta"]["count"], 2);
        assert_eq!(body["data"][0]["type"], "Region");
        assert_eq!(body["data"][0]["matchedIn"][0]["field"], "name");

        let body: Value = test::call_and_read_body_json(&app, search(&admin_token, "ops@")).await;
        assert_eq!(body["data"][0]["type"], "User");
        assert_eq!(body["data"][0]["name"], "Operator");
        assert_eq!(body["data"][0]["matchedIn"][0]["value"], "ops@plant.io");

        let body: Value = test::call_and_read_body_json(&app, search(&token, "coastal")).await;
        assert_eq!(body["meta"]["count"], 1);
        assert_eq!(body["data"][0]["id"], "R1");

        let body: Value = test::call_and_read_body_json(&app, search(&token, "ops@")).await;
        assert_eq!(body["meta"]["count"], 0);

        let body: Value = test::call_and_read_body_json(&app, search(&admin_token, "c")).await;
        assert_eq!(body["data"], json!([]));

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/search?q=coastal").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_access_map_editing_over_http() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let token = ctx.admin_token().await;

        for (id, name) in [("C1", "Acme Water"), ("C2", "Blue Springs")] {
            let resp = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/api/v1/clients")
                    .insert_header(bearer(&token))
                    .set_json(json!({ "id": id, "name": name }))
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }
        let uid = ctx.create_user("ops@plant.io", "operator1").await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/users/{}/access/client", uid))
                .insert_header(bearer(&token))
                .set_json(json!({
                    "resourceId": "C1",
                    "read": true,
                    "write": true,
                    "expectedVersion": 1
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["version"], 2);
        assert_eq!(body["data"]["entries"][0]["name"], "Acme Water");

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/users/{}/access/clients/available?search=blue", uid))
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"], json!([{ "id": "C2", "name": "Blue Springs" }]));

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/users/{}/access/client/C1", uid))
                .insert_header(bearer(&token))
                .set_json(json!({ "read": true, "write": false, "expectedVersion": 2 }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/v1/users/{}/access/client/C1?expectedVersion=2", uid))
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/v1/users/{}/access/client/C1?expectedVersion=3", uid))
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["entries"], json!([]));

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/users/{}/access/plant", uid))
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_capabilities_endpoint() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let token = ctx.admin_token().await;
        let uid = ctx.create_user("ops@plant.io", "operator1").await;

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/users/{}/capabilities", uid))
                .insert_header(bearer(&token))
                .set_json(json!({ "capabilities": { "plants_create": true, "bogus_flag": true } }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/users/{}/capabilities", uid))
                .insert_header(bearer(&token))
                .set_json(json!({ "capabilities": { "plants_create": true } }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let operator = ctx.token("ops@plant.io", "operator1").await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/plants")
                .insert_header(bearer(&operator))
                .set_json(json!({ "name": "Field Unit", "capacity": 40 }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let id = body["data"]["id"].as_str().unwrap();
        assert_eq!(id.len(), 6);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/v1/plants/{}", id))
                .insert_header(bearer(&operator))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_profile_edit_is_limited_to_profile_fields() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        ctx.create_user("ops@plant.io", "operator1").await;
        let token = ctx.token("ops@plant.io", "operator1").await;

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/profile")
                .insert_header(bearer(&token))
                .set_json(json!({ "acc": "super_admin" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/profile")
                .insert_header(bearer(&token))
                .set_json(json!({ "name": "Night Shift", "city": "Jeddah" }))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"]["name"], "Night Shift");
        assert_eq!(body["data"]["city"], "Jeddah");
        assert!(body["data"].get("acc").is_none());
    }

    #[actix_web::test]
    async fn test_malformed_json_is_bad_request() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let token = ctx.admin_token().await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/regions")
                .insert_header(bearer(&token))
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .set_payload("{ not json")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}
