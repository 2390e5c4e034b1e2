//! Dashboard page routing and the sign-in redirect

#[cfg(test)]
mod tests {
    use crate::common::TestApp;
    use crate::common::app::INDEX_HTML;
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use roplant_admin::server::HttpServer;

    fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[actix_web::test]
    async fn test_unauthenticated_page_redirects_with_original_path() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/dashboard/plants?status=Running")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            location(&resp),
            "/auth/sign-in?redirect=%2Fdashboard%2Fplants%3Fstatus%3DRunning"
        );
    }

    #[actix_web::test]
    async fn test_invalid_cookie_redirects() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/dashboard/home")
                .insert_header((header::COOKIE, "session=not-a-token"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(location(&resp).starts_with("/auth/sign-in?redirect="));
    }

    #[actix_web::test]
    async fn test_signed_in_pages_serve_bundle() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let cookie = format!("session={}", ctx.admin_token().await);

        for uri in [
            "/dashboard/home",
            "/dashboard/users/abc",
            "/dashboard/instructions",
            "/dashboard/no-such-page",
        ] {
            let resp = test::call_service(
                &app,
                test::TestRequest::get()
                    .uri(uri)
                    .insert_header((header::COOKIE, cookie.clone()))
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
            let body = test::read_body(resp).await;
            assert_eq!(body, INDEX_HTML.as_bytes(), "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_dashboard_root_redirects_home() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;
        let token = ctx.admin_token().await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/dashboard")
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/dashboard/home");
    }

    #[actix_web::test]
    async fn test_sign_in_page_is_public() {
        let ctx = TestApp::new().await;
        let app = test::init_service(HttpServer::create_app(ctx.state.clone())).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/auth/sign-in?redirect=%2Fdashboard%2Fhome")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, INDEX_HTML.as_bytes());
    }
}
