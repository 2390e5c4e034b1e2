//! Global search across the directories

use crate::server::extract::Authenticated;
use crate::server::routes::listing_response;
use crate::server::state::AppState;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Deserialize;

/// Configure search routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/search", web::get().to(search));
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search(
    state: web::Data<AppState>,
    auth: Authenticated,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse> {
    let listing = state.search.search(&auth.principal, &query.q).await?;
    Ok(listing_response(listing))
}
