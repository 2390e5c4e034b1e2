//! HTTP middleware implementations

mod dashboard_guard;

pub use dashboard_guard::{
    DashboardGuard, DashboardGuardService, is_dashboard_path, sign_in_redirect,
};
