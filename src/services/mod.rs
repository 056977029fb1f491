//! Business logic services

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod loans;
pub mod redis;
pub mod sessions;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    config::AuthConfig,
    repository::{AccountStore, CatalogStore},
};

/// The server's local calendar date
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub admin: admin::AdminService,
    pub visits: sessions::VisitCounter,
}

impl Services {
    /// Wire every service onto the given stores
    pub fn new(
        catalog_store: Arc<dyn CatalogStore>,
        account_store: Arc<dyn AccountStore>,
        auth_config: AuthConfig,
        session_store: Arc<dyn sessions::SessionStore>,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(account_store, auth_config),
            catalog: catalog::CatalogService::new(catalog_store.clone()),
            loans: loans::LoansService::new(catalog_store.clone()),
            admin: admin::AdminService::new(catalog_store),
            visits: sessions::VisitCounter::new(session_store),
        }
    }
}
