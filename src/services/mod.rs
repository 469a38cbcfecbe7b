//! Business logic services

pub mod catalog;
pub mod email;
pub mod reports;
pub mod users;

use crate::{config::AppConfig, error::AppResult, repository::Repository, storage::FileStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub reports: reports::ReportsService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository and mail transport.
    ///
    /// Upload directories are created when missing.
    pub async fn new(
        repository: Repository,
        config: &AppConfig,
        email: email::EmailService,
    ) -> AppResult<Self> {
        let pdfs = FileStore::new(&config.storage.pdf_dir);
        let profiles = FileStore::new(&config.storage.profile_dir);
        pdfs.init().await?;
        profiles.init().await?;

        let routing = users::NotificationRouting {
            public_url: config.server.public_url.clone(),
            admin_recipient: config.email.admin_recipient.clone(),
        };

        Ok(Self {
            catalog: catalog::CatalogService::new(repository.clone(), pdfs),
            reports: reports::ReportsService::new(repository.clone()),
            users: users::UsersService::new(
                repository,
                config.auth.clone(),
                email,
                profiles,
                routing,
            ),
        })
    }
}
