use std::sync::Arc;

use crate::application::api_keys::ApiTokens;
use crate::application::books::BookService;
use crate::application::catalog::CatalogService;
use crate::application::settings::SettingsService;
use crate::cache::BookListCache;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct ApiState {
    pub tokens: Arc<ApiTokens>,
    pub books: Arc<BookService>,
    pub cache: Arc<BookListCache>,
    pub settings: Arc<SettingsService>,
    pub catalog: Arc<CatalogService>,
    /// `None` when the server runs on in-memory repositories.
    pub db: Option<Arc<PostgresRepositories>>,
}
