use std::{future::IntoFuture, process, sync::Arc};

use bookshelf::{
    application::{
        api_keys::ApiTokens,
        books::BookService,
        catalog::CatalogService,
        error::AppError,
        repos::{BooksRepo, BooksWriteRepo, SettingsRepo},
        settings::SettingsService,
    },
    cache::{BookListCache, CacheConfig, MemoryCacheStore, MutationHooks},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, HttpState},
        memory::MemoryRepositories,
        telemetry,
    },
};
use tokio::{sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| AppError::validation("migrate requires database.url"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(target = "bookshelf::migrate", "Migrations applied");
    Ok(())
}

/// Repositories behind the services, with the Postgres handle kept for health checks.
struct Repositories {
    books: Arc<dyn BooksRepo>,
    books_write: Arc<dyn BooksWriteRepo>,
    settings: Arc<dyn SettingsRepo>,
    db: Option<Arc<PostgresRepositories>>,
}

async fn init_repositories(settings: &config::Settings) -> Result<Repositories, AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!(
            target = "bookshelf::startup",
            "database.url is not configured; using in-memory repositories"
        );
        let memory = Arc::new(MemoryRepositories::new());
        return Ok(Repositories {
            books: memory.clone(),
            books_write: memory.clone(),
            settings: memory,
            db: None,
        });
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let postgres = Arc::new(PostgresRepositories::new(pool));
    Ok(Repositories {
        books: postgres.clone(),
        books_write: postgres.clone(),
        settings: postgres.clone(),
        db: Some(postgres),
    })
}

fn build_states(settings: &config::Settings, repos: Repositories) -> (HttpState, ApiState) {
    let cache_config = CacheConfig::from(&settings.cache);
    let store = Arc::new(MemoryCacheStore::new(&cache_config));
    let cache = Arc::new(BookListCache::new(cache_config, store, repos.books.clone()));

    let hooks = Arc::new(MutationHooks::new());
    hooks.register(cache.clone());
    info!(listeners = hooks.listener_count(), "Mutation hooks ready");

    let books = Arc::new(BookService::new(
        repos.books.clone(),
        repos.books_write,
        hooks,
    ));
    let catalog = Arc::new(CatalogService::new(
        repos.books,
        repos.settings.clone(),
        cache.clone(),
    ));
    let settings_service = Arc::new(SettingsService::new(repos.settings));

    let tokens = Arc::new(ApiTokens::from_settings(&settings.api));
    if tokens.is_empty() {
        warn!(
            target = "bookshelf::startup",
            "no API tokens configured; every admin API request will be rejected"
        );
    }

    let http_state = HttpState {
        catalog: catalog.clone(),
    };
    let api_state = ApiState {
        tokens,
        books,
        cache,
        settings: settings_service,
        catalog,
        db: repos.db,
    };
    (http_state, api_state)
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repos = init_repositories(&settings).await?;
    let (http_state, api_state) = build_states(&settings, repos);
    serve_http(&settings, http_state, api_state).await
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    api_state: ApiState,
) -> Result<(), AppError> {
    let public_router = http::build_public_router(http_state);
    let api_router = http::build_api_router(api_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "bookshelf::startup",
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        "Listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(wait_for(shutdown_rx.clone()))
        .into_future();
    let admin_server = axum::serve(admin_listener, api_router.into_make_service())
        .with_graceful_shutdown(wait_for(shutdown_rx))
        .into_future();

    let grace = settings.server.graceful_shutdown;
    let servers = async move { try_join!(public_server, admin_server) };
    tokio::pin!(servers);

    tokio::select! {
        result = &mut servers => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|err| AppError::from(InfraError::from(err)))?;
            info!(target = "bookshelf::shutdown", "Shutdown requested; draining connections");
            let _ = shutdown_tx.send(true);
        }
    }

    match tokio::time::timeout(grace, servers).await {
        Ok(result) => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        Err(_) => warn!(
            target = "bookshelf::shutdown",
            grace_seconds = grace.as_secs(),
            "Graceful shutdown timed out; dropping open connections"
        ),
    }
    Ok(())
}

async fn wait_for(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
