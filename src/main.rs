use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tenderscope::{
    AppState, auth,
    config::{AppConfig, Env},
    create_router,
    models::NewUser,
    repository::{PostgresRepository, RepositoryState},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point for the application, responsible for
/// initializing all core components: configuration, logging, database,
/// migrations, and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & environment loading (fail-fast).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter setup. RUST_LOG wins; otherwise sensible defaults
    // for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tenderscope=debug,tower_http=info,axum=trace".into());

    // 3. Log format selected by environment: pretty for humans locally,
    // JSON for log aggregators in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database initialization (Postgres connection pool).
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Apply schema migrations before serving traffic. The migration set
    // carries the uniqueness and cascade constraints the moderation
    // lifecycle depends on.
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to run database migrations.");

    // Instantiate the repository, wrapped in an Arc for thread-safe sharing.
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Bootstrap administrator account, when configured.
    ensure_admin_account(&repo, &config).await;

    // 6. Unified state assembly.
    let app_state = AppState { repo, config };

    // 7. Router and server startup.
    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}

/// ensure_admin_account
///
/// Creates the administrator account named by ADMIN_EMAIL/ADMIN_PASSWORD when
/// no account exists for that email yet. A failure here is logged but does
/// not abort startup; the rest of the application works without it.
async fn ensure_admin_account(repo: &RepositoryState, config: &AppConfig) {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return;
    };

    match repo.get_user_by_email(email).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let password_hash = match auth::hash_password(password) {
                Ok(hash) => hash,
                Err(e) => {
                    tracing::error!("admin bootstrap hashing failed: {}", e);
                    return;
                }
            };
            let new_user = NewUser {
                name: "Administrator".to_string(),
                email: email.clone(),
                password_hash,
                is_admin: true,
            };
            match repo.create_user(new_user).await {
                Ok(user) => tracing::info!("bootstrap admin account created: {}", user.email),
                Err(e) => tracing::error!("admin bootstrap insert failed: {:?}", e),
            }
        }
        Err(e) => tracing::error!("admin bootstrap lookup failed: {:?}", e),
    }
}
