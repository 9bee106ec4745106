use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use fabula_api::cache::MembershipCache;
use fabula_api::handlers;
use fabula_api::middleware::JwtAuth;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health_summary(pool: web::Data<sqlx::PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "fabula-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "fabula-api"
        })),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match fabula_api::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {e}");
            eprintln!("ERROR: Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting fabula-api v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // This service both issues and validates tokens, so the full key pair is
    // required up front
    if let Err(e) = crypto_core::jwt::initialize_from_env() {
        tracing::error!("JWT key initialization failed: {e}");
        eprintln!("ERROR: Failed to initialize JWT keys: {e}");
        std::process::exit(1);
    }

    let mut db_cfg = DbPoolConfig::from_env().unwrap_or_default();
    if db_cfg.database_url.is_empty() {
        db_cfg.database_url = config.database.url.clone();
    }
    if db_cfg.max_connections < config.database.max_connections {
        db_cfg.max_connections = config.database.max_connections;
    }

    db_cfg.log_config();
    let db_pool = match create_pg_pool(db_cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {e}");
            eprintln!("ERROR: Failed to create database pool: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
        tracing::error!("Database migration failed: {e}");
        eprintln!("ERROR: Failed to run migrations: {e}");
        std::process::exit(1);
    }
    tracing::info!("Database migrations applied");

    // Redis is optional: the membership cache degrades to plain DB checks
    let membership_cache = MembershipCache::connect(&config.cache.url).await;

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let db_pool_data = web::Data::new(db_pool);
    let cache_data = web::Data::new(membership_cache);

    let cors_origins = config.cors.allowed_origins.clone();

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(db_pool_data.clone())
            .app_data(cache_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/api/v1/health", web::get().to(health_summary))
            .service(
                web::scope("/api/v1/auth")
                    .route("/register", web::post().to(handlers::auth::register))
                    .route("/login", web::post().to(handlers::auth::login))
                    .route("/refresh", web::post().to(handlers::auth::refresh)),
            )
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuth)
                    .configure(handlers::configure_protected),
            )
    })
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            match result {
                Ok(run_result) => run_result?,
                Err(e) => tracing::error!("Server task failed: {e}"),
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            if let Ok(run_result) = server_task.await {
                run_result?;
            }
        }
    }

    tracing::info!("fabula-api shutting down");
    Ok(())
}
