use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use crypto_core::jwt;
use db_pool::{create_pool, DbConfig};
use instaclone_service::handlers;
use instaclone_service::openapi::{api_doc, write_openapi_file};
use instaclone_service::services::EmailService;
use instaclone_service::{AppState, Config};
use redis_utils::RedisPool;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa_swagger_ui::SwaggerUi;

const SERVICE_NAME: &str = "instaclone-service";

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    tracing::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // Container healthcheck: `instaclone-service healthcheck`
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        let port = std::env::var("APP_PORT").unwrap_or_else(|_| "8000".to_string());
        let url = format!("http://127.0.0.1:{port}/health");
        return match reqwest::Client::new().get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => {
                eprintln!("healthcheck HTTP status: {}", resp.status());
                Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
            }
            Err(e) => {
                eprintln!("healthcheck HTTP error: {}", e);
                Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
            }
        };
    }

    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    jwt::initialize_jwt_keys(
        &config.jwt.secret_key,
        config.app.jwt_issuer(),
        &config.app.jwt_audience(),
    )
    .map_err(|e| startup_error("Failed to initialize JWT keys", e))?;

    let db_cfg = DbConfig::from_env(SERVICE_NAME)
        .map_err(|e| startup_error("Invalid database configuration", e))?;
    db_cfg.log_config();
    let db_pool = create_pool(db_cfg)
        .await
        .map_err(|e| startup_error("Database pool creation failed", e))?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| startup_error("Database migrations failed", e))?;
    tracing::info!("Database migrations applied");

    let redis_pool = RedisPool::connect(&config.redis.url)
        .await
        .map_err(|e| startup_error("Failed to initialize Redis connection", e))?;

    let email = EmailService::new(&config)
        .map_err(|e| startup_error("Failed to configure email service", e))?;

    let openapi = api_doc(&config);
    if let Err(e) = write_openapi_file(&config.app.openapi_file_path, &openapi) {
        tracing::warn!("Could not export OpenAPI document: {:#}", e);
    }

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let api_prefix = config.app.api_v1_str.clone();
    let allowed_origins = config.cors.allowed_origins.clone();
    let state = web::Data::new(AppState::new(db_pool, redis_pool.manager(), config, email));

    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &allowed_origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url(format!("{}/openapi.json", api_prefix), openapi.clone()),
            )
            .configure(handlers::configure_root)
            .service(web::scope(&api_prefix).configure(handlers::configure))
    })
    .bind(&bind_address)?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            return match result {
                Ok(result) => result,
                Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
            };
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    match server_task.await {
        Ok(result) => result?,
        Err(e) => tracing::error!("HTTP server task failed: {}", e),
    }

    tracing::info!("{} shut down", SERVICE_NAME);
    Ok(())
}
