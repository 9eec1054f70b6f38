use emberlink::db::RegistryStorage;
use emberlink::router::{EmberlinkState, emberlink_router};
use emberlink::service::mqtt_init;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &emberlink::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        db_path = %cfg.sqlite3_db_path.display(),
        ingress_port = cfg.ingress_port,
        default_user = %cfg.default_user_id,
        "starting Emberlink web UI"
    );

    let storage = RegistryStorage::connect(&cfg.sqlite3_db_path).await?;

    // Both startup tasks must finish before the listener binds; either one
    // failing means the process is not in a servable state.
    if let Err(err) = mqtt_init::initialize(&storage, cfg).await {
        error!(error = %err, "MQTT integration initialization failed");
        std::process::exit(1);
    }

    match storage
        .ensure_user(&cfg.default_user_id, &cfg.default_user_email)
        .await
    {
        Ok(true) => info!(user_id = %cfg.default_user_id, "created default user"),
        Ok(false) => info!(user_id = %cfg.default_user_id, "default user already exists"),
        Err(err) => {
            error!(error = %err, "failed to create default user");
            std::process::exit(1);
        }
    }

    let state = EmberlinkState::new(storage, cfg.default_user_id.as_str());
    let app = emberlink_router(state);

    let addr = format!("0.0.0.0:{}", cfg.ingress_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("web UI listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
