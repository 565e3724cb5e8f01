mod db;
mod model;
mod services;
pub mod utils;

use dotenv::dotenv;
use std::sync::Arc;
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::broadcast;
use db::AccountStore;
use db::memory::MemoryStore;
use db::mongo::MongoStore;
use model::policy::ActivePolicy;
use utils::health;
use utils::context::ServiceContext;
use utils::config::{self, Configuration};
use utils::errors::{ErrorCode, WardenError};
use grpc::warden::warden_server::WardenServer;
use grpc::admin::admin_server::AdminServer;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

///
/// These are the generated gRPC/protobuf modules which give us access to the message structures,
/// services, servers and clients to talk to our APIs. The services are implemented in services/mod.rs
///
pub mod grpc {
    pub mod common {
        tonic::include_proto!("grpc.common");
    }

    pub mod warden {
        tonic::include_proto!("grpc.warden");
    }

    pub mod admin {
        tonic::include_proto!("grpc.admin");
    }
}

const APP_NAME: &str = "Warden";

///
/// Entry point to start the app.
///
pub async fn lib_main() -> Result<(), WardenError> {

    // Load any local dev settings as environment variables from a .env file.
    dotenv().ok();

    // Default log level to INFO if it's not specified.
    config::default_env("RUST_LOG", "INFO");

    // SIGINT/ctrl+c handling for graceful shutdown - both listeners subscribe.
    let (signal_tx, _) = broadcast::channel::<()>(1);
    let _signal = tokio::spawn(wait_for_signal(signal_tx.clone()));

    // Load the service configuration into struct and initialise any lazy statics.
    let config = Configuration::from_env().expect("The service configuration is not correct");

    init_tracing();

    tracing::info!("{}\n{}", BANNER, config.fmt_console()?);

    // Connect the configured storage backend and bring its schema up to date.
    let store = init_store(&config).await?;
    store.ensure_schema().await?;

    // Load the active security policy from the store.
    let (policy, activated_on) = store.load_active_policy().await?;

    // Create any consumer topics we need to listen to.
    #[cfg(feature = "kafka")]
    utils::kafka::create_topics(&config).await;

    // The service context allows any gRPC service access to shared stuff (store, policy, clock, etc.).
    let ctx = Arc::new(ServiceContext::new(
        config.clone(),
        store,
        ActivePolicy { policy, activated_on }));

    #[cfg(feature = "kafka")]
    start_and_wait_for_consumer(ctx.clone()).await;

    let (_health_reporter, health_service) = health::start(ctx.clone()).await;

    let address = parse_addr(&config.address)?;
    let admin_address = parse_addr(&config.admin_address)?;

    // TLS on the public listener when a cert and key are configured.
    let mut public_server = Server::builder();
    match (&config.tls_cert, &config.tls_key) {
        (Some(cert), Some(key)) => {
            let identity = init_tls(cert, key).await?;
            public_server = public_server.tls_config(ServerTlsConfig::new().identity(identity))?;
            tracing::info!("{} listening on {} and using tls", APP_NAME, address);
        },
        _ => tracing::info!("{} listening on {}", APP_NAME, address),
    }

    let mut public_shutdown = signal_tx.subscribe();
    let public_server = public_server
        .add_service(WardenServer::new(ctx.clone()))
        .add_service(health_service)
        .serve_with_shutdown(address, async move {
            let _ = public_shutdown.recv().await;
            tracing::info!("Graceful shutdown");
        });

    // The admin service gets its own listener so the emergency paths are only
    // reachable from the trusted (loopback) side.
    tracing::info!("Admin endpoint listening on {}", admin_address);

    let mut admin_shutdown = signal_tx.subscribe();
    let admin_server = Server::builder()
        .add_service(AdminServer::new(ctx.clone()))
        .serve_with_shutdown(admin_address, async move {
            let _ = admin_shutdown.recv().await;
        });

    tokio::try_join!(public_server, admin_server)?;

    Ok(())
}

///
/// Sends a shutdown signal to both listeners when a SIGINT is received (Ctrl+C).
///
async fn wait_for_signal(tx: broadcast::Sender<()>) {
    let _ = signal::ctrl_c().await;
    tracing::info!("SIGINT received: shutting down");
    let _ = tx.send(());
}

fn parse_addr(address: &str) -> Result<SocketAddr, WardenError> {
    address.parse()
        .map_err(|err| ErrorCode::TonicStartError.with_msg(&format!("Invalid listen address {}: {}", address, err)))
}

///
/// Connect whichever storage backend the configuration selects.
///
async fn init_store(config: &Configuration) -> Result<Arc<dyn AccountStore>, WardenError> {
    match config.storage.as_str() {
        "memory" => {
            tracing::warn!("Using the in-process memory store - state will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        },
        _ => Ok(Arc::new(MongoStore::connect(APP_NAME, config).await?)),
    }
}

///
/// Bind to the server-side key and certificate.
///
async fn init_tls(cert: &str, key: &str) -> Result<Identity, WardenError> {

    tracing::info!("Initialising TLS config");

    let cert = tokio::fs::read(cert)
        .await
        .map_err(|e| ErrorCode::IOError.with_msg(&format!("Failed to open pem: {}", e)))?;

    let key = tokio::fs::read(key)
        .await
        .map_err(|e| ErrorCode::IOError.with_msg(&format!("Failed to open key: {}", e)))?;

    Ok(Identity::from_pem(cert, key))
}

///
/// Connect a Kafka consumer and wait for it to be ready to receive messages.
///
#[cfg(feature = "kafka")]
async fn start_and_wait_for_consumer(ctx: Arc<ServiceContext>) {
    let (tx, mut rx) = tokio::sync::mpsc::channel(1);

    // Spawn a consumer to monitor the active policy changes from other instances.
    tokio::spawn(async move {
        utils::kafka::consumer::init_consumer(ctx, tx).await
    });

    // Wait until the consumer has sent us a signal that it's ready.
    if tokio::time::timeout(std::time::Duration::from_secs(10), rx.recv()).await.is_err() {
        panic!("Timeout waiting for the kafka consumer to signal it was ready.");
    }
}

///
/// Set the tracing level to match the RUST_LOG env variable.
///
fn init_tracing() {
    if let Err(err) = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
        .try_init() {
            tracing::info!("Tracing already initialised: {}", err); // Allowed error here - tests call this fn repeatedly.
    }
}

const BANNER: &str = r#"
__        __            _
\ \      / /_ _ _ __ __| | ___ _ __
 \ \ /\ / / _` | '__/ _` |/ _ \ '_ \
  \ V  V / (_| | | | (_| |  __/ | | |
   \_/\_/ \__,_|_|  \__,_|\___|_| |_|
"#;
