use std::sync::Arc;
use std::time::Duration;
use super::context::ServiceContext;
use tonic_health::server::HealthReporter;
use tonic_health::pb::health_server::{Health, HealthServer};

const LIVELINESS: &str = "LIVELINESS";
const READINESS:  &str = "READINESS";

const PULSE: u64 = 4000;

///
/// Create liveliness and readiness services to respond to health probes.
///
/// If storage becomes un-contactable, readiness flips to NOT_SERVING until it
/// recovers.
///
pub async fn start(ctx: Arc<ServiceContext>) -> (HealthReporter, HealthServer<impl Health>) {
    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter.set_service_status(LIVELINESS, tonic_health::ServingStatus::Serving).await;
    health_reporter.set_service_status(READINESS, tonic_health::ServingStatus::Serving).await;

    tokio::spawn(monitor(ctx, health_reporter.clone()));
    tracing::info!("Health probe enabled for services {} and {}", LIVELINESS, READINESS);
    (health_reporter, health_service)
}

pub async fn shutdown(mut health_reporter: HealthReporter) {
    health_reporter.set_service_status(LIVELINESS, tonic_health::ServingStatus::NotServing).await;
    health_reporter.set_service_status(READINESS, tonic_health::ServingStatus::NotServing).await;
}

///
/// Ping the store on each pulse and flip our readiness if it stops answering.
///
async fn monitor(ctx: Arc<ServiceContext>, mut reporter: HealthReporter) {
    let mut healthy = true;

    loop {
        tokio::time::sleep(Duration::from_millis(PULSE)).await;

        let now_healthy = match ctx.store().ping().await {
            Ok(()) => true,
            Err(err) => {
                tracing::trace!("Storage ping failed: {:?}", err);
                false
            },
        };

        if now_healthy != healthy {
            if now_healthy {
                tracing::info!("Service healthy (storage contactable again)");
                reporter.set_service_status(READINESS, tonic_health::ServingStatus::Serving).await;
            } else {
                tracing::error!("Service NOT healthy (storage un-contactable)");
                reporter.set_service_status(READINESS, tonic_health::ServingStatus::NotServing).await;
            }
        }

        healthy = now_healthy;
    }
}
