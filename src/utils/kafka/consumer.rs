use std::sync::Arc;
use serde_json::Value;
use rdkafka::ClientConfig;
use rdkafka::message::Message;
use rdkafka::consumer::{CommitMode, Consumer};
use rdkafka::consumer::stream_consumer::StreamConsumer;
use crate::APP_NAME;
use crate::utils::context::ServiceContext;
use crate::utils::generate_id;

/// All the topics this service needs to monitor.
pub const CONSUMER_TOPICS: [&str; 1] = ["warden.policy.activated"];

///
/// A spawned Kafka consumer loop to handle any messages on topics we're subscribed to.
///
/// Other instances of warden announce policy activations here so every
/// instance evaluates requests against the same active policy.
///
pub async fn init_consumer(ctx: Arc<ServiceContext>, ready: tokio::sync::mpsc::Sender<()>) {
    tracing::info!("Consumer starting");

    let consumer: StreamConsumer = ClientConfig::new()
        .set("group.id", format!("{}_{}", APP_NAME, generate_id()))
        .set("bootstrap.servers", &ctx.config().kafka_servers)
        .set("enable.partition.eof", "false")
        .set("session.timeout.ms", format!("{}", ctx.config().kafka_timeout + 1000))
        .set("enable.auto.commit", "true")
        .create()
        .expect("Consumer creation failed");

    consumer
        .subscribe(&CONSUMER_TOPICS)
        .expect("Can't subscribe to specified topics");

    let _ = ready.send(()).await;

    loop {
        match consumer.recv().await {
            Err(e) => {
                tracing::warn!("Kafka error: {}", e);
            },
            Ok(m) => {
                let payload = match m.payload_view::<str>() {
                    None => "",
                    Some(Ok(s)) => s,
                    Some(Err(e)) => {
                        tracing::warn!("Error while deserializing message payload: {:?}", e);
                        ""
                    }
                };

                if let Err(err) = consumer.commit_message(&m, CommitMode::Async) {
                    tracing::warn!("Unable to commit consumed message: {}", err);
                }

                if m.topic() == "warden.policy.activated" {
                    handle_policy_activated(m.topic(), payload, ctx.clone()).await;
                }
            }
        };
    }
}

///
/// If a new security policy is activated (either by us or another instance of
/// warden) then update our in-memory active policy so requests are checked
/// against it.
///
async fn handle_policy_activated(topic: &str, payload: &str, ctx: Arc<ServiceContext>) {
    if let Some(policy_id) = get_policy_id_from(topic, payload) {
        match ctx.store().load_policy(&policy_id).await {
            Ok(Some(policy)) => {
                ctx.apply_policy(policy, ctx.now());
                tracing::info!("Security policy {} activated", policy_id);
            },
            Ok(None) => tracing::warn!("Activated policy {} is not in the store", policy_id),
            Err(err) => tracing::warn!("Failed to load policy {} from the store: {:?}", policy_id, err),
        }
    }
}

///
/// Parse the message payload and get the active_policy_id field.
///
fn get_policy_id_from(topic: &str, payload: &str) -> Option<String> {
    match serde_json::from_str::<Value>(payload) {
        Ok(json) => {
            match json.get("active_policy_id") {
                Some(policy_id) => {
                    match policy_id.as_str() {
                        Some(policy_id) => return Some(policy_id.to_string()),
                        None => tracing::warn!("Message on topic {} had no valid active_policy_id {:?}", topic, policy_id),
                    }
                },
                None => tracing::warn!("Invalid message received on topic {} - no active_policy_id", topic),
            };
        },
        Err(err) => tracing::warn!("Failed to parse json payload '{}' from topic {}: {}", payload, topic, err),
    };

    None
}
