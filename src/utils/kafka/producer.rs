use std::time::Duration;
use rdkafka::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use crate::{APP_NAME, utils::{config::Configuration, errors::WardenError}};

pub fn producer(config: &Configuration) -> FutureProducer {
    ClientConfig::new()
        .set("bootstrap.servers", config.kafka_servers.clone())
        .set("message.timeout.ms", format!("{}", config.kafka_timeout))
        .create()
        .expect("Producer creation error")
}

pub async fn send(producer: &FutureProducer, config: &Configuration, topic: &str, payload: &str, version: u8) -> Result<(), WardenError> {
    producer
        .send(
            FutureRecord::to(topic)
                .payload(payload)
                .key("EVENT_LOG") // Partition key - use for sequencing
                .headers(OwnedHeaders::new()
                    .insert(Header { key: "version", value: Some(&format!("{}", version)) })
                    .insert(Header { key: "sender", value: Some(APP_NAME) })),
            Duration::from_millis(config.kafka_timeout as u64),
        )
        .await?;
    Ok(())
}
