pub mod consumer;
pub mod producer;

use rdkafka::ClientConfig;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use crate::utils::config::Configuration;

///
/// Pre-create the topics we consume - auto-creation on subscribe can't be
/// relied upon, so use an admin client before the consumer starts.
///
pub async fn create_topics(config: &Configuration) {
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", &config.kafka_servers)
        .create()
        .expect("Admin client creation failed");

    let topics: Vec<NewTopic> = consumer::CONSUMER_TOPICS
        .iter()
        .map(|topic| NewTopic::new(topic, 1, TopicReplication::Fixed(1)))
        .collect();

    if let Err(err) = admin.create_topics(&topics, &AdminOptions::new()).await {
        tracing::warn!("Unable to pre-create consumer topics: {}", err);
    }
}
