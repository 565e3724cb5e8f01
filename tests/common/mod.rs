#![allow(dead_code)] // Each test binary uses its own slice of the harness.

pub mod helper;

use lazy_static::lazy_static;
use tonic::transport::Channel;
use tokio_retry::{Retry, strategy::FixedInterval};
use std::{collections::HashMap, thread::JoinHandle};
use parking_lot::{Mutex, MutexGuard};
use warden::grpc::admin::admin_client::AdminClient;
use warden::grpc::warden::warden_client::WardenClient;

lazy_static! {
    // A mutex around the TestContext to ensure only one test can be using the service at a time.
    // This ensures tests do not corrupt the configuration, data or clock used by any other test.
    static ref TEST_MUTEX: Mutex<TestContext> = Mutex::new(TestContext::default());

    // An async runtime needed to run the service being tested in. This ensures when a test terminates,
    // the service is still running and available for another test.
    static ref RT: tokio::runtime::Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .enable_io()
        .build()
        .unwrap();
}

///
/// Tests should start by calling start_warden to obtain a lock on the TestContext.
///
/// This will give them gRPC clients for the public and admin APIs of a running
/// warden server.
///
pub struct TestContext {
    config: TestConfig,
    handle: Option<JoinHandle<()>>,
    client: Option<WardenClient<Channel>>,
    admin: Option<AdminClient<Channel>>,
}

impl TestContext {
    pub fn client(&mut self) -> &mut WardenClient<Channel> {
        self.client.as_mut().expect("Someone asked for a test client when there wasn't one")
    }

    pub fn admin(&mut self) -> &mut AdminClient<Channel> {
        self.admin.as_mut().expect("Someone asked for a test admin client when there wasn't one")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self {
            handle: None,
            client: None,
            admin: None,
            config: TestConfig { map: HashMap::new() },
        }
    }
}

#[derive(PartialEq)]
pub struct TestConfig {
    map: HashMap<&'static str, String>
}

impl TestConfig {
    ///
    /// Each test binary runs its own server instance - give it its own ports.
    ///
    /// The memory storage backend means the suites need no external services
    /// and every binary starts from a clean slate.
    ///
    pub fn for_suite(port: u16, admin_port: u16) -> Self {
        let mut map = HashMap::new();
        map.insert("ADDRESS", format!("127.0.0.1:{}", port));
        map.insert("ADMIN_ADDRESS", format!("127.0.0.1:{}", admin_port));
        map.insert("STORAGE", "memory".to_string());
        map.insert("DB_NAME", "Warden_Tests".to_string());

        Self { map }
    }

    ///
    /// Apply the configuration values to the local environment variables.
    ///
    fn apply(&self) {
        for entry in &self.map {
            if entry.1.is_empty() {
                std::env::remove_var(entry.0);
            } else {
                std::env::set_var(entry.0, entry.1);
            }
        }
    }

    fn get(&self, key: &str) -> &str {
        self.map.get(key).unwrap_or_else(|| panic!("No test config {}", key))
    }
}


///
/// Acquires a lock so only one test may run at a time and returns a TestContext.
///
/// Ensures the warden server is started with the specified configuration.
///
/// The returned TestContext contains gRPC clients that can be used by the test
/// to talk to the running server.
///
pub async fn start_warden(config: TestConfig) -> MutexGuard<'static, TestContext> {
    let mut lock = TEST_MUTEX.lock();

    // Apply the suite's configuration before the first start.
    if lock.config != config {
        lock.config = config;
        lock.config.apply();
    }

    // If the server is not running, start it.
    if lock.handle.is_none() {
        // Launch the application in a separate runtime instance. This ensures it will survive test thread
        // teardowns - each #[tokio::test] runs in its own runtime which is destroyed with the test.
        let handle = RT.handle();
        lock.handle = Some(std::thread::spawn(move || {
            let _ignore = handle.block_on(async {
                warden::lib_main().await
            });
        }));
    }

    // Connect a test client to the service - the closure is used in retry spawn below.
    let public = format!("http://{}", lock.config.get("ADDRESS"));
    let connect = move || {
        WardenClient::connect(public.clone())
    };

    // Try to connect for up-to 1 minute.
    let client = Retry::spawn(FixedInterval::from_millis(100).take(600), connect)
        .await
        .expect("Unable to connect test client to server under test");

    // Need to establish an admin client too.
    let admin_endpoint = format!("http://{}", lock.config.get("ADMIN_ADDRESS"));
    let connect = move || {
        AdminClient::connect(admin_endpoint.clone())
    };

    let admin_client = Retry::spawn(FixedInterval::from_millis(100).take(600), connect)
        .await
        .expect("Unable to connect admin test client to server under test");

    // Put the clients in the TestContext struct for the test to use.
    lock.client = Some(client);
    lock.admin = Some(admin_client);

    lock
}
