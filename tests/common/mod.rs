// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helper utilities for Docker-based integration tests.

use std::sync::OnceLock;

/// Cached result of Docker availability check.
#[allow(dead_code)]
static DOCKER_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Checks if Docker is available on the system.
///
/// This check is cached after the first call.
#[allow(dead_code)]
pub fn is_docker_available() -> bool {
    *DOCKER_AVAILABLE.get_or_init(|| {
        std::process::Command::new("docker")
            .args(["ps"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    })
}

/// Prints a warning that a test is skipped because Docker is unavailable.
#[allow(dead_code)]
pub fn print_docker_unavailable_warning(test_name: &str) {
    eprintln!("\nSKIPPED: {} - Docker is not available", test_name);
    eprintln!("   To run this test, ensure Docker is installed and running.\n");
}

/// A running Redis container and the URL to reach it.
#[cfg(feature = "redis")]
#[allow(dead_code)]
pub struct RedisFixture {
    /// Keeps the container alive for the duration of the test
    pub container: testcontainers::ContainerAsync<testcontainers::GenericImage>,
    /// Connection URL, e.g. `redis://127.0.0.1:49153`
    pub url: String,
}

/// Starts a Redis container, or returns `None` when Docker is unavailable.
#[cfg(feature = "redis")]
#[allow(dead_code)]
pub async fn start_redis(test_name: &str) -> Option<RedisFixture> {
    use testcontainers::{core::WaitFor, runners::AsyncRunner, GenericImage, ImageExt};

    if !is_docker_available() {
        print_docker_unavailable_warning(test_name);
        return None;
    }

    let container = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379.into())
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
        .start()
        .await
        .ok()?;
    let port = container.get_host_port_ipv4(6379).await.ok()?;

    Some(RedisFixture {
        container,
        url: format!("redis://127.0.0.1:{}", port),
    })
}

/// Writes `pairs` as plain string keys.
#[cfg(feature = "redis")]
#[allow(dead_code)]
pub async fn seed_strings(url: &str, pairs: &[(&str, &str)]) {
    let client = redis::Client::open(url).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    for (key, value) in pairs {
        let _: () = redis::cmd("SET")
            .arg(*key)
            .arg(*value)
            .query_async(&mut conn)
            .await
            .unwrap();
    }
}

/// Writes `pairs` as fields of the hash `hash`.
#[cfg(feature = "redis")]
#[allow(dead_code)]
pub async fn seed_hash(url: &str, hash: &str, pairs: &[(&str, &str)]) {
    let client = redis::Client::open(url).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    for (field, value) in pairs {
        let _: () = redis::cmd("HSET")
            .arg(hash)
            .arg(*field)
            .arg(*value)
            .query_async(&mut conn)
            .await
            .unwrap();
    }
}
