// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the etcd parameter store using Docker containers.

mod common;

#[cfg(feature = "etcd")]
mod etcd_tests {
    use lazycfg::adapters::{EtcdParameterStore, MapEnvironment};
    use lazycfg::domain::{ConfigurationShape, Field, ParameterNamespace, ScalarValue};
    use lazycfg::ports::ParameterStore;
    use lazycfg::service::ConfigurationFactory;
    use testcontainers::{core::WaitFor, runners::AsyncRunner, GenericImage, ImageExt};

    use crate::common as docker_helpers;

    /// Starts etcd, seeds a few parameters under `params`, and returns its endpoint.
    async fn setup_etcd_test(
        test_name: &str,
    ) -> Option<(testcontainers::ContainerAsync<GenericImage>, String)> {
        if !docker_helpers::is_docker_available() {
            docker_helpers::print_docker_unavailable_warning(test_name);
            return None;
        }

        let etcd_image = GenericImage::new("quay.io/coreos/etcd", "v3.5.0")
            .with_exposed_port(2379.into())
            .with_wait_for(WaitFor::message_on_stderr("ready to serve client requests"))
            .with_env_var("ETCD_ADVERTISE_CLIENT_URLS", "http://0.0.0.0:2379")
            .with_env_var("ETCD_LISTEN_CLIENT_URLS", "http://0.0.0.0:2379");

        let container = etcd_image.start().await.ok()?;
        let port = container.get_host_port_ipv4(2379).await.ok()?;
        let endpoint = format!("127.0.0.1:{}", port);

        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        let mut client = etcd_client::Client::connect([&endpoint], None).await.ok()?;
        client.put("params/billing/prod/API_KEY", "k-123", None).await.ok()?;
        client.put("params/billing/prod/RETRIES", "3", None).await.ok()?;
        client.put("params/billing/prod/EMPTY", "", None).await.ok()?;

        Some((container, endpoint))
    }

    #[tokio::test]
    async fn test_etcd_batch_lookup() {
        let Some((_container, endpoint)) = setup_etcd_test("test_etcd_batch_lookup").await else {
            return;
        };
        let store = EtcdParameterStore::new(vec![endpoint], Some("params")).await.unwrap();

        let names = vec![
            "/billing/prod/API_KEY".to_string(),
            "/billing/prod/NOPE".to_string(),
            "/billing/prod/RETRIES".to_string(),
        ];
        let found = store.get_parameters(&names).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "/billing/prod/API_KEY");
        assert_eq!(found[0].value.as_deref(), Some("k-123"));
        assert_eq!(found[1].value.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_etcd_batch_spans_transactions() {
        let Some((_container, endpoint)) =
            setup_etcd_test("test_etcd_batch_spans_transactions").await
        else {
            return;
        };
        let store = EtcdParameterStore::new(vec![endpoint], Some("params"))
            .await
            .unwrap()
            .with_max_txn_ops(1);

        let names = vec![
            "/billing/prod/API_KEY".to_string(),
            "/billing/prod/RETRIES".to_string(),
            "/billing/prod/EMPTY".to_string(),
        ];
        let found = store.get_parameters(&names).await.unwrap();

        assert_eq!(found.len(), 3);
        assert_eq!(found[2].value.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_etcd_backed_factory() {
        let Some((_container, endpoint)) = setup_etcd_test("test_etcd_backed_factory").await else {
            return;
        };
        let store = EtcdParameterStore::new(vec![endpoint], Some("params")).await.unwrap();

        let factory = ConfigurationFactory::builder()
            .shape(
                ConfigurationShape::new()
                    .field("api_key", Field::<String>::remote("API_KEY"))
                    .field("retries", Field::<f64>::remote("RETRIES"))
                    .field("note", Field::<String>::remote("EMPTY").or_default("unset")),
            )
            .environment(MapEnvironment::new())
            .store(store)
            .namespace(ParameterNamespace::new().system("billing").env_type("prod"))
            .build()
            .unwrap();

        let config = factory.get_configuration().await.unwrap();
        assert_eq!(config.get("api_key"), Some(&ScalarValue::String("k-123".into())));
        assert_eq!(config.get("retries"), Some(&ScalarValue::Number(3.0)));
        // An empty remote value is still a value
        assert_eq!(config.get("note"), Some(&ScalarValue::String(String::new())));
    }
}
