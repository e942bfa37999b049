//! Configuration file to running facade to shutdown

use std::sync::Arc;

use dfs_facade::fs::{ClientOp, CountingClient, DfsClient, MemoryClient};
use dfs_facade::{FacadeConfig, FacadeLifecycle, LifecycleError, SchemeConnector};
use tempfile::TempDir;

#[test]
fn test_start_from_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("dfs-facade/config.json");
    std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    std::fs::write(
        &config_path,
        r#"{
            "enabled": true,
            "server_address": "mem://cluster",
            "namespace": "/warehouse",
            "username": "etl"
        }"#,
    )
    .unwrap();

    let config = FacadeConfig::load_from_file(&config_path).unwrap();
    assert_eq!(config.replication, 3);

    let lifecycle = FacadeLifecycle::start(&config, &SchemeConnector).unwrap();
    let facade = lifecycle.facade().unwrap();
    assert_eq!(facade.scheme(), "mem");
    assert_eq!(facade.working_directory(), "/warehouse");
    assert_eq!(facade.home_directory(), "/user/etl");

    assert!(facade.mkdirs("raw").unwrap());
    assert!(facade.exist("/warehouse/raw").unwrap());
}

#[test]
fn test_local_address_serves_a_directory() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("srv")).unwrap();
    std::fs::write(root.path().join("srv/hello.txt"), b"hello").unwrap();

    let mut config = FacadeConfig::for_address(format!("file://{}", root.path().display()));
    config.namespace = "/srv".to_string();

    let lifecycle = FacadeLifecycle::start(&config, &SchemeConnector).unwrap();
    let facade = lifecycle.facade().unwrap();
    assert_eq!(facade.scheme(), "file");
    assert!(facade.exist("hello.txt").unwrap());
    assert_eq!(facade.list_status(".").unwrap()[0].path, "/srv/hello.txt");
}

#[test]
fn test_disabled_and_invalid_configs() {
    let lifecycle = FacadeLifecycle::start(&FacadeConfig::default(), &SchemeConnector).unwrap();
    assert!(!lifecycle.is_enabled());
    assert!(lifecycle.facade().is_none());

    let mut config = FacadeConfig::for_address("mem://x");
    config.namespace = "warehouse".to_string();
    assert!(matches!(
        FacadeLifecycle::start(&config, &SchemeConnector),
        Err(LifecycleError::Config(_))
    ));

    assert!(matches!(
        FacadeLifecycle::start(&FacadeConfig::for_address("s3://bucket"), &SchemeConnector),
        Err(LifecycleError::UnsupportedScheme { .. })
    ));
}

#[test]
fn test_shutdown_runs_delete_on_exit_once() {
    let memory = Arc::new(MemoryClient::new());
    let counting = Arc::new(CountingClient::new(memory.clone()));
    let connector = {
        let counting = counting.clone();
        move |_: &FacadeConfig| -> Result<Arc<dyn DfsClient>, LifecycleError> {
            Ok(counting.clone() as Arc<dyn DfsClient>)
        }
    };

    let lifecycle =
        FacadeLifecycle::start(&FacadeConfig::for_address("mem://x"), &connector).unwrap();
    let facade = Arc::clone(lifecycle.facade().unwrap());
    assert!(facade.create_new_file("/tmp/lock").unwrap());
    assert!(facade.delete_on_exit("/tmp/lock").unwrap());

    lifecycle.shutdown();
    assert!(lifecycle.is_shut_down());
    assert!(lifecycle.facade().is_none());
    assert!(!memory.exists("/tmp/lock").unwrap());

    drop(lifecycle);
    assert_eq!(counting.metrics().calls(ClientOp::Close), 1);
}
