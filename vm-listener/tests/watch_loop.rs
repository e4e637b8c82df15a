// vm-listener/tests/watch_loop.rs
// 轮询循环行为测试

mod common;

use common::*;
use shared::{PropertyChange, PropertyValue, UpdateBatch, UpdateKind};
use std::sync::Arc;
use std::time::Duration;
use vm_listener::{CollectorError, VolumeDirClassifier, WatchLoop};

struct Harness {
    collector: Arc<ScriptedCollector>,
    inventory: Arc<FakeInventory>,
    store: Arc<RecordingStore>,
}

impl Harness {
    fn new(script: Vec<Scripted>, inventory: FakeInventory, store: RecordingStore) -> Self {
        Self {
            collector: Arc::new(ScriptedCollector::new(script)),
            inventory: Arc::new(inventory),
            store: Arc::new(store),
        }
    }

    fn watch(&self) -> WatchLoop {
        WatchLoop::new(
            self.collector.clone(),
            self.inventory.clone(),
            Arc::new(VolumeDirClassifier::new("dockvols")),
            self.store.clone(),
        )
    }

    /// 运行到脚本耗尽，返回最终游标
    async fn run(&self) -> String {
        let shutdown = self.collector.drained();
        let version = tokio::time::timeout(Duration::from_secs(5), self.watch().run(shutdown))
            .await
            .expect("watch loop did not stop after script was drained");
        version.as_str().to_string()
    }
}

fn worker_inventory() -> FakeInventory {
    FakeInventory::default().with_vm(
        vm("vm-1"),
        vm_config(
            "worker-1",
            vec![
                disk(2000, "[datastore1] worker-1/worker-1.vmdk"),
                disk(2001, "[datastore1] dockvols/redis-data.vmdk"),
                nic(4000),
                disk(2002, "[datastore1] dockvols/tenant1/pg-data.vmdk"),
            ],
        ),
    )
}

#[tokio::test]
async fn test_power_off_detaches_each_managed_volume_once() {
    let harness = Harness::new(
        vec![power_off("1", "vm-1")],
        worker_inventory(),
        RecordingStore::default(),
    );

    let version = harness.run().await;

    assert_eq!(
        harness.store.detached(),
        vec![
            "[datastore1] dockvols/redis-data.vmdk",
            "[datastore1] dockvols/tenant1/pg-data.vmdk"
        ]
    );
    assert_eq!(harness.inventory.lookups(), vec![vm("vm-1")]);
    assert_eq!(version, "1");
}

#[tokio::test]
async fn test_non_modify_updates_are_ignored() {
    let script = vec![
        Ok(Some(batch(
            "1",
            vec![object(UpdateKind::Enter, Some(vm("vm-1")), vec![power_change("poweredOff")])],
        ))),
        Ok(Some(batch(
            "2",
            vec![object(UpdateKind::Leave, Some(vm("vm-1")), vec![power_change("poweredOff")])],
        ))),
    ];
    let harness = Harness::new(script, worker_inventory(), RecordingStore::default());

    harness.run().await;

    assert!(harness.store.detached().is_empty());
    assert!(harness.inventory.lookups().is_empty());
}

#[tokio::test]
async fn test_other_properties_and_states_are_ignored() {
    let script = vec![Ok(Some(batch(
        "1",
        vec![
            object(UpdateKind::Modify, Some(vm("vm-1")), vec![power_change("poweredOn")]),
            object(UpdateKind::Modify, Some(vm("vm-1")), vec![power_change("suspended")]),
            object(
                UpdateKind::Modify,
                Some(vm("vm-1")),
                vec![PropertyChange::assign(
                    "config.name",
                    PropertyValue::Text("poweredOff".to_string()),
                )],
            ),
            object(
                UpdateKind::Modify,
                Some(vm("vm-1")),
                vec![PropertyChange::assign("runtime.powerState", PropertyValue::Int(0))],
            ),
        ],
    )))];
    let harness = Harness::new(script, worker_inventory(), RecordingStore::default());

    harness.run().await;

    assert!(harness.store.detached().is_empty());
    assert!(harness.inventory.lookups().is_empty());
}

#[tokio::test]
async fn test_missing_object_reference_is_skipped() {
    let script = vec![Ok(Some(batch(
        "1",
        vec![
            object(UpdateKind::Modify, None, vec![power_change("poweredOff")]),
            object(UpdateKind::Modify, Some(vm("vm-1")), vec![power_change("poweredOff")]),
        ],
    )))];
    let harness = Harness::new(script, worker_inventory(), RecordingStore::default());

    let version = harness.run().await;

    // 缺失引用的对象被跳过，同一批次中后续对象照常处理
    assert_eq!(harness.store.detached().len(), 2);
    assert_eq!(version, "1");
    assert_eq!(harness.collector.polls(), vec!["", "1"]);
}

#[tokio::test]
async fn test_processing_error_still_advances_cursor() {
    let script = vec![power_off("1", "vm-unknown"), power_off("2", "vm-1")];
    let harness = Harness::new(script, worker_inventory(), RecordingStore::default());

    let version = harness.run().await;

    assert_eq!(harness.collector.polls(), vec!["", "1", "2"]);
    assert_eq!(version, "2");
    assert_eq!(harness.store.detached().len(), 2);
    assert_eq!(harness.inventory.lookups(), vec![vm("vm-unknown"), vm("vm-1")]);
}

#[tokio::test]
async fn test_status_failure_aborts_rest_of_batch() {
    let harness = Harness::new(
        vec![power_off("1", "vm-1")],
        worker_inventory(),
        RecordingStore::failing_on("[datastore1] dockvols/redis-data.vmdk"),
    );

    let version = harness.run().await;

    assert!(harness.store.detached().is_empty());
    assert_eq!(version, "1");
}

#[tokio::test]
async fn test_cursor_is_passed_back_unchanged() {
    let script = vec![
        Ok(Some(batch("a7f3", vec![]))),
        Ok(Some(batch("a7f3-2", vec![]))),
        Ok(Some(batch("b001", vec![]))),
    ];
    let harness = Harness::new(script, FakeInventory::default(), RecordingStore::default());

    let version = harness.run().await;

    assert_eq!(harness.collector.polls(), vec!["", "a7f3", "a7f3-2", "b001"]);
    assert_eq!(version, "b001");
}

#[tokio::test]
async fn test_poll_failure_and_empty_wait_keep_cursor() {
    let script = vec![
        Ok(Some(batch("1", vec![]))),
        Err(CollectorError::Unavailable("connection reset".to_string())),
        Ok(None),
        Ok(Some(batch("2", vec![]))),
    ];
    let harness = Harness::new(script, FakeInventory::default(), RecordingStore::default());

    let version = harness.run().await;

    assert_eq!(harness.collector.polls(), vec!["", "1", "1", "1", "2"]);
    assert_eq!(version, "2");
}

#[tokio::test]
async fn test_shutdown_interrupts_poll_error_backoff() {
    let harness = Harness::new(
        vec![Err(CollectorError::Unavailable("host unreachable".to_string()))],
        FakeInventory::default(),
        RecordingStore::default(),
    );
    let shutdown = tokio_util::sync::CancellationToken::new();
    let watch = harness.watch().with_poll_error_backoff(Duration::from_secs(3600));

    let running = tokio::spawn(watch.run(shutdown.clone()));
    assert!(eventually(|| harness.collector.polls().len() == 1).await);
    shutdown.cancel();

    let version = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("backoff was not interrupted")
        .unwrap();
    assert!(version.is_initial());
    assert_eq!(harness.collector.polls().len(), 1);
}

#[tokio::test]
async fn test_process_batch_counts_detached_volumes() {
    let inventory = worker_inventory().with_vm(vm("vm-2"), vm_config("empty", Vec::new()));
    let harness = Harness::new(Vec::new(), inventory, RecordingStore::default());
    let watch = harness.watch();

    let count = watch
        .process_batch(&batch(
            "1",
            vec![
                object(UpdateKind::Modify, Some(vm("vm-1")), vec![power_change("poweredOff")]),
                object(UpdateKind::Modify, Some(vm("vm-2")), vec![power_change("poweredOff")]),
                object(UpdateKind::Modify, Some(vm("vm-2")), vec![]),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(count, 2);

    let empty = watch.process_batch(&UpdateBatch::default()).await.unwrap();
    assert_eq!(empty, 0);
}
