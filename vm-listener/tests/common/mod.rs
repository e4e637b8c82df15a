// vm-listener/tests/common/mod.rs
// 测试用的脚本化协作方
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{
    FilterUpdate, ObjectRef, ObjectUpdate, PropertyChange, PropertyValue, UpdateBatch, UpdateKind,
    UpdateVersion, VirtualDevice, VmConfigSummary, VolumePath, WatchFilter,
};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vm_listener::{CollectorError, PropertyCollector, StatusError, VmInventory, VolumeStatusStore};

pub type Scripted = Result<Option<UpdateBatch>, CollectorError>;

/// 按脚本返回轮询结果；脚本耗尽后取消 `drained` 并永久挂起，
/// idle 模式下则像服务端等待超时一样持续返回 `Ok(None)`
pub struct ScriptedCollector {
    script: Mutex<VecDeque<Scripted>>,
    polls: Mutex<Vec<UpdateVersion>>,
    created: Mutex<Vec<(WatchFilter, bool)>>,
    destroyed: Mutex<Vec<ObjectRef>>,
    create_error: Mutex<Option<CollectorError>>,
    drained: CancellationToken,
    idle: bool,
}

impl ScriptedCollector {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            polls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            destroyed: Mutex::new(Vec::new()),
            create_error: Mutex::new(None),
            drained: CancellationToken::new(),
            idle: false,
        }
    }

    /// 没有变更的会话：每次轮询稍等后返回 `Ok(None)`
    pub fn idle() -> Self {
        Self {
            idle: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn failing_registration(error: CollectorError) -> Self {
        let collector = Self::new(Vec::new());
        *collector.create_error.lock() = Some(error);
        collector
    }

    pub fn drained(&self) -> CancellationToken {
        self.drained.clone()
    }

    pub fn polls(&self) -> Vec<String> {
        self.polls.lock().iter().map(|v| v.as_str().to_string()).collect()
    }

    pub fn created(&self) -> Vec<(WatchFilter, bool)> {
        self.created.lock().clone()
    }

    pub fn destroyed(&self) -> Vec<ObjectRef> {
        self.destroyed.lock().clone()
    }
}

#[async_trait]
impl PropertyCollector for ScriptedCollector {
    async fn create_filter(
        &self,
        filter: &WatchFilter,
        partial_updates: bool,
    ) -> Result<ObjectRef, CollectorError> {
        if let Some(err) = self.create_error.lock().take() {
            return Err(err);
        }
        self.created.lock().push((filter.clone(), partial_updates));
        Ok(ObjectRef::new("PropertyFilter", "session[52b1]5201"))
    }

    async fn destroy_filter(&self, filter: &ObjectRef) -> Result<(), CollectorError> {
        self.destroyed.lock().push(filter.clone());
        Ok(())
    }

    async fn wait_for_updates(
        &self,
        version: &UpdateVersion,
    ) -> Result<Option<UpdateBatch>, CollectorError> {
        self.polls.lock().push(version.clone());
        let next = self.script.lock().pop_front();
        match next {
            Some(result) => result,
            None if self.idle => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(None)
            }
            None => {
                self.drained.cancel();
                std::future::pending().await
            }
        }
    }
}

/// 内存中的虚拟机清单；未登记的虚拟机返回 NotFound
#[derive(Default)]
pub struct FakeInventory {
    vms: HashMap<ObjectRef, VmConfigSummary>,
    lookups: Mutex<Vec<ObjectRef>>,
}

impl FakeInventory {
    pub fn with_vm(mut self, vm: ObjectRef, config: VmConfigSummary) -> Self {
        self.vms.insert(vm, config);
        self
    }

    pub fn lookups(&self) -> Vec<ObjectRef> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl VmInventory for FakeInventory {
    async fn vm_config(&self, vm: &ObjectRef) -> Result<VmConfigSummary, CollectorError> {
        self.lookups.lock().push(vm.clone());
        self.vms
            .get(vm)
            .cloned()
            .ok_or_else(|| CollectorError::NotFound(vm.to_string()))
    }
}

/// 记录 detach 调用；可指定一个失败的卷
#[derive(Default)]
pub struct RecordingStore {
    detached: Mutex<Vec<VolumePath>>,
    fail_on: Option<VolumePath>,
}

impl RecordingStore {
    pub fn failing_on(path: &str) -> Self {
        Self {
            detached: Mutex::new(Vec::new()),
            fail_on: Some(VolumePath::new(path)),
        }
    }

    pub fn detached(&self) -> Vec<String> {
        self.detached.lock().iter().map(|p| p.to_string()).collect()
    }
}

#[async_trait]
impl VolumeStatusStore for RecordingStore {
    async fn set_detached(&self, path: &VolumePath) -> Result<(), StatusError> {
        if self.fail_on.as_ref() == Some(path) {
            return Err(StatusError::Unavailable("kv sidecar locked".to_string()));
        }
        self.detached.lock().push(path.clone());
        Ok(())
    }
}

// ========== 数据构造 ==========

pub fn vm(id: &str) -> ObjectRef {
    ObjectRef::new("VirtualMachine", id)
}

pub fn disk(key: i32, file: &str) -> VirtualDevice {
    VirtualDevice {
        key,
        type_name: "VirtualDisk".to_string(),
        label: Some(format!("Hard disk {}", key - 1999)),
        backing_file: Some(file.to_string()),
    }
}

pub fn nic(key: i32) -> VirtualDevice {
    VirtualDevice {
        key,
        type_name: "VirtualVmxnet3".to_string(),
        label: Some("Network adapter 1".to_string()),
        backing_file: None,
    }
}

pub fn vm_config(name: &str, devices: Vec<VirtualDevice>) -> VmConfigSummary {
    VmConfigSummary {
        name: name.to_string(),
        devices,
    }
}

pub fn power_change(value: &str) -> PropertyChange {
    PropertyChange::assign("runtime.powerState", PropertyValue::Text(value.to_string()))
}

pub fn object(kind: UpdateKind, obj: Option<ObjectRef>, changes: Vec<PropertyChange>) -> ObjectUpdate {
    ObjectUpdate { kind, obj, changes }
}

pub fn batch(version: &str, objects: Vec<ObjectUpdate>) -> UpdateBatch {
    UpdateBatch {
        version: version.into(),
        filters: vec![FilterUpdate {
            filter: Some(ObjectRef::new("PropertyFilter", "session[52b1]5201")),
            objects,
        }],
    }
}

/// 单个虚拟机关机的批次
pub fn power_off(version: &str, id: &str) -> Scripted {
    Ok(Some(batch(
        version,
        vec![object(UpdateKind::Modify, Some(vm(id)), vec![power_change("poweredOff")])],
    )))
}

/// 轮询条件直到满足或超时
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
