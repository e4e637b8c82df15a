//! 中立模型与平台 wire 类型之间的转换

use serde_json::Value;
use shared::{
    ChangeOp, FilterUpdate, ObjectRef, ObjectUpdate, PropertyChange, PropertyValue, UpdateBatch,
    UpdateKind, VirtualDevice, VmConfigSummary, WatchFilter,
};
use vim_client::types::{self as wire, ManagedObjectReference};
use vim_client::{ObjectSpec, PropertyFilterSpec, PropertySpec, SelectionSpec, TraversalSpec};

pub fn to_moref(obj: &ObjectRef) -> ManagedObjectReference {
    ManagedObjectReference::new(&obj.kind, &obj.id)
}

pub fn from_moref(moref: ManagedObjectReference) -> ObjectRef {
    ObjectRef::new(moref.type_, moref.value)
}

/// WatchFilter -> PropertyFilterSpec
///
/// 每个选择器变成一个 TraversalSpec，`then` 变成按名称引用的 SelectionSpec。
pub fn filter_spec(filter: &WatchFilter) -> PropertyFilterSpec {
    let select_set = filter
        .traversal
        .selectors
        .iter()
        .map(|selector| {
            SelectionSpec::TraversalSpec(TraversalSpec {
                name: selector.name.clone(),
                type_: selector.from_kind.clone(),
                path: selector.path.clone(),
                skip: selector.skip,
                select_set: selector.then.iter().map(SelectionSpec::named).collect(),
            })
        })
        .collect();

    PropertyFilterSpec {
        prop_set: filter
            .interests
            .iter()
            .map(|interest| PropertySpec {
                type_: interest.object_kind.clone(),
                all: false,
                path_set: interest.paths.clone(),
            })
            .collect(),
        object_set: vec![ObjectSpec {
            obj: to_moref(&filter.traversal.root),
            skip: false,
            select_set,
        }],
    }
}

/// `any` 类型的值：`{"_typeName": ..., "_value": ...}` 或裸值
pub fn property_value(val: Value) -> PropertyValue {
    let inner = match &val {
        Value::Object(map) => map.get("_value").cloned(),
        _ => Some(val.clone()),
    };
    match inner {
        Some(Value::String(s)) => PropertyValue::Text(s),
        Some(Value::Bool(b)) => PropertyValue::Bool(b),
        Some(Value::Number(n)) if n.is_i64() => match n.as_i64() {
            Some(i) => PropertyValue::Int(i),
            None => PropertyValue::Opaque(val),
        },
        _ => PropertyValue::Opaque(val),
    }
}

/// UpdateSet -> UpdateBatch
///
/// 未知的更新类型或操作只跳过对应条目，游标总是保留。
pub fn update_batch(update: wire::UpdateSet) -> UpdateBatch {
    if update.truncated == Some(true) {
        tracing::debug!(version = %update.version, "Truncated update set, remainder follows");
    }

    let filters = update
        .filter_set
        .into_iter()
        .map(|filter_update| FilterUpdate {
            filter: filter_update.filter.map(from_moref),
            objects: filter_update
                .object_set
                .into_iter()
                .filter_map(object_update)
                .collect(),
        })
        .collect();

    UpdateBatch {
        version: update.version.into(),
        filters,
    }
}

fn object_update(object: wire::ObjectUpdate) -> Option<ObjectUpdate> {
    let kind = match object.kind.parse::<UpdateKind>() {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!("Skipping object update: {e}");
            return None;
        }
    };

    let changes = object
        .change_set
        .into_iter()
        .filter_map(|change| match change.op.parse::<ChangeOp>() {
            Ok(op) => Some(PropertyChange {
                name: change.name,
                op,
                value: change.val.map(property_value),
            }),
            Err(e) => {
                tracing::warn!(property = %change.name, "Skipping property change: {e}");
                None
            }
        })
        .collect();

    Some(ObjectUpdate {
        kind,
        obj: object.obj.map(from_moref),
        changes,
    })
}

/// 未报告硬件或设备列表时视为没有设备
pub fn vm_config_summary(config: wire::VirtualMachineConfigInfo) -> VmConfigSummary {
    let devices = config
        .devices()
        .iter()
        .map(|device| VirtualDevice {
            key: device.key,
            type_name: device.type_name.clone(),
            label: device.device_info.as_ref().map(|info| info.label.clone()),
            backing_file: device
                .backing
                .as_ref()
                .and_then(|backing| backing.file_name.clone()),
        })
        .collect();

    VmConfigSummary {
        name: config.name,
        devices,
    }
}
