//! 电源状态过滤器
//!
//! 从根文件夹出发递归选择所有虚拟机，只报告 `runtime.powerState`。

use shared::{ChildSelector, InventoryTraversal, ObjectRef, PowerState, PropertyInterest, WatchFilter};

/// 虚拟机电源状态属性路径
pub const VM_POWER_STATE: &str = "runtime.powerState";

/// 关机状态的枚举字面值
pub const POWERED_OFF: &str = "poweredOff";

pub const VIRTUAL_MACHINE: &str = "VirtualMachine";

const VISIT_FOLDERS: &str = "visitFolders";
const DC_TO_VMF: &str = "dcToVmf";

/// 文件夹遍历：
/// - `visitFolders`: Folder.childEntity，继续 visitFolders / dcToVmf
/// - `dcToVmf`: Datacenter.vmFolder，继续 visitFolders
pub fn vm_folder_traversal(root: ObjectRef) -> InventoryTraversal {
    InventoryTraversal::new(root)
        .with_selector(
            ChildSelector::new(VISIT_FOLDERS, "Folder", "childEntity")
                .then(VISIT_FOLDERS)
                .then(DC_TO_VMF),
        )
        .with_selector(ChildSelector::new(DC_TO_VMF, "Datacenter", "vmFolder").then(VISIT_FOLDERS))
}

/// 只关注虚拟机电源状态的过滤器
pub fn power_state_filter(root: ObjectRef) -> WatchFilter {
    WatchFilter {
        traversal: vm_folder_traversal(root),
        interests: vec![PropertyInterest::new(VIRTUAL_MACHINE).with_path(VM_POWER_STATE)],
    }
}

/// 变更是否为"关机"
pub fn is_power_off(name: &str, value: Option<&str>) -> bool {
    name == VM_POWER_STATE
        && value.and_then(|v| v.parse::<PowerState>().ok()) == Some(PowerState::PoweredOff)
}
