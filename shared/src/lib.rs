//! Shared types for the VM listener workspace
//!
//! Vendor-independent model used by `vim-client` and `vm-listener`:
//! object references, inventory traversal, property updates,
//! virtual devices and volume paths.

pub mod device;
pub mod error;
pub mod inventory;
pub mod power;
pub mod update;

// Re-exports
pub use device::{VirtualDevice, VmConfigSummary, VolumePath};
pub use error::{ModelError, ModelResult};
pub use inventory::{ChildSelector, InventoryTraversal, ObjectRef, PropertyInterest, WatchFilter};
pub use power::PowerState;
pub use update::{
    ChangeOp, FilterUpdate, ObjectUpdate, PropertyChange, PropertyValue, UpdateBatch, UpdateKind,
    UpdateVersion,
};
