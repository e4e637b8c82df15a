//! Wire types for the JSON management protocol
//!
//! Field names follow the protocol (camelCase). Polymorphic data objects
//! carry their concrete type in `_typeName`.

use serde::{Deserialize, Serialize};

// ============================================================================
// References and service content
// ============================================================================

/// Reference to a server-side managed object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedObjectReference {
    #[serde(rename = "type")]
    pub type_: String,
    pub value: String,
}

impl ManagedObjectReference {
    pub fn new(type_: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            value: value.into(),
        }
    }
}

/// Product information reported by the endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutInfo {
    pub full_name: String,
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Root service content (subset used by the listener)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceContent {
    pub root_folder: ManagedObjectReference,
    pub property_collector: ManagedObjectReference,
    #[serde(default)]
    pub session_manager: Option<ManagedObjectReference>,
    #[serde(default)]
    pub about: Option<AboutInfo>,
}

// ============================================================================
// Property filter (request side)
// ============================================================================

/// Traversal step: follow `path` on objects of `type_`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub path: String,
    pub skip: bool,
    #[serde(default)]
    pub select_set: Vec<SelectionSpec>,
}

/// Element of a `selectSet`: either a named reference or a full traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_typeName")]
pub enum SelectionSpec {
    SelectionSpec { name: String },
    TraversalSpec(TraversalSpec),
}

impl SelectionSpec {
    /// Reference an already defined traversal by name
    pub fn named(name: impl Into<String>) -> Self {
        SelectionSpec::SelectionSpec { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSpec {
    pub obj: ManagedObjectReference,
    pub skip: bool,
    #[serde(default)]
    pub select_set: Vec<SelectionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub type_: String,
    pub all: bool,
    #[serde(default)]
    pub path_set: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilterSpec {
    pub prop_set: Vec<PropertySpec>,
    pub object_set: Vec<ObjectSpec>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFilterRequest<'a> {
    pub spec: &'a PropertyFilterSpec,
    pub partial_updates: bool,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WaitOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wait_seconds: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WaitForUpdatesExRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
    pub options: WaitOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub user_name: &'a str,
    pub password: &'a str,
}

// ============================================================================
// Update set (response side)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyChange {
    pub name: String,
    pub op: String,
    /// `any`-typed value, usually `{"_typeName": ..., "_value": ...}`
    #[serde(default)]
    pub val: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectUpdate {
    pub kind: String,
    #[serde(default)]
    pub obj: Option<ManagedObjectReference>,
    #[serde(default)]
    pub change_set: Vec<PropertyChange>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilterUpdate {
    #[serde(default)]
    pub filter: Option<ManagedObjectReference>,
    #[serde(default)]
    pub object_set: Vec<ObjectUpdate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSet {
    pub version: String,
    #[serde(default)]
    pub filter_set: Vec<PropertyFilterUpdate>,
    #[serde(default)]
    pub truncated: Option<bool>,
}

// ============================================================================
// Virtual machine configuration
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    pub label: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceBacking {
    #[serde(rename = "_typeName", default)]
    pub type_name: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDevice {
    #[serde(rename = "_typeName")]
    pub type_name: String,
    pub key: i32,
    #[serde(default)]
    pub device_info: Option<Description>,
    #[serde(default)]
    pub backing: Option<DeviceBacking>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VirtualHardware {
    #[serde(default)]
    pub device: Vec<VirtualDevice>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineConfigInfo {
    pub name: String,
    #[serde(default)]
    pub hardware: Option<VirtualHardware>,
}

impl VirtualMachineConfigInfo {
    /// Attached devices, empty when hardware is not reported
    pub fn devices(&self) -> &[VirtualDevice] {
        self.hardware
            .as_ref()
            .map(|h| h.device.as_slice())
            .unwrap_or_default()
    }
}

// ============================================================================
// Faults
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LocalizableMessage {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Method fault body returned with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodFault {
    #[serde(rename = "_typeName")]
    pub type_name: String,
    #[serde(default)]
    pub fault_message: Vec<LocalizableMessage>,
}

impl MethodFault {
    /// Human readable message, falling back to the message keys
    pub fn message(&self) -> String {
        let parts: Vec<&str> = self
            .fault_message
            .iter()
            .map(|m| m.message.as_deref().unwrap_or(&m.key))
            .filter(|m| !m.is_empty())
            .collect();
        if parts.is_empty() {
            self.type_name.clone()
        } else {
            parts.join("; ")
        }
    }
}
