//! VIM Client - HTTP client for the virtualization platform's JSON API
//!
//! Speaks the `sdk/vim25/{release}` JSON protocol: session login,
//! service content, property collector calls and VM config reads.
//! Only wire types live here; translation to the neutral model is
//! done by the caller.

pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use config::VimConfig;
pub use error::{VimError, VimResult};
pub use http::VimClient;
pub use types::{
    ManagedObjectReference, ObjectSpec, PropertyFilterSpec, PropertySpec, SelectionSpec,
    ServiceContent, TraversalSpec, UpdateSet, VirtualMachineConfigInfo,
};
