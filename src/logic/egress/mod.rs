//! Egress Module
//!
//! Health statistics per configured egress point and best-candidate
//! selection. Residential records are a hard preference, not a score
//! factor.
//!
//! ## Structure
//! - `types`: EgressRecord, EgressClass, Credentials, EgressConfig
//! - `registry`: shared registry (thread-safe)
//! - `signature`: client signature pool rotated alongside egress

pub mod types;
pub mod registry;
pub mod signature;

pub use types::{Credentials, EgressClass, EgressConfig, EgressRecord};
pub use registry::EgressRegistry;
pub use signature::{ClientSignaturePool, SelectionStrategy};
