//! resizer-cloud: Compute provider abstraction
//!
//! Provides the `ComputeProvider` trait the resize workflow drives, and an
//! EC2 implementation built from per-request credentials.

pub mod ec2;
pub mod error;
pub mod traits;
pub mod types;

pub use ec2::{Ec2Provider, Ec2Settings};
pub use error::ProviderError;
pub use traits::ComputeProvider;
pub use types::{InstanceDescription, InstanceState, Reservation, TargetState};
