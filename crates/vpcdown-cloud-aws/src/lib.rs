//! AWS network provider for vpcdown
//!
//! Implements the [`NetworkProvider`](vpcdown_cloud::NetworkProvider) trait
//! on top of the EC2 API. Credentials and region come from the standard AWS
//! provider chain (environment, shared config, instance metadata); nothing
//! secret is held by this crate.
//!
//! # Example
//!
//! ```ignore
//! use vpcdown_cloud::{NetworkTeardown, TeardownConfig};
//! use vpcdown_cloud_aws::Ec2NetworkProvider;
//!
//! let provider = Ec2NetworkProvider::new("ap-northeast-1").await;
//! let teardown = NetworkTeardown::new(&provider, TeardownConfig::default());
//! let report = teardown.run("vpc-0abc123").await?;
//! ```

pub mod error;
pub mod provider;

pub use provider::Ec2NetworkProvider;
