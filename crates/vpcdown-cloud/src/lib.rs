//! vpcdown cloud abstraction
//!
//! This crate holds everything that makes vpcdown tick: the resource model
//! for a virtual network and its children, the `NetworkProvider` trait that
//! a cloud backend implements, and the dependency-ordered teardown
//! orchestrator that drives it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  vpcdown CLI                     │
//! │              (vpcdown <vpc-id>)                  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               vpcdown-cloud                      │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        Teardown Orchestrator              │   │
//! │  │  NetworkTeardown<P: NetworkProvider>      │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Resource     │  │ Error        │            │
//! │  │ Model        │  │ Taxonomy     │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │ vpcdown-cloud │
//! │     -aws      │
//! └───────────────┘
//! ```

pub mod error;
pub mod model;
pub mod provider;
pub mod teardown;

// Re-exports
pub use error::{CloudError, Result};
pub use model::{
    Gateway, Instance, InstanceState, Network, NetworkAcl, NetworkInterface, Route, RouteOrigin,
    RouteTable, RouteTableAssociation, SecurityGroup, Subnet,
};
pub use provider::NetworkProvider;
pub use teardown::{
    DrainConfig, NetworkTeardown, RetryConfig, TeardownConfig, TeardownReport, TeardownStage,
};
