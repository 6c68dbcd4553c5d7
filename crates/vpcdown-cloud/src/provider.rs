//! Network provider trait definition

use crate::error::Result;
use crate::model::{
    Gateway, Instance, InstanceState, Network, NetworkAcl, NetworkInterface, RouteTable,
    SecurityGroup, Subnet,
};
use async_trait::async_trait;

/// Cloud backend abstraction for network teardown.
///
/// The orchestrator drives teardown exclusively through this trait, so the
/// sequencing logic can be exercised against an in-memory provider in tests.
/// Every operation is a single blocking remote call; failures must be
/// reported through the [`CloudError`](crate::error::CloudError) taxonomy so
/// the orchestrator can tell "already gone" from "still blocked" from
/// "throttled".
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Look up the network, `None` if it does not exist
    async fn find_network(&self, network_id: &str) -> Result<Option<Network>>;

    async fn list_gateways(&self, network_id: &str) -> Result<Vec<Gateway>>;

    async fn list_route_tables(&self, network_id: &str) -> Result<Vec<RouteTable>>;

    async fn list_security_groups(&self, network_id: &str) -> Result<Vec<SecurityGroup>>;

    async fn list_network_acls(&self, network_id: &str) -> Result<Vec<NetworkAcl>>;

    async fn list_subnets(&self, network_id: &str) -> Result<Vec<Subnet>>;

    async fn list_network_interfaces(&self, subnet_id: &str) -> Result<Vec<NetworkInterface>>;

    async fn list_instances(&self, subnet_id: &str) -> Result<Vec<Instance>>;

    /// Detach a gateway from the network (network-scoped; the gateway object
    /// itself survives and is deleted separately)
    async fn detach_gateway(&self, network_id: &str, gateway_id: &str) -> Result<()>;

    async fn delete_gateway(&self, gateway_id: &str) -> Result<()>;

    async fn delete_route_table_association(&self, association_id: &str) -> Result<()>;

    async fn delete_security_group(&self, group_id: &str) -> Result<()>;

    async fn delete_route(&self, route_table_id: &str, destination: &str) -> Result<()>;

    async fn delete_route_table(&self, route_table_id: &str) -> Result<()>;

    async fn delete_network_acl(&self, acl_id: &str) -> Result<()>;

    async fn detach_network_interface(&self, attachment_id: &str) -> Result<()>;

    async fn delete_network_interface(&self, interface_id: &str) -> Result<()>;

    async fn terminate_instance(&self, instance_id: &str) -> Result<()>;

    /// Current lifecycle state of an instance, polled during drain
    async fn instance_state(&self, instance_id: &str) -> Result<InstanceState>;

    async fn delete_subnet(&self, subnet_id: &str) -> Result<()>;

    /// Delete the parent network itself. Fails with a dependency violation
    /// while any non-default child still references it.
    async fn delete_network(&self, network_id: &str) -> Result<()>;
}
