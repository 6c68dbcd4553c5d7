//! EC2-backed implementation of the network provider trait

use crate::error::classify;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::types::{Filter, InstanceStateName};
use tracing::debug;
use vpcdown_cloud::{
    CloudError, Gateway, Instance, InstanceState, Network, NetworkAcl, NetworkInterface,
    NetworkProvider, Result, Route, RouteOrigin, RouteTable, RouteTableAssociation, SecurityGroup,
    Subnet,
};

/// AWS network provider speaking to the EC2 API
pub struct Ec2NetworkProvider {
    client: aws_sdk_ec2::Client,
}

impl Ec2NetworkProvider {
    /// Build a provider for the given region. Credentials come from the
    /// default provider chain (environment, shared config, instance
    /// metadata).
    pub async fn new(region: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;
        Self {
            client: aws_sdk_ec2::Client::new(&config),
        }
    }

    /// Build a provider from an existing client (tests, custom endpoints)
    pub fn from_client(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }

    fn vpc_filter(network_id: &str) -> Filter {
        Filter::builder().name("vpc-id").values(network_id).build()
    }

    fn subnet_filter(subnet_id: &str) -> Filter {
        Filter::builder()
            .name("subnet-id")
            .values(subnet_id)
            .build()
    }
}

fn convert_origin(origin: Option<&aws_sdk_ec2::types::RouteOrigin>) -> RouteOrigin {
    use aws_sdk_ec2::types::RouteOrigin as Ec2Origin;
    match origin {
        Some(Ec2Origin::CreateRoute) => RouteOrigin::CreateRoute,
        Some(Ec2Origin::EnableVgwRoutePropagation) => RouteOrigin::EnableVgwRoutePropagation,
        // CreateRouteTable and anything new: provider-managed, not deletable
        _ => RouteOrigin::CreateRouteTable,
    }
}

fn convert_instance_state(name: Option<&InstanceStateName>) -> InstanceState {
    match name {
        Some(InstanceStateName::Running) => InstanceState::Running,
        Some(InstanceStateName::ShuttingDown) => InstanceState::ShuttingDown,
        Some(InstanceStateName::Terminated) => InstanceState::Terminated,
        Some(InstanceStateName::Stopping) => InstanceState::Stopping,
        Some(InstanceStateName::Stopped) => InstanceState::Stopped,
        // Pending and anything new: not terminated, keep waiting
        _ => InstanceState::Pending,
    }
}

#[async_trait]
impl NetworkProvider for Ec2NetworkProvider {
    async fn find_network(&self, network_id: &str) -> Result<Option<Network>> {
        let resp = self
            .client
            .describe_vpcs()
            .vpc_ids(network_id)
            .send()
            .await;
        match resp {
            Ok(out) => {
                debug!(vpc_id = %network_id, found = !out.vpcs().is_empty(), "Looked up VPC");
                Ok(out.vpcs().first().and_then(|vpc| {
                    vpc.vpc_id().map(|id| Network {
                        id: id.to_string(),
                        cidr_block: vpc.cidr_block().map(str::to_string),
                    })
                }))
            }
            Err(e) => {
                let err = classify(e, "vpc", network_id);
                if err.is_not_found() { Ok(None) } else { Err(err) }
            }
        }
    }

    async fn list_gateways(&self, network_id: &str) -> Result<Vec<Gateway>> {
        let out = self
            .client
            .describe_internet_gateways()
            .filters(
                Filter::builder()
                    .name("attachment.vpc-id")
                    .values(network_id)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| classify(e, "internet-gateway", network_id))?;
        Ok(out
            .internet_gateways()
            .iter()
            .filter_map(|igw| {
                igw.internet_gateway_id().map(|id| Gateway {
                    id: id.to_string(),
                })
            })
            .collect())
    }

    async fn list_route_tables(&self, network_id: &str) -> Result<Vec<RouteTable>> {
        let out = self
            .client
            .describe_route_tables()
            .filters(Self::vpc_filter(network_id))
            .send()
            .await
            .map_err(|e| classify(e, "route-table", network_id))?;
        Ok(out
            .route_tables()
            .iter()
            .filter_map(|rt| {
                let id = rt.route_table_id()?.to_string();
                let associations = rt
                    .associations()
                    .iter()
                    .filter_map(|assoc| {
                        assoc
                            .route_table_association_id()
                            .map(|assoc_id| RouteTableAssociation {
                                id: assoc_id.to_string(),
                                main: assoc.main().unwrap_or(false),
                            })
                    })
                    .collect();
                let routes = rt
                    .routes()
                    .iter()
                    .filter_map(|route| {
                        // IPv6-only and prefix-list routes go away with the
                        // table; only CIDR routes are deleted individually
                        route.destination_cidr_block().map(|dest| Route {
                            destination: dest.to_string(),
                            origin: convert_origin(route.origin()),
                        })
                    })
                    .collect();
                Some(RouteTable {
                    id,
                    associations,
                    routes,
                })
            })
            .collect())
    }

    async fn list_security_groups(&self, network_id: &str) -> Result<Vec<SecurityGroup>> {
        let out = self
            .client
            .describe_security_groups()
            .filters(Self::vpc_filter(network_id))
            .send()
            .await
            .map_err(|e| classify(e, "security-group", network_id))?;
        Ok(out
            .security_groups()
            .iter()
            .filter_map(|group| {
                Some(SecurityGroup {
                    id: group.group_id()?.to_string(),
                    name: group.group_name().unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    async fn list_network_acls(&self, network_id: &str) -> Result<Vec<NetworkAcl>> {
        let out = self
            .client
            .describe_network_acls()
            .filters(Self::vpc_filter(network_id))
            .send()
            .await
            .map_err(|e| classify(e, "network-acl", network_id))?;
        Ok(out
            .network_acls()
            .iter()
            .filter_map(|acl| {
                acl.network_acl_id().map(|id| NetworkAcl {
                    id: id.to_string(),
                    is_default: acl.is_default().unwrap_or(false),
                })
            })
            .collect())
    }

    async fn list_subnets(&self, network_id: &str) -> Result<Vec<Subnet>> {
        let out = self
            .client
            .describe_subnets()
            .filters(Self::vpc_filter(network_id))
            .send()
            .await
            .map_err(|e| classify(e, "subnet", network_id))?;
        Ok(out
            .subnets()
            .iter()
            .filter_map(|subnet| {
                subnet.subnet_id().map(|id| Subnet { id: id.to_string() })
            })
            .collect())
    }

    async fn list_network_interfaces(&self, subnet_id: &str) -> Result<Vec<NetworkInterface>> {
        let out = self
            .client
            .describe_network_interfaces()
            .filters(Self::subnet_filter(subnet_id))
            .send()
            .await
            .map_err(|e| classify(e, "network-interface", subnet_id))?;
        Ok(out
            .network_interfaces()
            .iter()
            .filter_map(|eni| {
                eni.network_interface_id().map(|id| NetworkInterface {
                    id: id.to_string(),
                    attachment_id: eni
                        .attachment()
                        .and_then(|a| a.attachment_id())
                        .map(str::to_string),
                })
            })
            .collect())
    }

    async fn list_instances(&self, subnet_id: &str) -> Result<Vec<Instance>> {
        let out = self
            .client
            .describe_instances()
            .filters(Self::subnet_filter(subnet_id))
            .send()
            .await
            .map_err(|e| classify(e, "instance", subnet_id))?;
        Ok(out
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .filter_map(|instance| {
                instance.instance_id().map(|id| Instance {
                    id: id.to_string(),
                    state: convert_instance_state(
                        instance.state().and_then(|s| s.name()),
                    ),
                })
            })
            .collect())
    }

    async fn detach_gateway(&self, network_id: &str, gateway_id: &str) -> Result<()> {
        self.client
            .detach_internet_gateway()
            .internet_gateway_id(gateway_id)
            .vpc_id(network_id)
            .send()
            .await
            .map_err(|e| classify(e, "internet-gateway", gateway_id))?;
        Ok(())
    }

    async fn delete_gateway(&self, gateway_id: &str) -> Result<()> {
        self.client
            .delete_internet_gateway()
            .internet_gateway_id(gateway_id)
            .send()
            .await
            .map_err(|e| classify(e, "internet-gateway", gateway_id))?;
        Ok(())
    }

    async fn delete_route_table_association(&self, association_id: &str) -> Result<()> {
        self.client
            .disassociate_route_table()
            .association_id(association_id)
            .send()
            .await
            .map_err(|e| classify(e, "route-table-association", association_id))?;
        Ok(())
    }

    async fn delete_security_group(&self, group_id: &str) -> Result<()> {
        self.client
            .delete_security_group()
            .group_id(group_id)
            .send()
            .await
            .map_err(|e| classify(e, "security-group", group_id))?;
        Ok(())
    }

    async fn delete_route(&self, route_table_id: &str, destination: &str) -> Result<()> {
        self.client
            .delete_route()
            .route_table_id(route_table_id)
            .destination_cidr_block(destination)
            .send()
            .await
            .map_err(|e| classify(e, "route", destination))?;
        Ok(())
    }

    async fn delete_route_table(&self, route_table_id: &str) -> Result<()> {
        self.client
            .delete_route_table()
            .route_table_id(route_table_id)
            .send()
            .await
            .map_err(|e| classify(e, "route-table", route_table_id))?;
        Ok(())
    }

    async fn delete_network_acl(&self, acl_id: &str) -> Result<()> {
        self.client
            .delete_network_acl()
            .network_acl_id(acl_id)
            .send()
            .await
            .map_err(|e| classify(e, "network-acl", acl_id))?;
        Ok(())
    }

    async fn detach_network_interface(&self, attachment_id: &str) -> Result<()> {
        self.client
            .detach_network_interface()
            .attachment_id(attachment_id)
            .send()
            .await
            .map_err(|e| classify(e, "network-interface-attachment", attachment_id))?;
        Ok(())
    }

    async fn delete_network_interface(&self, interface_id: &str) -> Result<()> {
        self.client
            .delete_network_interface()
            .network_interface_id(interface_id)
            .send()
            .await
            .map_err(|e| classify(e, "network-interface", interface_id))?;
        Ok(())
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        self.client
            .terminate_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| classify(e, "instance", instance_id))?;
        Ok(())
    }

    async fn instance_state(&self, instance_id: &str) -> Result<InstanceState> {
        let out = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| classify(e, "instance", instance_id))?;
        out.reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .find(|instance| instance.instance_id() == Some(instance_id))
            .map(|instance| {
                convert_instance_state(instance.state().and_then(|s| s.name()))
            })
            .ok_or_else(|| CloudError::NotFound {
                resource_type: "instance",
                resource_id: instance_id.to_string(),
            })
    }

    async fn delete_subnet(&self, subnet_id: &str) -> Result<()> {
        self.client
            .delete_subnet()
            .subnet_id(subnet_id)
            .send()
            .await
            .map_err(|e| classify(e, "subnet", subnet_id))?;
        Ok(())
    }

    async fn delete_network(&self, network_id: &str) -> Result<()> {
        self.client
            .delete_vpc()
            .vpc_id(network_id)
            .send()
            .await
            .map_err(|e| classify(e, "vpc", network_id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_origin_conversion() {
        use aws_sdk_ec2::types::RouteOrigin as Ec2Origin;
        assert_eq!(
            convert_origin(Some(&Ec2Origin::CreateRoute)),
            RouteOrigin::CreateRoute
        );
        assert_eq!(
            convert_origin(Some(&Ec2Origin::CreateRouteTable)),
            RouteOrigin::CreateRouteTable
        );
        assert_eq!(convert_origin(None), RouteOrigin::CreateRouteTable);
    }

    #[test]
    fn instance_state_conversion() {
        assert_eq!(
            convert_instance_state(Some(&InstanceStateName::Terminated)),
            InstanceState::Terminated
        );
        assert_eq!(
            convert_instance_state(Some(&InstanceStateName::ShuttingDown)),
            InstanceState::ShuttingDown
        );
        // unknown states must never count as terminated
        assert!(!convert_instance_state(None).is_terminated());
    }
}
