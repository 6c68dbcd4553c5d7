//! Resource model for a virtual network and its children
//!
//! These are plain descriptions returned by a [`NetworkProvider`]: the
//! orchestrator never caches them, it re-queries fresh at every step so it
//! cannot desynchronize from provider-reported state.
//!
//! [`NetworkProvider`]: crate::provider::NetworkProvider

use serde::{Deserialize, Serialize};

/// The parent virtual network being torn down
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    /// Provider-scoped unique identifier (e.g. `vpc-0abc123`)
    pub id: String,

    /// Primary address range, when the provider reports one
    pub cidr_block: Option<String>,
}

/// An internet gateway attached to the network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub id: String,
}

/// A route table and everything it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTable {
    pub id: String,
    pub associations: Vec<RouteTableAssociation>,
    pub routes: Vec<Route>,
}

/// A link between a route table and a subnet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTableAssociation {
    pub id: String,

    /// The implicit main association has no subnet link and cannot be
    /// removed; it disappears with the table.
    pub main: bool,
}

/// A single routing rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Destination block the rule matches (e.g. `10.0.1.0/24`)
    pub destination: String,
    pub origin: RouteOrigin,
}

/// How a route came to exist. Only explicitly created routes are deletable;
/// the provider manages the rest and refuses to delete them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOrigin {
    /// Explicitly created by a user
    CreateRoute,
    /// Local route installed when the table was created
    CreateRouteTable,
    /// Propagated from a gateway
    EnableVgwRoutePropagation,
}

impl RouteOrigin {
    pub fn is_user_created(&self) -> bool {
        matches!(self, RouteOrigin::CreateRoute)
    }
}

/// A stateful traffic-filtering policy scoped to the network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
}

impl SecurityGroup {
    /// The provider-protected group every network carries. Attempting to
    /// delete it always fails, so it is filtered out before deletion.
    /// "main" is the legacy name some providers use.
    pub fn is_protected_default(&self) -> bool {
        self.name == "default" || self.name == "main"
    }
}

/// A stateless traffic-filtering policy scoped to a subnet set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkAcl {
    pub id: String,

    /// Default ACLs are provider-protected and must not be deleted
    pub is_default: bool,
}

/// An address-range partition of the network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
}

/// A virtual NIC inside a subnet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub id: String,

    /// Present while the interface is attached; it must be detached (by
    /// this id) before the interface can be deleted.
    pub attachment_id: Option<String>,
}

/// A compute instance hosted in a subnet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub state: InstanceState,
}

/// Instance lifecycle state as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
}

impl InstanceState {
    /// Only terminated instances permit their subnet to be reclaimed
    pub fn is_terminated(&self) -> bool {
        matches!(self, InstanceState::Terminated)
    }

    /// A terminate command has already been issued; do not issue another
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, InstanceState::ShuttingDown)
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceState::Pending => write!(f, "pending"),
            InstanceState::Running => write!(f, "running"),
            InstanceState::ShuttingDown => write!(f, "shutting-down"),
            InstanceState::Terminated => write!(f, "terminated"),
            InstanceState::Stopping => write!(f, "stopping"),
            InstanceState::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_group_names() {
        let default = SecurityGroup {
            id: "sg-1".to_string(),
            name: "default".to_string(),
        };
        let legacy = SecurityGroup {
            id: "sg-2".to_string(),
            name: "main".to_string(),
        };
        let app = SecurityGroup {
            id: "sg-3".to_string(),
            name: "web-servers".to_string(),
        };
        assert!(default.is_protected_default());
        assert!(legacy.is_protected_default());
        assert!(!app.is_protected_default());
    }

    #[test]
    fn only_create_route_is_user_created() {
        assert!(RouteOrigin::CreateRoute.is_user_created());
        assert!(!RouteOrigin::CreateRouteTable.is_user_created());
        assert!(!RouteOrigin::EnableVgwRoutePropagation.is_user_created());
    }
}
