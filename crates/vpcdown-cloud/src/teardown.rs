//! Dependency-ordered network teardown orchestrator
//!
//! The provider's delete API rejects deletion of the parent network while
//! children still reference it, so teardown walks an explicit ordered list
//! of stages, each removing one kind of child. Stages are individually
//! fault-tolerant: a failure on one resource never stops its siblings, and
//! a failed stage never gates the next one. Only the final parent delete
//! drives the retry loop, which re-runs the whole sequence with backoff
//! until the provider accepts the delete or the attempt budget runs out.

use crate::error::{CloudError, Result};
use crate::provider::NetworkProvider;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Retry configuration for the parent-delete loop
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of full teardown passes
    pub max_attempts: u32,

    /// Delay before the second pass
    pub initial_delay: Duration,

    /// Cap for exponential growth
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the given zero-based failed attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let millis = (self.initial_delay.as_millis() as f64 * factor) as u64;
        Duration::from_millis(millis.min(self.max_delay.as_millis() as u64))
    }
}

/// Bounded poll configuration for the instance-termination wait
#[derive(Debug, Clone)]
pub struct DrainConfig {
    pub poll_interval: Duration,

    /// Ceiling for a single instance; an instance stuck mid-shutdown fails
    /// its subnet for this pass instead of hanging the run
    pub timeout: Duration,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Teardown configuration, passed into the orchestrator at construction
#[derive(Debug, Clone)]
pub struct TeardownConfig {
    /// Pause before the parent delete so provider-side propagation of the
    /// child deletions can catch up
    pub settle_delay: Duration,

    pub retry: RetryConfig,

    pub drain: DrainConfig,

    /// List and log what would be deleted without issuing any mutation
    pub dry_run: bool,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(15),
            retry: RetryConfig::default(),
            drain: DrainConfig::default(),
            dry_run: false,
        }
    }
}

/// One step of the teardown sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStage {
    /// Detach every gateway from the network, then delete it
    DetachGateways,
    /// Remove subnet links from every route table
    RemoveRouteTableAssociations,
    /// Delete every security group except the protected default
    PruneSecurityGroups,
    /// Delete explicitly created routes, then the tables themselves
    DeleteRoutes,
    /// Delete every network ACL except the defaults
    PruneNetworkAcls,
    /// Detach and delete every network interface in every subnet
    DeleteNetworkInterfaces,
    /// Drain instances, re-sweep interfaces, delete each subnet
    DeleteSubnets,
    /// Delete-only second pass over any gateway still around
    SweepGateways,
}

impl TeardownStage {
    /// Deletion-safe order: children go before the resources they block.
    /// Associations must precede both route tables and subnets; interfaces
    /// must precede subnets; everything precedes the parent delete.
    pub const ORDERED: [TeardownStage; 8] = [
        TeardownStage::DetachGateways,
        TeardownStage::RemoveRouteTableAssociations,
        TeardownStage::PruneSecurityGroups,
        TeardownStage::DeleteRoutes,
        TeardownStage::PruneNetworkAcls,
        TeardownStage::DeleteNetworkInterfaces,
        TeardownStage::DeleteSubnets,
        TeardownStage::SweepGateways,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TeardownStage::DetachGateways => "detach-gateways",
            TeardownStage::RemoveRouteTableAssociations => "route-table-associations",
            TeardownStage::PruneSecurityGroups => "security-groups",
            TeardownStage::DeleteRoutes => "routes",
            TeardownStage::PruneNetworkAcls => "network-acls",
            TeardownStage::DeleteNetworkInterfaces => "network-interfaces",
            TeardownStage::DeleteSubnets => "subnets",
            TeardownStage::SweepGateways => "gateway-sweep",
        }
    }
}

impl std::fmt::Display for TeardownStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of a teardown run
#[derive(Debug, Clone, Default)]
pub struct TeardownReport {
    /// Resources the provider confirmed deleted
    pub deleted: usize,

    /// Resources that were already gone when we tried
    pub already_gone: usize,

    /// Per-resource failures that were logged and skipped over
    pub failed: usize,

    /// Resources not touched (dry run)
    pub skipped: usize,

    /// Full passes through the stage sequence
    pub passes: u32,

    /// Whether the parent network is gone at the end of the run
    pub network_deleted: bool,
}

impl std::fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} deleted, {} already gone, {} failed, {} skipped ({} pass{})",
            self.deleted,
            self.already_gone,
            self.failed,
            self.skipped,
            self.passes,
            if self.passes == 1 { "" } else { "es" }
        )
    }
}

/// Drives the teardown of one network through a [`NetworkProvider`].
///
/// Holds a borrowed provider and the run configuration; all provider-side
/// state is re-queried fresh at every step.
pub struct NetworkTeardown<'a, P: NetworkProvider> {
    provider: &'a P,
    config: TeardownConfig,
}

impl<'a, P: NetworkProvider> NetworkTeardown<'a, P> {
    pub fn new(provider: &'a P, config: TeardownConfig) -> Self {
        Self { provider, config }
    }

    /// Tear down the network and everything inside it.
    ///
    /// Returns a report on success (including the no-op case where the
    /// network no longer exists). Fails with
    /// [`CloudError::RetriesExhausted`] when the parent delete keeps being
    /// rejected after the configured number of passes.
    pub async fn run(&self, network_id: &str) -> Result<TeardownReport> {
        let mut report = TeardownReport::default();

        let Some(network) = self.provider.find_network(network_id).await? else {
            info!(vpc_id = %network_id, "Network not found, nothing to tear down");
            return Ok(report);
        };
        info!(
            vpc_id = %network.id,
            cidr = ?network.cidr_block,
            dry_run = self.config.dry_run,
            "Tearing down network"
        );

        for attempt in 0..self.config.retry.max_attempts {
            report.passes += 1;
            for stage in TeardownStage::ORDERED {
                debug!(stage = %stage, vpc_id = %network_id, "Running stage");
                self.run_stage(stage, network_id, &mut report).await;
            }

            if self.config.dry_run {
                info!(vpc_id = %network_id, "[dry run] Would delete network");
                return Ok(report);
            }

            sleep(self.config.settle_delay).await;

            match self.provider.delete_network(network_id).await {
                Ok(()) => {
                    info!(vpc_id = %network_id, passes = report.passes, "Network deleted");
                    report.deleted += 1;
                    report.network_deleted = true;
                    return Ok(report);
                }
                Err(e) if e.is_not_found() => {
                    info!(vpc_id = %network_id, "Network already gone");
                    report.already_gone += 1;
                    report.network_deleted = true;
                    return Ok(report);
                }
                Err(e) => {
                    warn!(
                        vpc_id = %network_id,
                        error = %e,
                        attempt = attempt + 1,
                        "Network delete failed, re-running teardown sequence"
                    );
                    if attempt + 1 < self.config.retry.max_attempts {
                        sleep(self.config.retry.delay_for_attempt(attempt)).await;
                    }
                }
            }
        }

        Err(CloudError::RetriesExhausted {
            network_id: network_id.to_string(),
            attempts: self.config.retry.max_attempts,
        })
    }

    /// Run one stage. A listing failure skips the stage for this pass only;
    /// later passes will see it again.
    async fn run_stage(
        &self,
        stage: TeardownStage,
        network_id: &str,
        report: &mut TeardownReport,
    ) {
        let result = match stage {
            TeardownStage::DetachGateways => {
                self.detach_and_delete_gateways(network_id, report).await
            }
            TeardownStage::RemoveRouteTableAssociations => {
                self.remove_route_table_associations(network_id, report).await
            }
            TeardownStage::PruneSecurityGroups => {
                self.prune_security_groups(network_id, report).await
            }
            TeardownStage::DeleteRoutes => self.delete_routes_and_tables(network_id, report).await,
            TeardownStage::PruneNetworkAcls => self.prune_network_acls(network_id, report).await,
            TeardownStage::DeleteNetworkInterfaces => {
                self.delete_network_interfaces(network_id, report).await
            }
            TeardownStage::DeleteSubnets => self.delete_subnets(network_id, report).await,
            TeardownStage::SweepGateways => self.sweep_gateways(network_id, report).await,
        };

        if let Err(e) = result {
            warn!(stage = %stage, vpc_id = %network_id, error = %e, "Stage failed, continuing");
            report.failed += 1;
        }
    }

    /// Best-effort bulk delete: run `op` for every item, isolating each
    /// failure. Not-found is benign (the resource is already gone); anything
    /// else is logged and counted, and siblings are still processed.
    async fn best_effort_each<T, D, F, Fut>(
        &self,
        kind: &'static str,
        items: Vec<T>,
        report: &mut TeardownReport,
        describe: D,
        op: F,
    ) where
        D: Fn(&T) -> String,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        for item in items {
            let id = describe(&item);
            if self.config.dry_run {
                info!(kind, id = %id, "[dry run] Would delete");
                report.skipped += 1;
                continue;
            }
            match op(item).await {
                Ok(()) => {
                    info!(kind, id = %id, "Deleted");
                    report.deleted += 1;
                }
                Err(e) if e.is_not_found() => {
                    debug!(kind, id = %id, "Already gone");
                    report.already_gone += 1;
                }
                Err(e) => {
                    warn!(kind, id = %id, error = %e, "Delete failed, continuing");
                    report.failed += 1;
                }
            }
        }
    }

    /// Detach every gateway from the network, then delete the gateway
    /// object itself (two distinct provider calls; detach is network-scoped,
    /// delete is gateway-scoped).
    async fn detach_and_delete_gateways(
        &self,
        network_id: &str,
        report: &mut TeardownReport,
    ) -> Result<()> {
        let gateways = self.provider.list_gateways(network_id).await?;
        self.best_effort_each(
            "internet-gateway",
            gateways,
            report,
            |gw| gw.id.clone(),
            |gw| async move {
                self.provider.detach_gateway(network_id, &gw.id).await?;
                self.provider.delete_gateway(&gw.id).await
            },
        )
        .await;
        Ok(())
    }

    /// Remove the subnet links of every route table. Must precede both the
    /// table deletes and the subnet deletes. The implicit main association
    /// is not removable and is filtered out up front.
    async fn remove_route_table_associations(
        &self,
        network_id: &str,
        report: &mut TeardownReport,
    ) -> Result<()> {
        let tables = self.provider.list_route_tables(network_id).await?;
        for table in tables {
            let associations: Vec<_> =
                table.associations.into_iter().filter(|a| !a.main).collect();
            self.best_effort_each(
                "route-table-association",
                associations,
                report,
                |assoc| assoc.id.clone(),
                |assoc| async move {
                    self.provider.delete_route_table_association(&assoc.id).await
                },
            )
            .await;
        }
        Ok(())
    }

    /// Delete every security group except the provider-protected default,
    /// which is filtered by name rather than caught as a failure.
    async fn prune_security_groups(
        &self,
        network_id: &str,
        report: &mut TeardownReport,
    ) -> Result<()> {
        let groups: Vec<_> = self
            .provider
            .list_security_groups(network_id)
            .await?
            .into_iter()
            .filter(|g| !g.is_protected_default())
            .collect();
        self.best_effort_each(
            "security-group",
            groups,
            report,
            |g| g.id.clone(),
            |g| async move { self.provider.delete_security_group(&g.id).await },
        )
        .await;
        Ok(())
    }

    /// Delete the explicitly created routes of every table, then the table
    /// itself. Provider-managed routes (local, propagated) are left alone;
    /// they do not block the table delete. The table delete is attempted
    /// even when some routes failed.
    async fn delete_routes_and_tables(
        &self,
        network_id: &str,
        report: &mut TeardownReport,
    ) -> Result<()> {
        let tables = self.provider.list_route_tables(network_id).await?;
        for table in tables {
            let routes: Vec<_> = table
                .routes
                .into_iter()
                .filter(|r| r.origin.is_user_created())
                .collect();
            let table_id = table.id;
            self.best_effort_each(
                "route",
                routes,
                report,
                |r| format!("{table_id} {}", r.destination),
                |r| {
                    let table_id = table_id.clone();
                    async move { self.provider.delete_route(&table_id, &r.destination).await }
                },
            )
            .await;
            self.best_effort_each(
                "route-table",
                vec![table_id],
                report,
                |id| id.clone(),
                |id| async move { self.provider.delete_route_table(&id).await },
            )
            .await;
        }
        Ok(())
    }

    /// Delete every network ACL not flagged as default
    async fn prune_network_acls(
        &self,
        network_id: &str,
        report: &mut TeardownReport,
    ) -> Result<()> {
        let acls: Vec<_> = self
            .provider
            .list_network_acls(network_id)
            .await?
            .into_iter()
            .filter(|acl| !acl.is_default)
            .collect();
        self.best_effort_each(
            "network-acl",
            acls,
            report,
            |acl| acl.id.clone(),
            |acl| async move { self.provider.delete_network_acl(&acl.id).await },
        )
        .await;
        Ok(())
    }

    /// Detach and delete every network interface in every subnet. An
    /// attached interface blocks the subnet delete; detached ones skip
    /// straight to the delete.
    async fn delete_network_interfaces(
        &self,
        network_id: &str,
        report: &mut TeardownReport,
    ) -> Result<()> {
        let subnets = self.provider.list_subnets(network_id).await?;
        for subnet in subnets {
            let interfaces = self.provider.list_network_interfaces(&subnet.id).await?;
            self.best_effort_each(
                "network-interface",
                interfaces,
                report,
                |eni| eni.id.clone(),
                |eni| async move {
                    if let Some(attachment_id) = &eni.attachment_id {
                        self.provider.detach_network_interface(attachment_id).await?;
                    }
                    self.provider.delete_network_interface(&eni.id).await
                },
            )
            .await;
        }
        Ok(())
    }

    /// Drain the instances of each subnet, re-sweep interfaces across the
    /// whole network, then delete the subnet. A drain failure keeps the
    /// subnet for the next pass; other subnets are still processed.
    async fn delete_subnets(&self, network_id: &str, report: &mut TeardownReport) -> Result<()> {
        let subnets = self.provider.list_subnets(network_id).await?;
        for subnet in subnets {
            if let Err(e) = self.drain_instances(&subnet.id, report).await {
                warn!(
                    subnet_id = %subnet.id,
                    error = %e,
                    "Instance drain failed, subnet kept for the next pass"
                );
                report.failed += 1;
                continue;
            }
            // Interfaces released by the terminations above may linger; a
            // network-wide re-sweep catches them before the subnet delete.
            if let Err(e) = self.delete_network_interfaces(network_id, report).await {
                warn!(vpc_id = %network_id, error = %e, "Interface re-sweep failed");
            }
            self.best_effort_each(
                "subnet",
                vec![subnet.id],
                report,
                |id| id.clone(),
                |id| async move { self.provider.delete_subnet(&id).await },
            )
            .await;
        }
        Ok(())
    }

    /// Terminate every non-terminated instance of the subnet (skipping ones
    /// already shutting down) and block until each reports terminated.
    async fn drain_instances(&self, subnet_id: &str, report: &mut TeardownReport) -> Result<()> {
        let instances = self.provider.list_instances(subnet_id).await?;
        for instance in instances {
            if instance.state.is_terminated() {
                continue;
            }
            if self.config.dry_run {
                info!(instance_id = %instance.id, "[dry run] Would terminate");
                report.skipped += 1;
                continue;
            }
            if !instance.state.is_shutting_down() {
                match self.provider.terminate_instance(&instance.id).await {
                    Ok(()) => info!(instance_id = %instance.id, "Terminating instance"),
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => return Err(e),
                }
            }
            self.wait_for_terminated(&instance.id).await?;
        }
        Ok(())
    }

    /// Bounded poll until the provider reports the instance terminated. A
    /// vanished instance counts as terminated.
    async fn wait_for_terminated(&self, instance_id: &str) -> Result<()> {
        let start = Instant::now();
        loop {
            match self.provider.instance_state(instance_id).await {
                Ok(state) if state.is_terminated() => return Ok(()),
                Ok(state) => {
                    debug!(instance_id, state = %state, "Waiting for instance to terminate")
                }
                Err(e) if e.is_not_found() => return Ok(()),
                Err(e) => warn!(instance_id, error = %e, "Instance state check failed"),
            }
            if start.elapsed() >= self.config.drain.timeout {
                return Err(CloudError::Timeout(format!(
                    "instance {instance_id} did not reach terminated within {:?}",
                    self.config.drain.timeout
                )));
            }
            sleep(self.config.drain.poll_interval).await;
        }
    }

    /// Delete-only second pass over the gateways. Detaching happened in the
    /// first stage; anything still listed here just gets a delete attempt.
    async fn sweep_gateways(&self, network_id: &str, report: &mut TeardownReport) -> Result<()> {
        let gateways = self.provider.list_gateways(network_id).await?;
        self.best_effort_each(
            "internet-gateway",
            gateways,
            report,
            |gw| gw.id.clone(),
            |gw| async move { self.provider.delete_gateway(&gw.id).await },
        )
        .await;
        Ok(())
    }
}
