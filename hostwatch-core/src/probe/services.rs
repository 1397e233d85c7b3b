//! Watched service checks

use std::sync::Arc;

use futures::future::join_all;

use crate::config::TargetRegistry;
use crate::error::{ProbeError, ProbeResult};
use crate::exec::CommandExecutor;

use super::models::ServiceState;

/// Queries `systemctl is-active` for each watched service of a target
#[derive(Debug, Clone)]
pub struct ServiceChecker {
    registry: Arc<TargetRegistry>,
    executor: Arc<CommandExecutor>,
}

impl ServiceChecker {
    /// Creates a checker on top of the executor
    #[must_use]
    pub const fn new(registry: Arc<TargetRegistry>, executor: Arc<CommandExecutor>) -> Self {
        Self { registry, executor }
    }

    /// Returns one state per watched service, in configuration order
    ///
    /// A failed query only affects its own entry.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::UnknownTarget` if the target is not registered.
    pub async fn check_services(&self, target: &str) -> ProbeResult<Vec<ServiceState>> {
        let config = self
            .registry
            .get(target)
            .ok_or_else(|| ProbeError::UnknownTarget(target.to_string()))?;

        let checks = config
            .watched_services
            .iter()
            .map(|service| self.check_one(target, service));
        Ok(join_all(checks).await)
    }

    async fn check_one(&self, target: &str, service: &str) -> ServiceState {
        if !is_safe_unit_name(service) {
            tracing::warn!(target_name = %target, service = %service, "Refusing to query service with unsafe name");
            return ServiceState::failed(service, "invalid service name");
        }

        match self
            .executor
            .exec(target, &format!("systemctl is-active {service}"), None)
            .await
        {
            // is-active exits non-zero for anything but "active"; stdout still carries the state
            Ok(result) => ServiceState::from_status(service, &result.stdout),
            Err(e) => {
                tracing::debug!(target_name = %target, service = %service, error = %e, "Service query failed");
                ServiceState::failed(service, e.to_string())
            }
        }
    }
}

/// systemd unit names: ASCII alphanumerics plus `:-_.@`
fn is_safe_unit_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.' | '@'))
}
