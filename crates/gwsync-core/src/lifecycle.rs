// ── Primary lifecycle ──
//
// The four entry points the orchestration framework calls. Each decodes
// the store, runs its remote calls in sequence and, after any mutation,
// reads the gateway back so the store reflects what the controller holds.

use strum::Display;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::ReconcileError;
use crate::ha::{self, HaPlan};
use crate::marshal::{RetryClass, Step, creation_follow_ups, to_create_request, to_update_request};
use crate::model::{GatewayConfig, fields};
use crate::options::ReconcilerOptions;
use crate::plane::ControlPlane;
use crate::project::project;
use crate::resource::ResourceData;
use crate::retry::with_retry;

/// Lifecycle phase of one gateway resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Absent,
    Creating,
    Present,
    Updating,
    Deleting,
}

impl Phase {
    /// Whether `next` may follow `self`.
    pub fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Absent, Self::Creating)
                | (Self::Creating | Self::Updating, Self::Present)
                | (Self::Present, Self::Updating | Self::Deleting)
                | (Self::Deleting, Self::Absent)
        )
    }
}

fn transition(from: Phase, to: Phase) {
    if from.allows(to) {
        info!(%from, %to, "phase");
    } else {
        warn!(%from, %to, "unexpected phase transition");
    }
}

/// Result of a Read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The gateway exists; `drifted` lists declared fields whose remote
    /// value differs from the store.
    Present { drifted: Vec<&'static str> },
    /// The controller no longer knows the gateway. The identifier has
    /// been cleared.
    Gone,
}

/// Drives one gateway (and its HA sibling) through its lifecycle.
pub struct GatewayReconciler<P> {
    plane: P,
    options: ReconcilerOptions,
}

impl<P: ControlPlane> GatewayReconciler<P> {
    pub fn new(plane: P, options: ReconcilerOptions) -> Self {
        Self { plane, options }
    }

    pub fn plane(&self) -> &P {
        &self.plane
    }

    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    // ── Create ───────────────────────────────────────────────────────

    /// Launch the gateway, apply its follow-up settings and read it back.
    ///
    /// The identifier is recorded as soon as the primary exists, so a
    /// failure in a later call leaves a resource the next Update can
    /// finish instead of one that is launched twice.
    pub async fn create(&self, d: &mut dyn ResourceData) -> Result<(), ReconcileError> {
        let cfg = GatewayConfig::from_resource(d)?;
        let span = info_span!("create", gw_name = %cfg.gw_name);
        self.run_create(d, &cfg).instrument(span).await
    }

    async fn run_create(
        &self,
        d: &mut dyn ResourceData,
        cfg: &GatewayConfig,
    ) -> Result<(), ReconcileError> {
        let request = to_create_request(cfg)?;
        ha::check_consistency(cfg, cfg.has_ha())?;

        transition(Phase::Absent, Phase::Creating);
        let id = self
            .plane
            .create_gateway(&request)
            .await
            .map_err(ReconcileError::remote("create gateway"))?;
        d.set_id(&id);
        info!(%id, "gateway created");

        let (before, after): (Vec<Step>, Vec<Step>) =
            creation_follow_ups(cfg, &self.options.creation_defaults)
                .into_iter()
                .partition(|step| step.group.precedes_sibling());

        self.run_steps(&before).await?;
        if cfg.has_ha() {
            ha::create(&self.plane, cfg).await?;
        }
        self.run_steps(&after).await?;

        transition(Phase::Creating, Phase::Present);
        self.read_back(d).await
    }

    // ── Read ─────────────────────────────────────────────────────────

    /// Refresh the store from the controller.
    pub async fn read(&self, d: &mut dyn ResourceData) -> Result<ReadOutcome, ReconcileError> {
        let span = info_span!("read", gw_name = %d.id());
        self.run_read(d).instrument(span).await
    }

    async fn run_read(&self, d: &mut dyn ResourceData) -> Result<ReadOutcome, ReconcileError> {
        let id = d.id();
        if id.is_empty() {
            return Ok(ReadOutcome::Gone);
        }

        let remote = match self.plane.get_gateway(&id).await {
            Ok(info) => info,
            Err(e) if e.is_not_found() => {
                info!(%id, "gateway no longer exists");
                d.set_id("");
                return Ok(ReadOutcome::Gone);
            }
            Err(e) => {
                return Err(ReconcileError::RemoteCall {
                    operation: "get gateway".into(),
                    source: e,
                });
            }
        };

        let sibling = if remote.ha_gw_name.is_empty() {
            None
        } else {
            match self.plane.get_gateway(&remote.ha_gw_name).await {
                Ok(info) => Some(info),
                Err(e) if e.is_not_found() => {
                    debug!(ha_gw_name = %remote.ha_gw_name, "HA gateway not found");
                    None
                }
                Err(e) => {
                    return Err(ReconcileError::RemoteCall {
                        operation: "get HA gateway".into(),
                        source: e,
                    });
                }
            }
        };

        let declared = declared_or_imported(d)?;
        let projected = project(&remote, sibling.as_ref(), &declared)?;
        let drifted = declared.drift(&projected)?;
        if !drifted.is_empty() {
            info!(fields = ?drifted, "remote state differs from the store");
        }
        projected.write_resource(d)?;

        Ok(ReadOutcome::Present { drifted })
    }

    /// Read after a mutation. The gateway was just written, so it
    /// vanishing is an error rather than an external deletion.
    async fn read_back(&self, d: &mut dyn ResourceData) -> Result<(), ReconcileError> {
        match self.run_read(d).await? {
            ReadOutcome::Present { .. } => Ok(()),
            ReadOutcome::Gone => Err(ReconcileError::InvalidState {
                message: "gateway disappeared while it was being configured".into(),
            }),
        }
    }

    // ── Update ───────────────────────────────────────────────────────

    /// Apply the changed field groups, then read back.
    ///
    /// Nothing is sent when no group changed. Immutable fields and
    /// invalid configurations are rejected before the first call.
    pub async fn update(&self, d: &mut dyn ResourceData) -> Result<(), ReconcileError> {
        let new = GatewayConfig::from_resource(d)?;
        let span = info_span!("update", gw_name = %new.gw_name);
        self.run_update(d, &new).instrument(span).await
    }

    async fn run_update(
        &self,
        d: &mut dyn ResourceData,
        new: &GatewayConfig,
    ) -> Result<(), ReconcileError> {
        if let Some(field) = fields::IMMUTABLE.iter().find(|key| d.has_change(key)) {
            return Err(ReconcileError::ImmutableField {
                field: (*field).to_owned(),
            });
        }
        crate::validate::validate(new)?;

        let old = GatewayConfig::prior_from_resource(d)?;
        let plan = ha::plan(&old, new)?;
        let steps = to_update_request(new, |key| d.has_change(key));

        if steps.is_empty() && plan == HaPlan::Unchanged {
            debug!("no changes");
            return Ok(());
        }

        transition(Phase::Present, Phase::Updating);
        let (before, after): (Vec<Step>, Vec<Step>) = steps
            .into_iter()
            .partition(|step| step.group.precedes_sibling());

        self.run_steps(&before).await?;
        ha::execute(&self.plane, &plan, &old, new).await?;
        self.run_steps(&after).await?;

        transition(Phase::Updating, Phase::Present);
        self.read_back(d).await
    }

    // ── Delete ───────────────────────────────────────────────────────

    /// Delete the sibling, then the primary. Gateways that are already
    /// gone count as deleted.
    pub async fn delete(&self, d: &mut dyn ResourceData) -> Result<(), ReconcileError> {
        let cfg = GatewayConfig::prior_from_resource(d)?;
        let span = info_span!("delete", gw_name = %cfg.gw_name);
        self.run_delete(d, &cfg).instrument(span).await
    }

    async fn run_delete(
        &self,
        d: &mut dyn ResourceData,
        cfg: &GatewayConfig,
    ) -> Result<(), ReconcileError> {
        let id = d.id();
        if id.is_empty() {
            debug!("nothing to delete");
            return Ok(());
        }

        transition(Phase::Present, Phase::Deleting);
        if cfg.has_ha() || !cfg.outputs.ha_gw_name.is_empty() {
            ha::delete(&self.plane, cfg).await?;
        }

        match self.plane.delete_gateway(cfg.cloud_type, &id).await {
            Ok(()) => info!(%id, "gateway deleted"),
            Err(e) if e.is_not_found() => debug!(%id, "gateway already gone"),
            Err(e) => {
                return Err(ReconcileError::RemoteCall {
                    operation: "delete gateway".into(),
                    source: e,
                });
            }
        }

        d.set_id("");
        transition(Phase::Deleting, Phase::Absent);
        Ok(())
    }

    // ── Narrow edits ─────────────────────────────────────────────────

    async fn run_steps(&self, steps: &[Step]) -> Result<(), ReconcileError> {
        for step in steps {
            self.run_step(step).await?;
        }
        Ok(())
    }

    async fn run_step(&self, step: &Step) -> Result<(), ReconcileError> {
        let plane = &self.plane;
        let action = &step.action;
        let operation = action.action_name();
        debug!(group = %step.group, operation, "applying");

        let policy = match step.group.retry() {
            RetryClass::None => {
                return plane
                    .apply(action)
                    .await
                    .map_err(ReconcileError::remote(operation));
            }
            RetryClass::Routes => self.options.route_retry,
            RetryClass::Advertise => self.options.advertise_retry,
        };
        with_retry(operation, policy, move || plane.apply(action)).await
    }
}

/// The declared configuration, or an empty one carrying no preferences
/// when the store only holds an identifier (an imported gateway).
fn declared_or_imported(d: &dyn ResourceData) -> Result<GatewayConfig, ReconcileError> {
    if d.get(fields::CLOUD_TYPE).is_null() {
        return Ok(GatewayConfig::default());
    }
    GatewayConfig::from_resource(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_cycle() {
        let cycle = [
            Phase::Absent,
            Phase::Creating,
            Phase::Present,
            Phase::Updating,
            Phase::Present,
            Phase::Deleting,
            Phase::Absent,
        ];
        assert!(cycle.windows(2).all(|pair| pair[0].allows(pair[1])));
    }

    #[test]
    fn phase_shortcuts_are_refused() {
        assert!(!Phase::Absent.allows(Phase::Present));
        assert!(!Phase::Creating.allows(Phase::Updating));
        assert!(!Phase::Deleting.allows(Phase::Present));
        assert!(!Phase::Present.allows(Phase::Creating));
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::Updating.to_string(), "updating");
    }
}
