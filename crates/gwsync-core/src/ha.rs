// ── HA sibling manager ──
//
// Decides what happens to the optional sibling gateway from the old and
// new HA settings, checks that the per-feature HA fields are consistent
// before anything destructive is issued, and carries the plan out.

use tracing::{debug, info};

use crate::error::ReconcileError;
use crate::marshal::to_sibling_request;
use crate::model::{CloudSet, GatewayConfig, fields};
use crate::plane::ControlPlane;

/// What to do with the sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaPlan {
    Unchanged,
    Create,
    Delete,
    /// Same placement, new size: resize in place.
    Resize { gw_size: String },
    /// Placement changed: delete, then create with the new placement.
    Recreate,
}

/// Work out the sibling transition from `old` to `new`.
///
/// The HA field consistency of `new` is checked before the plan is
/// returned, so a rejected update never removes the existing sibling.
pub fn plan(old: &GatewayConfig, new: &GatewayConfig) -> Result<HaPlan, ReconcileError> {
    let plan = match (old.has_ha(), new.has_ha()) {
        (false, false) => HaPlan::Unchanged,
        (false, true) => HaPlan::Create,
        (true, false) => HaPlan::Delete,
        (true, true) => {
            let moved = old
                .ha
                .placement()
                .iter()
                .zip(new.ha.placement().iter())
                .any(|((_, before), (_, after))| before != after);

            if moved {
                HaPlan::Recreate
            } else if old.ha.ha_eip != new.ha.ha_eip {
                return Err(ReconcileError::ImmutableField {
                    field: fields::HA_EIP.to_owned(),
                });
            } else if old.ha.ha_azure_eip_name_resource_group
                != new.ha.ha_azure_eip_name_resource_group
            {
                return Err(ReconcileError::ImmutableField {
                    field: fields::HA_AZURE_EIP_NAME_RESOURCE_GROUP.to_owned(),
                });
            } else if old.ha.ha_gw_size != new.ha.ha_gw_size {
                HaPlan::Resize {
                    gw_size: new.ha.ha_gw_size.clone(),
                }
            } else {
                HaPlan::Unchanged
            }
        }
    };

    check_consistency(new, plan.touches_sibling())?;
    Ok(plan)
}

impl HaPlan {
    /// Whether the sibling is being created or reshaped.
    fn touches_sibling(&self) -> bool {
        matches!(self, Self::Create | Self::Recreate | Self::Resize { .. })
    }
}

/// Presence rules for HA fields.
///
/// `ha_gw_size` follows the sibling itself. The out-of-band, private
/// mode and IPv6 placements follow their feature: mandatory when the
/// feature is on and the sibling is being created or changed, empty when
/// the feature is off or there is no sibling.
pub fn check_consistency(cfg: &GatewayConfig, touching: bool) -> Result<(), ReconcileError> {
    let ha = &cfg.ha;
    let present = cfg.has_ha();

    if present && ha.ha_gw_size.is_empty() {
        return Err(ReconcileError::validation(
            fields::HA_GW_SIZE,
            "required when an HA gateway is declared",
        ));
    }
    if !present && !ha.ha_gw_size.is_empty() {
        return Err(ReconcileError::validation(
            fields::HA_GW_SIZE,
            "must be empty when no HA gateway is declared",
        ));
    }

    let private_mode_zone =
        cfg.enable_private_mode && cfg.cloud_type.belongs_to(CloudSet::AWS_RELATED);
    let per_feature = [
        (
            fields::HA_OOB_MANAGEMENT_SUBNET,
            &ha.ha_oob_management_subnet,
            cfg.enable_private_oob,
            fields::ENABLE_PRIVATE_OOB,
        ),
        (
            fields::HA_OOB_AVAILABILITY_ZONE,
            &ha.ha_oob_availability_zone,
            cfg.enable_private_oob,
            fields::ENABLE_PRIVATE_OOB,
        ),
        (
            fields::HA_PRIVATE_MODE_SUBNET_ZONE,
            &ha.ha_private_mode_subnet_zone,
            private_mode_zone,
            fields::ENABLE_PRIVATE_MODE,
        ),
        (
            fields::HA_SUBNET_IPV6_CIDR,
            &ha.ha_subnet_ipv6_cidr,
            cfg.enable_ipv6,
            fields::ENABLE_IPV6,
        ),
    ];

    for (field, value, feature_on, feature) in per_feature {
        let wanted = feature_on && present;
        if wanted && touching && value.is_empty() {
            return Err(ReconcileError::validation(
                field,
                format!("required when {feature} is enabled and an HA gateway is declared"),
            ));
        }
        if !wanted && !value.is_empty() {
            return Err(ReconcileError::validation(
                field,
                format!("must be empty unless {feature} is enabled and an HA gateway is declared"),
            ));
        }
    }
    Ok(())
}

/// Carry out `plan`. `old` names the sibling being removed, `new` the
/// one being launched.
pub async fn execute<P: ControlPlane>(
    plane: &P,
    plan: &HaPlan,
    old: &GatewayConfig,
    new: &GatewayConfig,
) -> Result<(), ReconcileError> {
    match plan {
        HaPlan::Unchanged => {
            debug!("HA gateway unchanged");
            Ok(())
        }
        HaPlan::Create => create(plane, new).await,
        HaPlan::Delete => delete(plane, old).await,
        HaPlan::Resize { gw_size } => {
            let gw_name = new.sibling_name();
            info!(%gw_name, %gw_size, "resizing HA gateway");
            let action = gwsync_api::GatewayAction::Resize {
                gw_name,
                gw_size: gw_size.clone(),
            };
            plane
                .apply(&action)
                .await
                .map_err(ReconcileError::remote("resize HA gateway"))
        }
        HaPlan::Recreate => {
            delete(plane, old).await?;
            create(plane, new).await
        }
    }
}

pub(crate) async fn create<P: ControlPlane>(
    plane: &P,
    cfg: &GatewayConfig,
) -> Result<(), ReconcileError> {
    let request = to_sibling_request(cfg);
    info!(primary = %cfg.gw_name, subnet = %request.gw_subnet, "creating HA gateway");
    let name = plane
        .create_ha_gateway(&request)
        .await
        .map_err(ReconcileError::remote("create HA gateway"))?;
    debug!(%name, "HA gateway created");
    Ok(())
}

/// Delete the sibling of `cfg`. A sibling that is already gone counts
/// as deleted.
pub(crate) async fn delete<P: ControlPlane>(
    plane: &P,
    cfg: &GatewayConfig,
) -> Result<(), ReconcileError> {
    let gw_name = cfg.sibling_name();
    info!(%gw_name, "deleting HA gateway");
    match plane.delete_gateway(cfg.cloud_type, &gw_name).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            debug!(%gw_name, "HA gateway already gone");
            Ok(())
        }
        Err(e) => Err(ReconcileError::RemoteCall {
            operation: "delete HA gateway".into(),
            source: e,
        }),
    }
}
