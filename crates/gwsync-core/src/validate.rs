// ── Cross-field validation ──
//
// An ordered rule table checked before any remote call. Each rule looks
// at the cloud family and the presence of one field; the first violated
// rule is reported. Rules do not depend on each other.

use crate::codec::DELIMITER;
use crate::error::ReconcileError;
use crate::model::{CloudSet, GatewayConfig, fields};

type Check = fn(&GatewayConfig) -> bool;

enum Constraint {
    /// The field may only be set in these clouds.
    OnlyFor(CloudSet),
    /// The field must be set in these clouds when the condition holds.
    RequiredFor {
        clouds: CloudSet,
        when: Check,
        condition: &'static str,
    },
    /// The field cannot be combined with another one.
    ExclusiveWith { other: &'static str, other_set: Check },
    /// The field needs another setting to be in effect.
    Requires {
        prerequisite: &'static str,
        satisfied: Check,
    },
    /// The field's value must satisfy a check.
    Value { valid: Check, message: &'static str },
}

struct Rule {
    field: &'static str,
    is_set: Check,
    constraint: Constraint,
}

impl Rule {
    fn violation(&self, cfg: &GatewayConfig) -> Option<String> {
        let cloud = cfg.cloud_type;
        let set = (self.is_set)(cfg);
        match &self.constraint {
            Constraint::OnlyFor(clouds) => (set && !cloud.belongs_to(*clouds))
                .then(|| format!("only supported for {clouds}, not {cloud}")),
            Constraint::RequiredFor {
                clouds,
                when,
                condition,
            } => (!set && cloud.belongs_to(*clouds) && when(cfg)).then(|| {
                if condition.is_empty() {
                    format!("required for {cloud}")
                } else {
                    format!("required for {cloud} when {condition}")
                }
            }),
            Constraint::ExclusiveWith { other, other_set } => {
                (set && other_set(cfg)).then(|| format!("cannot be combined with {other}"))
            }
            Constraint::Requires {
                prerequisite,
                satisfied,
            } => (set && !satisfied(cfg)).then(|| format!("requires {prerequisite}")),
            Constraint::Value { valid, message } => {
                (set && !valid(cfg)).then(|| (*message).to_owned())
            }
        }
    }
}

const fn only_for(field: &'static str, is_set: Check, clouds: CloudSet) -> Rule {
    Rule {
        field,
        is_set,
        constraint: Constraint::OnlyFor(clouds),
    }
}

const fn required(
    field: &'static str,
    is_set: Check,
    clouds: CloudSet,
    when: Check,
    condition: &'static str,
) -> Rule {
    Rule {
        field,
        is_set,
        constraint: Constraint::RequiredFor {
            clouds,
            when,
            condition,
        },
    }
}

const fn requires(
    field: &'static str,
    is_set: Check,
    prerequisite: &'static str,
    satisfied: Check,
) -> Rule {
    Rule {
        field,
        is_set,
        constraint: Constraint::Requires {
            prerequisite,
            satisfied,
        },
    }
}

fn always(_: &GatewayConfig) -> bool {
    true
}

#[allow(clippy::too_many_lines)]
fn rules() -> Vec<Rule> {
    use CloudSet as C;

    vec![
        // ── Cloud scope ──────────────────────────────────────────────
        only_for(fields::ZONE, |c| !c.zone.is_empty(), C::AZURE_RELATED),
        only_for(
            fields::AVAILABILITY_DOMAIN,
            |c| !c.availability_domain.is_empty(),
            C::OCI_RELATED,
        ),
        only_for(
            fields::FAULT_DOMAIN,
            |c| !c.fault_domain.is_empty(),
            C::OCI_RELATED,
        ),
        only_for(fields::INSANE_MODE, |c| c.insane_mode, C::AWS_GCP_AZURE_OCI),
        only_for(
            fields::INSANE_MODE_AZ,
            |c| !c.insane_mode_az.is_empty(),
            C::AWS_RELATED,
        ),
        only_for(
            fields::AZURE_EIP_NAME_RESOURCE_GROUP,
            |c| !c.azure_eip_name_resource_group.is_empty(),
            C::AZURE_RELATED,
        ),
        only_for(
            fields::ENABLE_PRIVATE_OOB,
            |c| c.enable_private_oob,
            C::AWS_RELATED,
        ),
        only_for(
            fields::ENABLE_PRIVATE_MODE,
            |c| c.enable_private_mode,
            C::AWS_AZURE,
        ),
        only_for(
            fields::PRIVATE_MODE_SUBNET_ZONE,
            |c| !c.private_mode_subnet_zone.is_empty(),
            C::AWS_RELATED,
        ),
        only_for(fields::ENABLE_IPV6, |c| c.enable_ipv6, C::AWS_AZURE),
        only_for(
            fields::ENABLE_MONITOR_GATEWAY_SUBNETS,
            |c| c.enable_monitor_gateway_subnets,
            C::AWS_RELATED,
        ),
        only_for(
            fields::ENABLE_JUMBO_FRAME,
            |c| c.enable_jumbo_frame == Some(true),
            C::AWS_GCP_AZURE_EDGE,
        ),
        only_for(fields::TAGS, |c| !c.tags.is_empty(), C::AWS_GCP_AZURE),
        only_for(fields::HA_ZONE, |c| !c.ha.ha_zone.is_empty(), C::AZURE_GCP),
        only_for(
            fields::HA_AVAILABILITY_DOMAIN,
            |c| !c.ha.ha_availability_domain.is_empty(),
            C::OCI_RELATED,
        ),
        only_for(
            fields::HA_FAULT_DOMAIN,
            |c| !c.ha.ha_fault_domain.is_empty(),
            C::OCI_RELATED,
        ),
        only_for(
            fields::HA_INSANE_MODE_AZ,
            |c| !c.ha.ha_insane_mode_az.is_empty(),
            C::AWS_RELATED,
        ),
        only_for(
            fields::HA_AZURE_EIP_NAME_RESOURCE_GROUP,
            |c| !c.ha.ha_azure_eip_name_resource_group.is_empty(),
            C::AZURE_RELATED,
        ),
        // ── Required by cloud ────────────────────────────────────────
        required(
            fields::AVAILABILITY_DOMAIN,
            |c| !c.availability_domain.is_empty(),
            C::OCI_RELATED,
            always,
            "",
        ),
        required(
            fields::FAULT_DOMAIN,
            |c| !c.fault_domain.is_empty(),
            C::OCI_RELATED,
            always,
            "",
        ),
        required(
            fields::INSANE_MODE_AZ,
            |c| !c.insane_mode_az.is_empty(),
            C::AWS_RELATED,
            |c| c.insane_mode,
            "insane_mode is enabled",
        ),
        required(
            fields::AZURE_EIP_NAME_RESOURCE_GROUP,
            |c| !c.azure_eip_name_resource_group.is_empty(),
            C::AZURE_RELATED,
            |c| !c.eip.is_empty(),
            "eip is set",
        ),
        required(
            fields::PRIVATE_MODE_SUBNET_ZONE,
            |c| !c.private_mode_subnet_zone.is_empty(),
            C::AWS_RELATED,
            |c| c.enable_private_mode,
            "enable_private_mode is enabled",
        ),
        required(
            fields::HA_AVAILABILITY_DOMAIN,
            |c| !c.ha.ha_availability_domain.is_empty(),
            C::OCI_RELATED,
            GatewayConfig::has_ha,
            "ha_subnet is set",
        ),
        required(
            fields::HA_FAULT_DOMAIN,
            |c| !c.ha.ha_fault_domain.is_empty(),
            C::OCI_RELATED,
            GatewayConfig::has_ha,
            "ha_subnet is set",
        ),
        required(
            fields::HA_INSANE_MODE_AZ,
            |c| !c.ha.ha_insane_mode_az.is_empty(),
            C::AWS_RELATED,
            |c| c.insane_mode && c.has_ha(),
            "insane_mode is enabled and ha_subnet is set",
        ),
        required(
            fields::HA_AZURE_EIP_NAME_RESOURCE_GROUP,
            |c| !c.ha.ha_azure_eip_name_resource_group.is_empty(),
            C::AZURE_RELATED,
            |c| !c.ha.ha_eip.is_empty(),
            "ha_eip is set",
        ),
        // ── Required by feature ──────────────────────────────────────
        required(
            fields::OOB_MANAGEMENT_SUBNET,
            |c| !c.oob_management_subnet.is_empty(),
            C::ALL,
            |c| c.enable_private_oob,
            "enable_private_oob is enabled",
        ),
        required(
            fields::OOB_AVAILABILITY_ZONE,
            |c| !c.oob_availability_zone.is_empty(),
            C::ALL,
            |c| c.enable_private_oob,
            "enable_private_oob is enabled",
        ),
        required(
            fields::PRIVATE_MODE_LB_VPC_ID,
            |c| !c.private_mode_lb_vpc_id.is_empty(),
            C::ALL,
            |c| c.enable_private_mode,
            "enable_private_mode is enabled",
        ),
        required(
            fields::SUBNET_IPV6_CIDR,
            |c| !c.subnet_ipv6_cidr.is_empty(),
            C::ALL,
            |c| c.enable_ipv6,
            "enable_ipv6 is enabled",
        ),
        required(
            fields::LOCAL_AS_NUMBER,
            |c| !c.local_as_number.is_empty(),
            C::ALL,
            |c| c.enable_bgp,
            "enable_bgp is enabled",
        ),
        // ── Exclusions ───────────────────────────────────────────────
        Rule {
            field: fields::ENABLE_PRIVATE_MODE,
            is_set: |c| c.enable_private_mode,
            constraint: Constraint::ExclusiveWith {
                other: fields::EIP,
                other_set: |c| !c.eip.is_empty(),
            },
        },
        Rule {
            field: fields::ENABLE_PRIVATE_MODE,
            is_set: |c| c.enable_private_mode,
            constraint: Constraint::ExclusiveWith {
                other: fields::HA_EIP,
                other_set: |c| !c.ha.ha_eip.is_empty(),
            },
        },
        // ── Prerequisites ────────────────────────────────────────────
        requires(
            fields::INSANE_MODE_AZ,
            |c| !c.insane_mode_az.is_empty(),
            fields::INSANE_MODE,
            |c| c.insane_mode,
        ),
        requires(
            fields::HA_INSANE_MODE_AZ,
            |c| !c.ha.ha_insane_mode_az.is_empty(),
            fields::INSANE_MODE,
            |c| c.insane_mode,
        ),
        requires(
            fields::EIP,
            |c| !c.eip.is_empty(),
            "allocate_new_eip = false",
            |c| !c.allocate_new_eip,
        ),
        requires(
            fields::HA_EIP,
            |c| !c.ha.ha_eip.is_empty(),
            "allocate_new_eip = false",
            |c| !c.allocate_new_eip,
        ),
        requires(
            fields::OOB_MANAGEMENT_SUBNET,
            |c| !c.oob_management_subnet.is_empty(),
            fields::ENABLE_PRIVATE_OOB,
            |c| c.enable_private_oob,
        ),
        requires(
            fields::OOB_AVAILABILITY_ZONE,
            |c| !c.oob_availability_zone.is_empty(),
            fields::ENABLE_PRIVATE_OOB,
            |c| c.enable_private_oob,
        ),
        requires(
            fields::PRIVATE_MODE_LB_VPC_ID,
            |c| !c.private_mode_lb_vpc_id.is_empty(),
            fields::ENABLE_PRIVATE_MODE,
            |c| c.enable_private_mode,
        ),
        requires(
            fields::PRIVATE_MODE_SUBNET_ZONE,
            |c| !c.private_mode_subnet_zone.is_empty(),
            fields::ENABLE_PRIVATE_MODE,
            |c| c.enable_private_mode,
        ),
        requires(
            fields::SUBNET_IPV6_CIDR,
            |c| !c.subnet_ipv6_cidr.is_empty(),
            fields::ENABLE_IPV6,
            |c| c.enable_ipv6,
        ),
        requires(
            fields::MONITOR_EXCLUDE_LIST,
            |c| !c.monitor_exclude_list.is_empty(),
            fields::ENABLE_MONITOR_GATEWAY_SUBNETS,
            |c| c.enable_monitor_gateway_subnets,
        ),
        requires(
            fields::LOCAL_AS_NUMBER,
            |c| !c.local_as_number.is_empty(),
            fields::ENABLE_BGP,
            |c| c.enable_bgp,
        ),
        requires(
            fields::ENABLE_BGP_ECMP,
            |c| c.enable_bgp_ecmp,
            fields::ENABLE_BGP,
            |c| c.enable_bgp,
        ),
        requires(
            fields::ENABLE_PRESERVE_AS_PATH,
            |c| c.enable_preserve_as_path,
            fields::ENABLE_BGP,
            |c| c.enable_bgp,
        ),
        requires(
            fields::ENABLE_LEARNED_CIDRS_APPROVAL,
            |c| c.enable_learned_cidrs_approval,
            fields::ENABLE_BGP,
            |c| c.enable_bgp,
        ),
        requires(
            fields::APPROVED_LEARNED_CIDRS,
            |c| !c.approved_learned_cidrs.is_empty(),
            fields::ENABLE_LEARNED_CIDRS_APPROVAL,
            |c| c.enable_learned_cidrs_approval,
        ),
        requires(
            fields::BGP_MANUAL_ADVERTISE_CIDRS,
            |c| !c.bgp_manual_advertise_cidrs.is_empty(),
            fields::ENABLE_BGP,
            |c| c.enable_bgp,
        ),
        requires(
            fields::ENABLE_ACTIVE_STANDBY,
            |c| c.enable_active_standby,
            "an HA gateway",
            GatewayConfig::has_ha,
        ),
        requires(
            fields::ENABLE_ACTIVE_STANDBY_PREEMPTIVE,
            |c| c.enable_active_standby_preemptive,
            fields::ENABLE_ACTIVE_STANDBY,
            |c| c.enable_active_standby,
        ),
        // ── Values ───────────────────────────────────────────────────
        Rule {
            field: fields::TUNNEL_DETECTION_TIME,
            is_set: |c| c.tunnel_detection_time.is_some(),
            constraint: Constraint::Value {
                valid: |c| {
                    c.tunnel_detection_time
                        .is_some_and(|secs| (20..=600).contains(&secs))
                },
                message: "must be between 20 and 600 seconds",
            },
        },
        Rule {
            field: fields::LOCAL_AS_NUMBER,
            is_set: |c| !c.local_as_number.is_empty(),
            constraint: Constraint::Value {
                valid: |c| c.local_as_number.parse::<u32>().is_ok_and(|asn| asn > 0),
                message: "must be a number between 1 and 4294967295",
            },
        },
    ]
}

/// Values packed into the composite placement fields.
fn placement_tokens(cfg: &GatewayConfig) -> [(&'static str, &str); 12] {
    let ha = &cfg.ha;
    [
        (fields::SUBNET, &cfg.subnet),
        (fields::ZONE, &cfg.zone),
        (fields::INSANE_MODE_AZ, &cfg.insane_mode_az),
        (fields::PRIVATE_MODE_SUBNET_ZONE, &cfg.private_mode_subnet_zone),
        (fields::OOB_AVAILABILITY_ZONE, &cfg.oob_availability_zone),
        (fields::SUBNET_IPV6_CIDR, &cfg.subnet_ipv6_cidr),
        (fields::HA_SUBNET, &ha.ha_subnet),
        (fields::HA_ZONE, &ha.ha_zone),
        (fields::HA_INSANE_MODE_AZ, &ha.ha_insane_mode_az),
        (fields::HA_PRIVATE_MODE_SUBNET_ZONE, &ha.ha_private_mode_subnet_zone),
        (fields::HA_OOB_AVAILABILITY_ZONE, &ha.ha_oob_availability_zone),
        (fields::HA_SUBNET_IPV6_CIDR, &ha.ha_subnet_ipv6_cidr),
    ]
}

/// Check `cfg` against every cross-field rule, in order, then make sure
/// no placement token contains the codec delimiter.
pub fn validate(cfg: &GatewayConfig) -> Result<(), ReconcileError> {
    if let Some(err) = rules().iter().find_map(|rule| {
        rule.violation(cfg)
            .map(|message| ReconcileError::validation(rule.field, message))
    }) {
        return Err(err);
    }

    match placement_tokens(cfg)
        .into_iter()
        .find(|(_, value)| value.contains(DELIMITER))
    {
        Some((field, _)) => Err(ReconcileError::validation(
            field,
            format!("must not contain \"{DELIMITER}\""),
        )),
        None => Ok(()),
    }
}
