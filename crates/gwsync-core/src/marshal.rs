// ── Configuration marshaling ──
//
// Turns a `GatewayConfig` into controller requests: the create payloads
// for the primary and its sibling, and the narrow `GatewayAction`s that
// bring individual feature groups in line after creation or on update.

use gwsync_api::{CreateGatewayPayload, CreateHaGatewayPayload, GatewayAction};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::codec::Placement;
use crate::error::ReconcileError;
use crate::model::{CloudSet, GatewayConfig, fields};
use crate::options::CreationDefaults;
use crate::validate::validate;

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

// ── Placement ────────────────────────────────────────────────────────

/// Composite placement of the primary.
pub fn primary_placement(cfg: &GatewayConfig) -> Placement {
    let cloud = cfg.cloud_type;
    let pick = |on: bool, value: &str| if on { value.to_owned() } else { String::new() };
    Placement {
        subnet: cfg.subnet.clone(),
        zone: pick(cloud.belongs_to(CloudSet::AZURE_RELATED), &cfg.zone),
        insane_mode_az: pick(
            cfg.insane_mode && cloud.belongs_to(CloudSet::AWS_RELATED),
            &cfg.insane_mode_az,
        ),
        private_mode_zone: pick(cfg.enable_private_mode, &cfg.private_mode_subnet_zone),
        oob_availability_zone: pick(cfg.enable_private_oob, &cfg.oob_availability_zone),
        ipv6_cidr: pick(cfg.enable_ipv6, &cfg.subnet_ipv6_cidr),
    }
}

/// Composite placement of the sibling.
pub fn sibling_placement(cfg: &GatewayConfig) -> Placement {
    let cloud = cfg.cloud_type;
    let ha = &cfg.ha;
    let pick = |on: bool, value: &str| if on { value.to_owned() } else { String::new() };
    Placement {
        subnet: ha.ha_subnet.clone(),
        zone: pick(cloud.belongs_to(CloudSet::AZURE_RELATED), &ha.ha_zone),
        insane_mode_az: pick(
            cfg.insane_mode && cloud.belongs_to(CloudSet::AWS_RELATED),
            &ha.ha_insane_mode_az,
        ),
        private_mode_zone: pick(cfg.enable_private_mode, &ha.ha_private_mode_subnet_zone),
        oob_availability_zone: pick(cfg.enable_private_oob, &ha.ha_oob_availability_zone),
        ipv6_cidr: pick(cfg.enable_ipv6, &ha.ha_subnet_ipv6_cidr),
    }
}

// ── Create ───────────────────────────────────────────────────────────

/// Validate `cfg` and build the primary create request.
pub fn to_create_request(cfg: &GatewayConfig) -> Result<CreateGatewayPayload, ReconcileError> {
    validate(cfg)?;

    let cloud = cfg.cloud_type;
    let oci = cloud.belongs_to(CloudSet::OCI_RELATED);
    let reuse_eip = !cfg.allocate_new_eip;

    Ok(CreateGatewayPayload {
        cloud_type: cloud.code(),
        account_name: cfg.account_name.clone(),
        gw_name: cfg.gw_name.clone(),
        vpc_id: cfg.vpc_id.clone(),
        vpc_reg: non_empty(&cfg.vpc_reg),
        gw_size: cfg.gw_size.clone(),
        gw_subnet: primary_placement(cfg).encode(),
        availability_domain: non_empty(&cfg.availability_domain).filter(|_| oci),
        fault_domain: non_empty(&cfg.fault_domain).filter(|_| oci),
        insane_mode: cfg.insane_mode,
        allocate_new_eip: cfg.allocate_new_eip,
        eip: non_empty(&cfg.eip).filter(|_| reuse_eip),
        azure_eip_name_resource_group: non_empty(&cfg.azure_eip_name_resource_group)
            .filter(|_| reuse_eip),
        private_oob: cfg.enable_private_oob,
        oob_mgmt_subnet: non_empty(&cfg.oob_management_subnet).filter(|_| cfg.enable_private_oob),
        private_mode_lb_vpc_id: non_empty(&cfg.private_mode_lb_vpc_id)
            .filter(|_| cfg.enable_private_mode),
        enable_ipv6: cfg.enable_ipv6,
        enable_bgp: cfg.enable_bgp,
        tags: (!cfg.tags.is_empty() && cloud.belongs_to(CloudSet::AWS_GCP_AZURE))
            .then(|| cfg.tags.clone()),
    })
}

/// Build the sibling create request. Consistency of the HA fields is
/// checked by the HA manager before this is called.
pub fn to_sibling_request(cfg: &GatewayConfig) -> CreateHaGatewayPayload {
    let cloud = cfg.cloud_type;
    let ha = &cfg.ha;
    let oci = cloud.belongs_to(CloudSet::OCI_RELATED);
    let reuse_eip = !cfg.allocate_new_eip;

    CreateHaGatewayPayload {
        primary_gw_name: cfg.gw_name.clone(),
        gw_subnet: sibling_placement(cfg).encode(),
        gw_size: ha.ha_gw_size.clone(),
        zone: non_empty(&ha.ha_zone).filter(|_| cloud.belongs_to(CloudSet::GCP_RELATED)),
        eip: non_empty(&ha.ha_eip).filter(|_| reuse_eip),
        azure_eip_name_resource_group: non_empty(&ha.ha_azure_eip_name_resource_group)
            .filter(|_| reuse_eip),
        availability_domain: non_empty(&ha.ha_availability_domain).filter(|_| oci),
        fault_domain: non_empty(&ha.ha_fault_domain).filter(|_| oci),
        oob_mgmt_subnet: non_empty(&ha.ha_oob_management_subnet)
            .filter(|_| cfg.enable_private_oob),
    }
}

// ── Narrow edits ─────────────────────────────────────────────────────

/// Retry behaviour of a group's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    None,
    Routes,
    Advertise,
}

/// Fields that are changed together through one controller action.
///
/// Declaration order is execution order: a group never runs before a
/// group it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum FieldGroup {
    GwSize,
    JumboFrame,
    GroGso,
    SingleAzHa,
    VpcDnsServer,
    MonitorSubnets,
    TunnelDetectionTime,
    LocalAsNumber,
    BgpEcmp,
    PreserveAsPath,
    LearnedCidrsApproval,
    ApprovedLearnedCidrs,
    BgpManualAdvertise,
    ActiveStandby,
    CustomizedRoutes,
    FilteredRoutes,
    IncludedRoutes,
    SingleIpSnat,
    Tags,
}

impl FieldGroup {
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::GwSize => &[fields::GW_SIZE],
            Self::JumboFrame => &[fields::ENABLE_JUMBO_FRAME],
            Self::GroGso => &[fields::ENABLE_GRO_GSO],
            Self::SingleAzHa => &[fields::SINGLE_AZ_HA],
            Self::VpcDnsServer => &[fields::ENABLE_VPC_DNS_SERVER],
            Self::MonitorSubnets => &[
                fields::ENABLE_MONITOR_GATEWAY_SUBNETS,
                fields::MONITOR_EXCLUDE_LIST,
            ],
            Self::TunnelDetectionTime => &[fields::TUNNEL_DETECTION_TIME],
            Self::LocalAsNumber => &[fields::LOCAL_AS_NUMBER],
            Self::BgpEcmp => &[fields::ENABLE_BGP_ECMP],
            Self::PreserveAsPath => &[fields::ENABLE_PRESERVE_AS_PATH],
            Self::LearnedCidrsApproval => &[fields::ENABLE_LEARNED_CIDRS_APPROVAL],
            Self::ApprovedLearnedCidrs => &[fields::APPROVED_LEARNED_CIDRS],
            Self::BgpManualAdvertise => &[fields::BGP_MANUAL_ADVERTISE_CIDRS],
            Self::ActiveStandby => &[
                fields::ENABLE_ACTIVE_STANDBY,
                fields::ENABLE_ACTIVE_STANDBY_PREEMPTIVE,
            ],
            Self::CustomizedRoutes => &[fields::CUSTOMIZED_VPC_ROUTES],
            Self::FilteredRoutes => &[fields::FILTERED_ADVERTISED_ROUTES],
            Self::IncludedRoutes => &[fields::INCLUDED_ADVERTISED_ROUTES],
            Self::SingleIpSnat => &[fields::SINGLE_IP_SNAT],
            Self::Tags => &[fields::TAGS],
        }
    }

    pub fn retry(self) -> RetryClass {
        match self {
            Self::BgpManualAdvertise => RetryClass::Advertise,
            Self::CustomizedRoutes | Self::FilteredRoutes | Self::IncludedRoutes => {
                RetryClass::Routes
            }
            _ => RetryClass::None,
        }
    }

    /// Groups that act on the primary alone and run before the sibling
    /// is created or changed.
    pub fn precedes_sibling(self) -> bool {
        matches!(self, Self::GwSize | Self::JumboFrame | Self::GroGso)
    }

    /// The group whose feature must be on before this one is edited.
    fn prerequisite(self) -> Option<Self> {
        match self {
            Self::ApprovedLearnedCidrs => Some(Self::LearnedCidrsApproval),
            _ => None,
        }
    }

    fn switched_off(self, cfg: &GatewayConfig) -> bool {
        match self {
            Self::LearnedCidrsApproval => !cfg.enable_learned_cidrs_approval,
            _ => false,
        }
    }

    /// The call that sets this group to `cfg`'s values, or `None` when
    /// the declared value leaves the controller's choice alone.
    pub fn action(self, cfg: &GatewayConfig) -> Option<GatewayAction> {
        let gw_name = cfg.gw_name.clone();
        let action = match self {
            Self::GwSize => GatewayAction::Resize {
                gw_name,
                gw_size: non_empty(&cfg.gw_size)?,
            },
            Self::JumboFrame => GatewayAction::SetJumboFrame {
                gw_name,
                enabled: cfg.enable_jumbo_frame?,
            },
            Self::GroGso => GatewayAction::SetGroGso {
                gw_name,
                enabled: cfg.enable_gro_gso?,
            },
            Self::SingleAzHa => GatewayAction::SetSingleAzHa {
                gw_name,
                enabled: cfg.single_az_ha,
            },
            Self::VpcDnsServer => GatewayAction::SetVpcDnsServer {
                gw_name,
                enabled: cfg.enable_vpc_dns_server,
            },
            Self::MonitorSubnets => GatewayAction::SetMonitorSubnets {
                gw_name,
                enabled: cfg.enable_monitor_gateway_subnets,
                excluded_instances: cfg.monitor_exclude_list.clone(),
            },
            Self::TunnelDetectionTime => GatewayAction::SetTunnelDetectionTime {
                gw_name,
                seconds: cfg.tunnel_detection_time,
            },
            Self::LocalAsNumber => GatewayAction::SetLocalAsNumber {
                gw_name,
                asn: non_empty(&cfg.local_as_number)?,
            },
            Self::BgpEcmp => GatewayAction::SetBgpEcmp {
                gw_name,
                enabled: cfg.enable_bgp_ecmp,
            },
            Self::PreserveAsPath => GatewayAction::SetPreserveAsPath {
                gw_name,
                enabled: cfg.enable_preserve_as_path,
            },
            Self::LearnedCidrsApproval => GatewayAction::SetLearnedCidrsApproval {
                gw_name,
                enabled: cfg.enable_learned_cidrs_approval,
            },
            Self::ApprovedLearnedCidrs => GatewayAction::SetApprovedLearnedCidrs {
                gw_name,
                cidrs: cfg.approved_learned_cidrs.clone(),
            },
            Self::BgpManualAdvertise => GatewayAction::SetBgpManualAdvertiseCidrs {
                gw_name,
                cidrs: cfg.bgp_manual_advertise_cidrs.clone(),
            },
            Self::ActiveStandby => GatewayAction::SetActiveStandby {
                gw_name,
                enabled: cfg.enable_active_standby,
                preemptive: cfg.enable_active_standby_preemptive,
            },
            Self::CustomizedRoutes => GatewayAction::CustomizeVpcRoutes {
                gw_name,
                cidrs: cfg.customized_vpc_routes.clone(),
            },
            Self::FilteredRoutes => GatewayAction::FilterAdvertisedRoutes {
                gw_name,
                cidrs: cfg.filtered_advertised_routes.clone(),
            },
            Self::IncludedRoutes => GatewayAction::IncludeAdvertisedRoutes {
                gw_name,
                cidrs: cfg.included_advertised_routes.clone(),
            },
            Self::SingleIpSnat => GatewayAction::SetSingleIpSnat {
                gw_name,
                enabled: cfg.single_ip_snat,
            },
            Self::Tags => {
                if !cfg.cloud_type.belongs_to(CloudSet::AWS_GCP_AZURE) {
                    return None;
                }
                GatewayAction::UpdateTags {
                    cloud_type: cfg.cloud_type.code(),
                    gw_name,
                    tags: cfg.tags.clone(),
                }
            }
        };
        Some(action)
    }

    /// Whether a freshly created gateway needs this group's call to
    /// match `cfg`.
    fn needed_after_create(self, cfg: &GatewayConfig, defaults: &CreationDefaults) -> bool {
        let cloud = cfg.cloud_type;
        match self {
            // Sent in the create request.
            Self::GwSize | Self::Tags => false,
            Self::JumboFrame => cfg
                .enable_jumbo_frame
                .is_some_and(|on| on != defaults.jumbo_frame_on(cloud)),
            Self::GroGso => cfg
                .enable_gro_gso
                .is_some_and(|on| on != defaults.gro_gso_on(cloud)),
            Self::SingleAzHa => cfg.single_az_ha,
            Self::VpcDnsServer => cfg.enable_vpc_dns_server,
            Self::MonitorSubnets => cfg.enable_monitor_gateway_subnets,
            Self::TunnelDetectionTime => cfg.tunnel_detection_time.is_some(),
            Self::LocalAsNumber => !cfg.local_as_number.is_empty(),
            Self::BgpEcmp => cfg.enable_bgp_ecmp,
            Self::PreserveAsPath => cfg.enable_preserve_as_path,
            Self::LearnedCidrsApproval => cfg.enable_learned_cidrs_approval,
            Self::ApprovedLearnedCidrs => !cfg.approved_learned_cidrs.is_empty(),
            Self::BgpManualAdvertise => !cfg.bgp_manual_advertise_cidrs.is_empty(),
            Self::ActiveStandby => cfg.enable_active_standby,
            Self::CustomizedRoutes => !cfg.customized_vpc_routes.is_empty(),
            Self::FilteredRoutes => !cfg.filtered_advertised_routes.is_empty(),
            Self::IncludedRoutes => !cfg.included_advertised_routes.is_empty(),
            Self::SingleIpSnat => cfg.single_ip_snat,
        }
    }
}

/// One narrow call and the group it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub group: FieldGroup,
    pub action: GatewayAction,
}

/// Calls a new gateway needs after the create request, in order.
///
/// Includes the default corrections: a feature the controller turns on
/// by itself but the caller declared off gets an explicit disable.
pub fn creation_follow_ups(cfg: &GatewayConfig, defaults: &CreationDefaults) -> Vec<Step> {
    FieldGroup::iter()
        .filter(|group| group.needed_after_create(cfg, defaults))
        .filter_map(|group| {
            group.action(cfg).map(|action| Step { group, action })
        })
        .collect()
}

/// Calls that bring the changed groups of an existing gateway in line
/// with `cfg`, in order. `changed` reports whether a store key changed.
///
/// A prerequisite that is being switched off runs after the groups that
/// rely on it.
pub fn to_update_request(cfg: &GatewayConfig, changed: impl Fn(&str) -> bool) -> Vec<Step> {
    let mut steps: Vec<Step> = FieldGroup::iter()
        .filter(|group| group.fields().iter().any(|&key| changed(key)))
        .filter_map(|group| {
            group.action(cfg).map(|action| Step { group, action })
        })
        .collect();

    for dependent in FieldGroup::iter() {
        let Some(prerequisite) = dependent.prerequisite() else {
            continue;
        };
        if !prerequisite.switched_off(cfg) {
            continue;
        }
        let position = |group: FieldGroup| steps.iter().position(|step| step.group == group);
        if let (Some(before), Some(after)) = (position(prerequisite), position(dependent)) {
            let step = steps.remove(after);
            steps.insert(before, step);
        }
    }
    steps
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{CloudType, HaSettings};

    fn aws() -> GatewayConfig {
        GatewayConfig {
            cloud_type: CloudType::Aws,
            account_name: "aws-prod".into(),
            gw_name: "spoke-1".into(),
            vpc_id: "vpc-0abc".into(),
            vpc_reg: "us-east-1".into(),
            gw_size: "t3.small".into(),
            subnet: "10.0.1.0/24".into(),
            ..GatewayConfig::default()
        }
    }

    fn groups(steps: &[Step]) -> Vec<FieldGroup> {
        steps.iter().map(|step| step.group).collect()
    }

    #[test]
    fn azure_zone_goes_into_the_subnet_field() {
        let cfg = GatewayConfig {
            cloud_type: CloudType::Azure,
            zone: "az-2".into(),
            ..aws()
        };
        let req = to_create_request(&cfg).unwrap();
        assert_eq!(req.gw_subnet, "10.0.1.0/24~~az-2~~");
        assert_eq!(req.cloud_type, 8);
    }

    #[test]
    fn insane_mode_az_encoded_on_aws() {
        let cfg = GatewayConfig {
            insane_mode: true,
            insane_mode_az: "us-east-1a".into(),
            ..aws()
        };
        let req = to_create_request(&cfg).unwrap();
        assert_eq!(req.gw_subnet, "10.0.1.0/24~~~~us-east-1a~~");
        assert!(req.insane_mode);
    }

    #[test]
    fn create_request_surfaces_validation_errors() {
        let cfg = GatewayConfig {
            cloud_type: CloudType::Gcp,
            availability_domain: "AD-1".into(),
            ..aws()
        };
        let err = to_create_request(&cfg).unwrap_err();
        assert_eq!(err.field(), Some(fields::AVAILABILITY_DOMAIN));
    }

    #[test]
    fn eip_only_sent_when_reusing() {
        let cfg = GatewayConfig {
            allocate_new_eip: false,
            eip: "3.3.3.3".into(),
            tags: BTreeMap::from([("env".into(), "prod".into())]),
            ..aws()
        };
        let req = to_create_request(&cfg).unwrap();
        assert_eq!(req.eip.as_deref(), Some("3.3.3.3"));
        assert!(!req.allocate_new_eip);
        assert_eq!(req.tags, Some(cfg.tags.clone()));
    }

    #[test]
    fn sibling_request_without_zone_suffix() {
        let cfg = GatewayConfig {
            ha: HaSettings {
                ha_subnet: "10.0.2.0/24".into(),
                ha_gw_size: "medium".into(),
                ..HaSettings::default()
            },
            ..aws()
        };
        let req = to_sibling_request(&cfg);
        assert_eq!(req.gw_subnet, "10.0.2.0/24");
        assert_eq!(req.gw_size, "medium");
        assert_eq!(req.primary_gw_name, "spoke-1");
        assert_eq!(req.zone, None);
    }

    #[test]
    fn gcp_sibling_sends_zone() {
        let cfg = GatewayConfig {
            cloud_type: CloudType::Gcp,
            vpc_reg: "us-west1-a".into(),
            ha: HaSettings {
                ha_zone: "us-west1-b".into(),
                ha_gw_size: "n1-standard-1".into(),
                ..HaSettings::default()
            },
            ..aws()
        };
        let req = to_sibling_request(&cfg);
        assert_eq!(req.zone.as_deref(), Some("us-west1-b"));
        assert_eq!(req.gw_subnet, "");
    }

    #[test]
    fn follow_ups_respect_dependency_order() {
        let cfg = GatewayConfig {
            enable_bgp: true,
            local_as_number: "65001".into(),
            enable_learned_cidrs_approval: true,
            approved_learned_cidrs: vec!["10.9.0.0/16".into()],
            customized_vpc_routes: vec!["10.0.0.0/8".into()],
            single_ip_snat: true,
            ..aws()
        };
        let steps = creation_follow_ups(&cfg, &CreationDefaults::default());
        assert_eq!(
            groups(&steps),
            vec![
                FieldGroup::LocalAsNumber,
                FieldGroup::LearnedCidrsApproval,
                FieldGroup::ApprovedLearnedCidrs,
                FieldGroup::CustomizedRoutes,
                FieldGroup::SingleIpSnat,
            ]
        );
    }

    #[test]
    fn default_on_features_get_disabled() {
        let cfg = GatewayConfig {
            enable_jumbo_frame: Some(false),
            enable_gro_gso: Some(false),
            ..aws()
        };
        let steps = creation_follow_ups(&cfg, &CreationDefaults::default());
        assert_eq!(
            steps.iter().map(|s| s.action.clone()).collect::<Vec<_>>(),
            vec![
                GatewayAction::SetJumboFrame {
                    gw_name: "spoke-1".into(),
                    enabled: false
                },
                GatewayAction::SetGroGso {
                    gw_name: "spoke-1".into(),
                    enabled: false
                },
            ]
        );
    }

    #[test]
    fn matching_defaults_need_no_call() {
        let aws_on = GatewayConfig {
            enable_jumbo_frame: Some(true),
            ..aws()
        };
        assert!(creation_follow_ups(&aws_on, &CreationDefaults::default()).is_empty());

        let azure_on = GatewayConfig {
            cloud_type: CloudType::Azure,
            enable_jumbo_frame: Some(true),
            ..aws()
        };
        assert_eq!(
            groups(&creation_follow_ups(&azure_on, &CreationDefaults::default())),
            vec![FieldGroup::JumboFrame]
        );
    }

    #[test]
    fn update_touches_only_changed_groups() {
        let cfg = GatewayConfig {
            enable_monitor_gateway_subnets: true,
            monitor_exclude_list: vec!["i-0abc".into()],
            gw_size: "t3.large".into(),
            ..aws()
        };
        let steps = to_update_request(&cfg, |key| {
            key == fields::MONITOR_EXCLUDE_LIST || key == fields::GW_SIZE
        });
        assert_eq!(
            groups(&steps),
            vec![FieldGroup::GwSize, FieldGroup::MonitorSubnets]
        );
    }

    #[test]
    fn approval_switched_off_after_its_cidrs() {
        let on = GatewayConfig {
            enable_bgp: true,
            local_as_number: "65001".into(),
            enable_learned_cidrs_approval: true,
            approved_learned_cidrs: vec!["10.9.0.0/16".into()],
            ..aws()
        };
        let off = GatewayConfig {
            enable_learned_cidrs_approval: false,
            approved_learned_cidrs: vec![],
            ..on.clone()
        };
        let both = |key: &str| {
            key == fields::ENABLE_LEARNED_CIDRS_APPROVAL || key == fields::APPROVED_LEARNED_CIDRS
        };

        assert_eq!(
            groups(&to_update_request(&on, both)),
            vec![FieldGroup::LearnedCidrsApproval, FieldGroup::ApprovedLearnedCidrs]
        );
        assert_eq!(
            groups(&to_update_request(&off, both)),
            vec![FieldGroup::ApprovedLearnedCidrs, FieldGroup::LearnedCidrsApproval]
        );
    }

    #[test]
    fn every_declared_key_has_an_update_path() {
        for key in fields::DECLARED {
            let covered = fields::IMMUTABLE.contains(&key)
                || key.starts_with("ha_")
                || FieldGroup::iter().any(|group| group.fields().contains(&key));
            assert!(covered, "{key} can change but no update issues a call for it");
        }
    }

    #[test]
    fn cleared_tri_state_leaves_remote_alone() {
        let cfg = aws();
        let steps = to_update_request(&cfg, |key| key == fields::ENABLE_JUMBO_FRAME);
        assert!(steps.is_empty());
    }

    #[test]
    fn retry_classes() {
        assert_eq!(FieldGroup::CustomizedRoutes.retry(), RetryClass::Routes);
        assert_eq!(FieldGroup::BgpManualAdvertise.retry(), RetryClass::Advertise);
        assert_eq!(FieldGroup::SingleIpSnat.retry(), RetryClass::None);
    }
}
