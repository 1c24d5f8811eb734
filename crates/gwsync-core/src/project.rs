// ── State projection ──
//
// Rewrites the controller's flattened `GatewayInfo` into the declarative
// `GatewayConfig` shape so the caller can compare it with what it last
// declared. Undoes the controller's encodings: the composite subnet
// field, the Azure zone sentinel, the Azure EIP triple, yes/no and on/off
// strings and comma-joined lists. List fields keep the declared order
// when they hold the same members.

use gwsync_api::GatewayInfo;

use crate::codec::Placement;
use crate::error::ReconcileError;
use crate::model::{CloudSet, CloudType, GatewayConfig, GatewayOutputs, HaSettings};

/// `gateway_zone` value meaning "no availability zone".
pub const NO_ZONE_SENTINEL: &str = "AvailabilitySet";

/// Project `remote` (and its sibling, if any) over `cfg`.
pub fn project(
    remote: &GatewayInfo,
    sibling: Option<&GatewayInfo>,
    cfg: &GatewayConfig,
) -> Result<GatewayConfig, ReconcileError> {
    let cloud = CloudType::try_from(remote.cloud_type).map_err(|e| {
        ReconcileError::InvalidState {
            message: format!("gateway {}: {e}", remote.gw_name),
        }
    })?;
    let gcp = cloud.belongs_to(CloudSet::GCP_RELATED);
    let azure = cloud.belongs_to(CloudSet::AZURE_RELATED);
    let oci = cloud.belongs_to(CloudSet::OCI_RELATED);

    let placement = Placement::decode(&remote.vpc_net);
    let allocate_new_eip = flag(&remote.allocate_new_eip, "on");
    let (eip, azure_eip_name_resource_group) =
        eip_from(remote, cloud, allocate_new_eip);

    Ok(GatewayConfig {
        cloud_type: cloud,
        account_name: remote.account_name.clone(),
        gw_name: remote.gw_name.clone(),
        vpc_id: remote.vpc_id.clone(),
        vpc_reg: if gcp {
            remote.gateway_zone.clone()
        } else {
            remote.vpc_region.clone()
        },
        gw_size: remote.gw_size.clone(),
        subnet: placement.subnet,
        zone: if azure {
            zone_from(&remote.gateway_zone, &placement.zone)
        } else {
            String::new()
        },
        availability_domain: oci_only(oci, &remote.availability_domain),
        fault_domain: oci_only(oci, &remote.fault_domain),

        allocate_new_eip,
        eip,
        azure_eip_name_resource_group,

        insane_mode: flag(&remote.insane_mode, "yes"),
        insane_mode_az: placement.insane_mode_az,
        enable_private_oob: remote.private_oob,
        oob_management_subnet: remote.oob_mgmt_subnet.clone(),
        oob_availability_zone: placement.oob_availability_zone,
        enable_private_mode: remote.private_mode,
        private_mode_lb_vpc_id: remote.private_mode_lb_vpc_id.clone(),
        private_mode_subnet_zone: placement.private_mode_zone,
        enable_ipv6: remote.enable_ipv6,
        subnet_ipv6_cidr: placement.ipv6_cidr,

        enable_bgp: remote.enable_bgp,
        local_as_number: remote.local_as_number.clone(),
        enable_bgp_ecmp: remote.bgp_ecmp,
        enable_preserve_as_path: remote.preserve_as_path,
        enable_learned_cidrs_approval: flag(&remote.learned_cidrs_approval, "on"),
        approved_learned_cidrs: keep_order(
            &cfg.approved_learned_cidrs,
            remote.approved_learned_cidrs.clone(),
        ),
        bgp_manual_advertise_cidrs: keep_order(
            &cfg.bgp_manual_advertise_cidrs,
            split_list(&remote.bgp_manual_spoke_advertise_cidrs),
        ),

        enable_active_standby: remote.active_standby,
        enable_active_standby_preemptive: remote.active_standby_preemptive,
        enable_jumbo_frame: cfg.enable_jumbo_frame.map(|_| remote.jumbo_frame),
        enable_gro_gso: cfg.enable_gro_gso.map(|_| remote.gro_gso),
        single_az_ha: flag(&remote.single_az_ha, "enabled"),
        enable_vpc_dns_server: flag(&remote.vpc_dns_server, "enabled"),
        enable_monitor_gateway_subnets: remote.monitor_subnets,
        monitor_exclude_list: keep_order(
            &cfg.monitor_exclude_list,
            remote.monitor_exclude_gw_list.clone(),
        ),
        tunnel_detection_time: cfg
            .tunnel_detection_time
            .and(remote.tunnel_detection_time),
        single_ip_snat: remote.single_ip_snat,

        customized_vpc_routes: keep_order(
            &cfg.customized_vpc_routes,
            split_list(&remote.customized_spoke_vpc_routes),
        ),
        filtered_advertised_routes: keep_order(
            &cfg.filtered_advertised_routes,
            split_list(&remote.filtered_spoke_vpc_routes),
        ),
        included_advertised_routes: keep_order(
            &cfg.included_advertised_routes,
            split_list(&remote.include_cidr_list),
        ),
        tags: if cloud.belongs_to(CloudSet::AWS_GCP_AZURE) {
            remote.tags.clone()
        } else {
            cfg.tags.clone()
        },

        ha: sibling.map_or_else(HaSettings::default, |s| {
            project_sibling(s, cloud, allocate_new_eip, cfg)
        }),
        outputs: GatewayOutputs {
            public_ip: remote.public_ip.clone(),
            private_ip: remote.private_ip.clone(),
            cloud_instance_id: remote.cloud_instance_id.clone(),
            ha_gw_name: sibling.map(|s| s.gw_name.clone()).unwrap_or_default(),
            ha_public_ip: sibling.map(|s| s.public_ip.clone()).unwrap_or_default(),
            ha_private_ip: sibling.map(|s| s.private_ip.clone()).unwrap_or_default(),
            ha_cloud_instance_id: sibling
                .map(|s| s.cloud_instance_id.clone())
                .unwrap_or_default(),
        },
    })
}

fn project_sibling(
    remote: &GatewayInfo,
    cloud: CloudType,
    allocate_new_eip: bool,
    cfg: &GatewayConfig,
) -> HaSettings {
    let gcp = cloud.belongs_to(CloudSet::GCP_RELATED);
    let azure = cloud.belongs_to(CloudSet::AZURE_RELATED);
    let oci = cloud.belongs_to(CloudSet::OCI_RELATED);
    let placement = Placement::decode(&remote.vpc_net);
    let (ha_eip, ha_azure_eip_name_resource_group) = eip_from(remote, cloud, allocate_new_eip);

    HaSettings {
        // A zone-placed GCP sibling reports the primary's subnet; only
        // surface it when one was declared.
        ha_subnet: if gcp && cfg.ha.ha_subnet.is_empty() {
            String::new()
        } else {
            placement.subnet
        },
        ha_zone: if gcp {
            remote.gateway_zone.clone()
        } else if azure {
            zone_from(&remote.gateway_zone, &placement.zone)
        } else {
            String::new()
        },
        ha_gw_size: remote.gw_size.clone(),
        ha_insane_mode_az: placement.insane_mode_az,
        ha_eip,
        ha_azure_eip_name_resource_group,
        ha_availability_domain: oci_only(oci, &remote.availability_domain),
        ha_fault_domain: oci_only(oci, &remote.fault_domain),
        ha_oob_management_subnet: remote.oob_mgmt_subnet.clone(),
        ha_oob_availability_zone: placement.oob_availability_zone,
        ha_private_mode_subnet_zone: placement.private_mode_zone,
        ha_subnet_ipv6_cidr: placement.ipv6_cidr,
    }
}

// ── Encodings ────────────────────────────────────────────────────────

fn flag(value: &str, on: &str) -> bool {
    value.eq_ignore_ascii_case(on)
}

fn oci_only(oci: bool, value: &str) -> String {
    if oci { value.to_owned() } else { String::new() }
}

/// Azure zone from `gateway_zone`, falling back to the composite token.
fn zone_from(gateway_zone: &str, token: &str) -> String {
    match gateway_zone {
        NO_ZONE_SENTINEL => String::new(),
        "" => token.to_owned(),
        zone => zone.to_owned(),
    }
}

/// `(eip, azure_eip_name_resource_group)`. Both stay empty when the
/// controller allocated the address itself.
fn eip_from(remote: &GatewayInfo, cloud: CloudType, allocate_new_eip: bool) -> (String, String) {
    if allocate_new_eip {
        return (String::new(), String::new());
    }
    if !cloud.belongs_to(CloudSet::AZURE_RELATED) {
        return (remote.public_ip.clone(), String::new());
    }

    let mut parts = remote.eip_details.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(group), ip) if !name.is_empty() && !group.is_empty() => {
            let ip = ip.filter(|ip| !ip.is_empty()).unwrap_or(&remote.public_ip);
            (ip.to_owned(), format!("{name}:{group}"))
        }
        _ => (remote.public_ip.clone(), String::new()),
    }
}

/// Split a comma-joined list, dropping blanks.
pub fn split_list(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// `declared` if it holds the same members as `remote`, else `remote`.
pub fn keep_order(declared: &[String], remote: Vec<String>) -> Vec<String> {
    let mut a: Vec<&String> = declared.iter().collect();
    let mut b: Vec<&String> = remote.iter().collect();
    a.sort_unstable();
    b.sort_unstable();
    if a == b { declared.to_vec() } else { remote }
}
