// ── Gateway configuration ──
//
// `GatewayConfig` is the declarative shape of one primary gateway, its
// optional HA sibling and the computed outputs Read writes back. Field
// names are the configuration store keys, so the struct round-trips
// through a `ResourceData` without a separate mapping table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::cloud::{CloudSet, CloudType};
use crate::error::ReconcileError;
use crate::resource::ResourceData;

/// Suffix the controller appends to a primary's name to name its sibling.
pub const HA_SUFFIX: &str = "-hagw";

/// Store keys.
pub mod fields {
    pub const CLOUD_TYPE: &str = "cloud_type";
    pub const ACCOUNT_NAME: &str = "account_name";
    pub const GW_NAME: &str = "gw_name";
    pub const VPC_ID: &str = "vpc_id";
    pub const VPC_REG: &str = "vpc_reg";
    pub const GW_SIZE: &str = "gw_size";
    pub const SUBNET: &str = "subnet";
    pub const ZONE: &str = "zone";
    pub const AVAILABILITY_DOMAIN: &str = "availability_domain";
    pub const FAULT_DOMAIN: &str = "fault_domain";
    pub const ALLOCATE_NEW_EIP: &str = "allocate_new_eip";
    pub const EIP: &str = "eip";
    pub const AZURE_EIP_NAME_RESOURCE_GROUP: &str = "azure_eip_name_resource_group";
    pub const INSANE_MODE: &str = "insane_mode";
    pub const INSANE_MODE_AZ: &str = "insane_mode_az";
    pub const ENABLE_PRIVATE_OOB: &str = "enable_private_oob";
    pub const OOB_MANAGEMENT_SUBNET: &str = "oob_management_subnet";
    pub const OOB_AVAILABILITY_ZONE: &str = "oob_availability_zone";
    pub const ENABLE_PRIVATE_MODE: &str = "enable_private_mode";
    pub const PRIVATE_MODE_LB_VPC_ID: &str = "private_mode_lb_vpc_id";
    pub const PRIVATE_MODE_SUBNET_ZONE: &str = "private_mode_subnet_zone";
    pub const ENABLE_IPV6: &str = "enable_ipv6";
    pub const SUBNET_IPV6_CIDR: &str = "subnet_ipv6_cidr";
    pub const ENABLE_BGP: &str = "enable_bgp";
    pub const LOCAL_AS_NUMBER: &str = "local_as_number";
    pub const ENABLE_BGP_ECMP: &str = "enable_bgp_ecmp";
    pub const ENABLE_PRESERVE_AS_PATH: &str = "enable_preserve_as_path";
    pub const ENABLE_LEARNED_CIDRS_APPROVAL: &str = "enable_learned_cidrs_approval";
    pub const APPROVED_LEARNED_CIDRS: &str = "approved_learned_cidrs";
    pub const BGP_MANUAL_ADVERTISE_CIDRS: &str = "bgp_manual_advertise_cidrs";
    pub const ENABLE_ACTIVE_STANDBY: &str = "enable_active_standby";
    pub const ENABLE_ACTIVE_STANDBY_PREEMPTIVE: &str = "enable_active_standby_preemptive";
    pub const ENABLE_JUMBO_FRAME: &str = "enable_jumbo_frame";
    pub const ENABLE_GRO_GSO: &str = "enable_gro_gso";
    pub const SINGLE_AZ_HA: &str = "single_az_ha";
    pub const ENABLE_VPC_DNS_SERVER: &str = "enable_vpc_dns_server";
    pub const ENABLE_MONITOR_GATEWAY_SUBNETS: &str = "enable_monitor_gateway_subnets";
    pub const MONITOR_EXCLUDE_LIST: &str = "monitor_exclude_list";
    pub const TUNNEL_DETECTION_TIME: &str = "tunnel_detection_time";
    pub const SINGLE_IP_SNAT: &str = "single_ip_snat";
    pub const CUSTOMIZED_VPC_ROUTES: &str = "customized_vpc_routes";
    pub const FILTERED_ADVERTISED_ROUTES: &str = "filtered_advertised_routes";
    pub const INCLUDED_ADVERTISED_ROUTES: &str = "included_advertised_routes";
    pub const TAGS: &str = "tags";

    pub const HA_SUBNET: &str = "ha_subnet";
    pub const HA_ZONE: &str = "ha_zone";
    pub const HA_GW_SIZE: &str = "ha_gw_size";
    pub const HA_INSANE_MODE_AZ: &str = "ha_insane_mode_az";
    pub const HA_EIP: &str = "ha_eip";
    pub const HA_AZURE_EIP_NAME_RESOURCE_GROUP: &str = "ha_azure_eip_name_resource_group";
    pub const HA_AVAILABILITY_DOMAIN: &str = "ha_availability_domain";
    pub const HA_FAULT_DOMAIN: &str = "ha_fault_domain";
    pub const HA_OOB_MANAGEMENT_SUBNET: &str = "ha_oob_management_subnet";
    pub const HA_OOB_AVAILABILITY_ZONE: &str = "ha_oob_availability_zone";
    pub const HA_PRIVATE_MODE_SUBNET_ZONE: &str = "ha_private_mode_subnet_zone";
    pub const HA_SUBNET_IPV6_CIDR: &str = "ha_subnet_ipv6_cidr";

    pub const PUBLIC_IP: &str = "public_ip";
    pub const PRIVATE_IP: &str = "private_ip";
    pub const CLOUD_INSTANCE_ID: &str = "cloud_instance_id";
    pub const HA_GW_NAME: &str = "ha_gw_name";
    pub const HA_PUBLIC_IP: &str = "ha_public_ip";
    pub const HA_PRIVATE_IP: &str = "ha_private_ip";
    pub const HA_CLOUD_INSTANCE_ID: &str = "ha_cloud_instance_id";

    /// Keys the caller declares.
    pub const DECLARED: [&str; 56] = [
        CLOUD_TYPE,
        ACCOUNT_NAME,
        GW_NAME,
        VPC_ID,
        VPC_REG,
        GW_SIZE,
        SUBNET,
        ZONE,
        AVAILABILITY_DOMAIN,
        FAULT_DOMAIN,
        ALLOCATE_NEW_EIP,
        EIP,
        AZURE_EIP_NAME_RESOURCE_GROUP,
        INSANE_MODE,
        INSANE_MODE_AZ,
        ENABLE_PRIVATE_OOB,
        OOB_MANAGEMENT_SUBNET,
        OOB_AVAILABILITY_ZONE,
        ENABLE_PRIVATE_MODE,
        PRIVATE_MODE_LB_VPC_ID,
        PRIVATE_MODE_SUBNET_ZONE,
        ENABLE_IPV6,
        SUBNET_IPV6_CIDR,
        ENABLE_BGP,
        LOCAL_AS_NUMBER,
        ENABLE_BGP_ECMP,
        ENABLE_PRESERVE_AS_PATH,
        ENABLE_LEARNED_CIDRS_APPROVAL,
        APPROVED_LEARNED_CIDRS,
        BGP_MANUAL_ADVERTISE_CIDRS,
        ENABLE_ACTIVE_STANDBY,
        ENABLE_ACTIVE_STANDBY_PREEMPTIVE,
        ENABLE_JUMBO_FRAME,
        ENABLE_GRO_GSO,
        SINGLE_AZ_HA,
        ENABLE_VPC_DNS_SERVER,
        ENABLE_MONITOR_GATEWAY_SUBNETS,
        MONITOR_EXCLUDE_LIST,
        TUNNEL_DETECTION_TIME,
        SINGLE_IP_SNAT,
        CUSTOMIZED_VPC_ROUTES,
        FILTERED_ADVERTISED_ROUTES,
        INCLUDED_ADVERTISED_ROUTES,
        TAGS,
        HA_SUBNET,
        HA_ZONE,
        HA_GW_SIZE,
        HA_INSANE_MODE_AZ,
        HA_EIP,
        HA_AZURE_EIP_NAME_RESOURCE_GROUP,
        HA_AVAILABILITY_DOMAIN,
        HA_FAULT_DOMAIN,
        HA_OOB_MANAGEMENT_SUBNET,
        HA_OOB_AVAILABILITY_ZONE,
        HA_PRIVATE_MODE_SUBNET_ZONE,
        HA_SUBNET_IPV6_CIDR,
    ];

    /// Keys only Read writes.
    pub const COMPUTED: [&str; 7] = [
        PUBLIC_IP,
        PRIVATE_IP,
        CLOUD_INSTANCE_ID,
        HA_GW_NAME,
        HA_PUBLIC_IP,
        HA_PRIVATE_IP,
        HA_CLOUD_INSTANCE_ID,
    ];

    /// Fixed once the primary exists. BGP is chosen at launch; the
    /// settings that depend on it are edited through their own actions.
    pub const IMMUTABLE: [&str; 23] = [
        CLOUD_TYPE,
        ACCOUNT_NAME,
        GW_NAME,
        VPC_ID,
        VPC_REG,
        SUBNET,
        ZONE,
        AVAILABILITY_DOMAIN,
        FAULT_DOMAIN,
        ALLOCATE_NEW_EIP,
        EIP,
        AZURE_EIP_NAME_RESOURCE_GROUP,
        INSANE_MODE,
        INSANE_MODE_AZ,
        ENABLE_PRIVATE_OOB,
        OOB_MANAGEMENT_SUBNET,
        OOB_AVAILABILITY_ZONE,
        ENABLE_PRIVATE_MODE,
        PRIVATE_MODE_LB_VPC_ID,
        PRIVATE_MODE_SUBNET_ZONE,
        ENABLE_IPV6,
        SUBNET_IPV6_CIDR,
        ENABLE_BGP,
    ];
}

/// Desired state of a primary gateway.
///
/// Booleans default to off and strings to empty, which the store treats
/// as "not declared". `enable_jumbo_frame`, `enable_gro_gso` and
/// `tunnel_detection_time` are tri-state: `None` accepts whatever the
/// controller chose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub cloud_type: CloudType,
    pub account_name: String,
    pub gw_name: String,
    pub vpc_id: String,
    /// Region; the zone on GCP.
    pub vpc_reg: String,
    pub gw_size: String,
    pub subnet: String,
    pub zone: String,
    pub availability_domain: String,
    pub fault_domain: String,

    pub allocate_new_eip: bool,
    pub eip: String,
    /// `name:resource_group` of a pre-allocated Azure public IP.
    pub azure_eip_name_resource_group: String,

    pub insane_mode: bool,
    pub insane_mode_az: String,
    pub enable_private_oob: bool,
    pub oob_management_subnet: String,
    pub oob_availability_zone: String,
    pub enable_private_mode: bool,
    pub private_mode_lb_vpc_id: String,
    pub private_mode_subnet_zone: String,
    pub enable_ipv6: bool,
    pub subnet_ipv6_cidr: String,

    pub enable_bgp: bool,
    pub local_as_number: String,
    pub enable_bgp_ecmp: bool,
    pub enable_preserve_as_path: bool,
    pub enable_learned_cidrs_approval: bool,
    pub approved_learned_cidrs: Vec<String>,
    pub bgp_manual_advertise_cidrs: Vec<String>,

    pub enable_active_standby: bool,
    pub enable_active_standby_preemptive: bool,
    pub enable_jumbo_frame: Option<bool>,
    pub enable_gro_gso: Option<bool>,
    pub single_az_ha: bool,
    pub enable_vpc_dns_server: bool,
    pub enable_monitor_gateway_subnets: bool,
    pub monitor_exclude_list: Vec<String>,
    /// Seconds, 20 to 600.
    pub tunnel_detection_time: Option<u32>,
    pub single_ip_snat: bool,

    pub customized_vpc_routes: Vec<String>,
    pub filtered_advertised_routes: Vec<String>,
    pub included_advertised_routes: Vec<String>,
    pub tags: BTreeMap<String, String>,

    #[serde(flatten)]
    pub ha: HaSettings,
    #[serde(flatten)]
    pub outputs: GatewayOutputs,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cloud_type: CloudType::default(),
            account_name: String::new(),
            gw_name: String::new(),
            vpc_id: String::new(),
            vpc_reg: String::new(),
            gw_size: String::new(),
            subnet: String::new(),
            zone: String::new(),
            availability_domain: String::new(),
            fault_domain: String::new(),
            allocate_new_eip: true,
            eip: String::new(),
            azure_eip_name_resource_group: String::new(),
            insane_mode: false,
            insane_mode_az: String::new(),
            enable_private_oob: false,
            oob_management_subnet: String::new(),
            oob_availability_zone: String::new(),
            enable_private_mode: false,
            private_mode_lb_vpc_id: String::new(),
            private_mode_subnet_zone: String::new(),
            enable_ipv6: false,
            subnet_ipv6_cidr: String::new(),
            enable_bgp: false,
            local_as_number: String::new(),
            enable_bgp_ecmp: false,
            enable_preserve_as_path: false,
            enable_learned_cidrs_approval: false,
            approved_learned_cidrs: Vec::new(),
            bgp_manual_advertise_cidrs: Vec::new(),
            enable_active_standby: false,
            enable_active_standby_preemptive: false,
            enable_jumbo_frame: None,
            enable_gro_gso: None,
            single_az_ha: false,
            enable_vpc_dns_server: false,
            enable_monitor_gateway_subnets: false,
            monitor_exclude_list: Vec::new(),
            tunnel_detection_time: None,
            single_ip_snat: false,
            customized_vpc_routes: Vec::new(),
            filtered_advertised_routes: Vec::new(),
            included_advertised_routes: Vec::new(),
            tags: BTreeMap::new(),
            ha: HaSettings::default(),
            outputs: GatewayOutputs::default(),
        }
    }
}

/// Placement and sizing of the optional HA sibling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HaSettings {
    pub ha_subnet: String,
    /// Azure zone, or the GCP zone the sibling runs in.
    pub ha_zone: String,
    pub ha_gw_size: String,
    pub ha_insane_mode_az: String,
    pub ha_eip: String,
    pub ha_azure_eip_name_resource_group: String,
    pub ha_availability_domain: String,
    pub ha_fault_domain: String,
    pub ha_oob_management_subnet: String,
    pub ha_oob_availability_zone: String,
    pub ha_private_mode_subnet_zone: String,
    pub ha_subnet_ipv6_cidr: String,
}

impl HaSettings {
    /// Whether these settings declare a sibling. GCP siblings may be
    /// placed by zone alone.
    pub fn is_declared(&self, cloud: CloudType) -> bool {
        !self.ha_subnet.is_empty()
            || (cloud.belongs_to(CloudSet::GCP_RELATED) && !self.ha_zone.is_empty())
    }

    /// Fields that can only change by replacing the sibling.
    pub fn placement(&self) -> [(&'static str, &str); 9] {
        [
            (fields::HA_SUBNET, &self.ha_subnet),
            (fields::HA_ZONE, &self.ha_zone),
            (fields::HA_INSANE_MODE_AZ, &self.ha_insane_mode_az),
            (fields::HA_AVAILABILITY_DOMAIN, &self.ha_availability_domain),
            (fields::HA_FAULT_DOMAIN, &self.ha_fault_domain),
            (fields::HA_OOB_MANAGEMENT_SUBNET, &self.ha_oob_management_subnet),
            (fields::HA_OOB_AVAILABILITY_ZONE, &self.ha_oob_availability_zone),
            (
                fields::HA_PRIVATE_MODE_SUBNET_ZONE,
                &self.ha_private_mode_subnet_zone,
            ),
            (fields::HA_SUBNET_IPV6_CIDR, &self.ha_subnet_ipv6_cidr),
        ]
    }
}

/// Values reported by the controller, written by Read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayOutputs {
    pub public_ip: String,
    pub private_ip: String,
    pub cloud_instance_id: String,
    pub ha_gw_name: String,
    pub ha_public_ip: String,
    pub ha_private_ip: String,
    pub ha_cloud_instance_id: String,
}

impl GatewayConfig {
    /// Whether a sibling is declared.
    pub fn has_ha(&self) -> bool {
        self.ha.is_declared(self.cloud_type)
    }

    /// Name the controller gives this gateway's sibling.
    pub fn sibling_name(&self) -> String {
        format!("{}{HA_SUFFIX}", self.gw_name)
    }

    /// Current (planned-over-prior) configuration from the store.
    pub fn from_resource(d: &dyn ResourceData) -> Result<Self, ReconcileError> {
        Self::decode(|key| d.get(key))
    }

    /// The configuration as it stood at the last apply.
    pub fn prior_from_resource(d: &dyn ResourceData) -> Result<Self, ReconcileError> {
        Self::decode(|key| d.get_change(key).0)
    }

    fn decode(lookup: impl Fn(&str) -> Value) -> Result<Self, ReconcileError> {
        let map: Map<String, Value> = fields::DECLARED
            .iter()
            .chain(fields::COMPUTED.iter())
            .filter_map(|key| {
                let value = lookup(key);
                (!value.is_null()).then(|| ((*key).to_owned(), value))
            })
            .collect();

        if !map.contains_key(fields::CLOUD_TYPE) {
            return Err(ReconcileError::InvalidState {
                message: format!("{} is not set", fields::CLOUD_TYPE),
            });
        }

        serde_json::from_value(Value::Object(map)).map_err(|e| ReconcileError::InvalidState {
            message: e.to_string(),
        })
    }

    /// Write every field into the store.
    pub fn write_resource(&self, d: &mut dyn ResourceData) -> Result<(), ReconcileError> {
        for (key, value) in self.to_map()? {
            d.set(&key, value);
        }
        Ok(())
    }

    /// Declared fields whose values differ between `self` and `other`.
    pub fn drift(&self, other: &Self) -> Result<Vec<&'static str>, ReconcileError> {
        let mine = self.to_map()?;
        let theirs = other.to_map()?;
        Ok(fields::DECLARED
            .iter()
            .copied()
            .filter(|key| mine.get(*key) != theirs.get(*key))
            .collect())
    }

    fn to_map(&self) -> Result<Map<String, Value>, ReconcileError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ReconcileError::InvalidState {
                message: format!("gateway config serialized to {other}"),
            }),
            Err(e) => Err(ReconcileError::InvalidState {
                message: e.to_string(),
            }),
        }
    }
}
