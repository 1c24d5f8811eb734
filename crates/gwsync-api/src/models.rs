// Controller API wire types
//
// Request payloads and response models for the `/v2/api` action endpoint.
// Every response is wrapped in `ApiResponse`. Response fields use
// `#[serde(default)]` liberally because the controller omits fields that
// do not apply to a gateway's cloud.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard controller response envelope.
///
/// ```json
/// { "return": true, "results": { ... }, "reason": "optional" }
/// ```
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(rename = "return")]
    pub ok: bool,
    #[serde(default)]
    pub results: serde_json::Value,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Login answer. The session id comes back at the top level.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "return")]
    pub ok: bool,
    #[serde(rename = "CID", default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ── Requests ─────────────────────────────────────────────────────────

/// Body of `create_multicloud_primary_gateway`.
///
/// `gw_subnet` is the composite placement string (subnet plus positional
/// suffixes); the caller assembles it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGatewayPayload {
    pub cloud_type: u32,
    pub account_name: String,
    pub gw_name: String,
    pub vpc_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_reg: Option<String>,
    pub gw_size: String,
    pub gw_subnet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_domain: Option<String>,
    pub insane_mode: bool,
    pub allocate_new_eip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_eip_name_resource_group: Option<String>,
    pub private_oob: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oob_mgmt_subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_mode_lb_vpc_id: Option<String>,
    pub enable_ipv6: bool,
    pub enable_bgp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// Body of `create_multicloud_ha_gateway`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateHaGatewayPayload {
    pub primary_gw_name: String,
    pub gw_subnet: String,
    pub gw_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_eip_name_resource_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oob_mgmt_subnet: Option<String>,
}

// ── Gateway ──────────────────────────────────────────────────────────

/// Gateway object from `get_gateway_info`.
///
/// The controller flattens everything and encodes several attributes in
/// its own way: `"yes"`/`"no"` and `"on"`/`"off"` strings for some flags,
/// comma-joined CIDR lists, `gateway_zone` with the `AvailabilitySet`
/// sentinel on Azure, the composite placement string in `vpc_net`, and
/// the Azure EIP as `name:resource_group[:ip]` in `eip_details`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayInfo {
    pub gw_name: String,
    pub cloud_type: u32,
    pub account_name: String,
    pub vpc_id: String,
    pub vpc_region: String,
    pub gateway_zone: String,
    pub gw_size: String,
    pub vpc_net: String,
    pub availability_domain: String,
    pub fault_domain: String,
    /// `"yes"` / `"no"`
    pub insane_mode: String,
    /// `"on"` / `"off"`
    pub allocate_new_eip: String,
    pub public_ip: String,
    pub private_ip: String,
    pub eip_details: String,
    pub cloud_instance_id: String,
    pub private_oob: bool,
    pub oob_mgmt_subnet: String,
    pub private_mode: bool,
    pub private_mode_lb_vpc_id: String,
    pub enable_ipv6: bool,
    pub enable_bgp: bool,
    pub local_as_number: String,
    pub bgp_ecmp: bool,
    pub preserve_as_path: bool,
    /// `"on"` / `"off"`
    pub learned_cidrs_approval: String,
    pub approved_learned_cidrs: Vec<String>,
    pub bgp_manual_spoke_advertise_cidrs: String,
    pub active_standby: bool,
    pub active_standby_preemptive: bool,
    pub jumbo_frame: bool,
    pub gro_gso: bool,
    /// `"enabled"` / `"disabled"`
    pub single_az_ha: String,
    /// `"Enabled"` / `"Disabled"`
    pub vpc_dns_server: String,
    pub monitor_subnets: bool,
    pub monitor_exclude_gw_list: Vec<String>,
    pub tunnel_detection_time: Option<u32>,
    pub single_ip_snat: bool,
    pub customized_spoke_vpc_routes: String,
    pub filtered_spoke_vpc_routes: String,
    pub include_cidr_list: String,
    pub tags: BTreeMap<String, String>,
    /// Name of the HA sibling, empty when there is none.
    pub ha_gw_name: String,
    /// Set on an HA sibling: the gateway it backs up.
    pub primary_gw_name: String,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
