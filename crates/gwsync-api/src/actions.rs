// Narrow gateway edits
//
// The controller has no "update gateway" call. Each mutable attribute is
// changed through its own action, so updates are expressed as a sequence
// of `GatewayAction`s.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;

/// One single-attribute edit against a named gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayAction {
    Resize {
        gw_name: String,
        gw_size: String,
    },
    SetJumboFrame {
        gw_name: String,
        enabled: bool,
    },
    SetGroGso {
        gw_name: String,
        enabled: bool,
    },
    SetSingleAzHa {
        gw_name: String,
        enabled: bool,
    },
    SetVpcDnsServer {
        gw_name: String,
        enabled: bool,
    },
    SetMonitorSubnets {
        gw_name: String,
        enabled: bool,
        excluded_instances: Vec<String>,
    },
    /// `None` resets the controller default.
    SetTunnelDetectionTime {
        gw_name: String,
        seconds: Option<u32>,
    },
    SetLocalAsNumber {
        gw_name: String,
        asn: String,
    },
    SetBgpEcmp {
        gw_name: String,
        enabled: bool,
    },
    SetPreserveAsPath {
        gw_name: String,
        enabled: bool,
    },
    SetLearnedCidrsApproval {
        gw_name: String,
        enabled: bool,
    },
    SetApprovedLearnedCidrs {
        gw_name: String,
        cidrs: Vec<String>,
    },
    SetBgpManualAdvertiseCidrs {
        gw_name: String,
        cidrs: Vec<String>,
    },
    SetActiveStandby {
        gw_name: String,
        enabled: bool,
        preemptive: bool,
    },
    CustomizeVpcRoutes {
        gw_name: String,
        cidrs: Vec<String>,
    },
    FilterAdvertisedRoutes {
        gw_name: String,
        cidrs: Vec<String>,
    },
    IncludeAdvertisedRoutes {
        gw_name: String,
        cidrs: Vec<String>,
    },
    SetSingleIpSnat {
        gw_name: String,
        enabled: bool,
    },
    UpdateTags {
        cloud_type: u32,
        gw_name: String,
        tags: BTreeMap<String, String>,
    },
}

fn toggle(enabled: bool, on: &'static str, off: &'static str) -> &'static str {
    if enabled { on } else { off }
}

impl GatewayAction {
    /// The gateway this action edits.
    pub fn gw_name(&self) -> &str {
        match self {
            Self::Resize { gw_name, .. }
            | Self::SetJumboFrame { gw_name, .. }
            | Self::SetGroGso { gw_name, .. }
            | Self::SetSingleAzHa { gw_name, .. }
            | Self::SetVpcDnsServer { gw_name, .. }
            | Self::SetMonitorSubnets { gw_name, .. }
            | Self::SetTunnelDetectionTime { gw_name, .. }
            | Self::SetLocalAsNumber { gw_name, .. }
            | Self::SetBgpEcmp { gw_name, .. }
            | Self::SetPreserveAsPath { gw_name, .. }
            | Self::SetLearnedCidrsApproval { gw_name, .. }
            | Self::SetApprovedLearnedCidrs { gw_name, .. }
            | Self::SetBgpManualAdvertiseCidrs { gw_name, .. }
            | Self::SetActiveStandby { gw_name, .. }
            | Self::CustomizeVpcRoutes { gw_name, .. }
            | Self::FilterAdvertisedRoutes { gw_name, .. }
            | Self::IncludeAdvertisedRoutes { gw_name, .. }
            | Self::SetSingleIpSnat { gw_name, .. }
            | Self::UpdateTags { gw_name, .. } => gw_name,
        }
    }

    /// Controller action name.
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "edit_gw_config",
            Self::SetJumboFrame { enabled, .. } => {
                toggle(*enabled, "enable_jumbo_frame", "disable_jumbo_frame")
            }
            Self::SetGroGso { enabled, .. } => toggle(*enabled, "enable_gro_gso", "disable_gro_gso"),
            Self::SetSingleAzHa { enabled, .. } => {
                toggle(*enabled, "enable_single_az_ha", "disable_single_az_ha")
            }
            Self::SetVpcDnsServer { enabled, .. } => {
                toggle(*enabled, "enable_vpc_dns_server", "disable_vpc_dns_server")
            }
            Self::SetMonitorSubnets { enabled, .. } => toggle(
                *enabled,
                "enable_monitor_gateway_subnets",
                "disable_monitor_gateway_subnets",
            ),
            Self::SetTunnelDetectionTime { .. } => "modify_detection_time",
            Self::SetLocalAsNumber { .. } => "edit_transit_local_as_number",
            Self::SetBgpEcmp { .. } => "set_bgp_ecmp",
            Self::SetPreserveAsPath { enabled, .. } => {
                toggle(*enabled, "enable_preserve_as_path", "disable_preserve_as_path")
            }
            Self::SetLearnedCidrsApproval { enabled, .. } => toggle(
                *enabled,
                "enable_bgp_gateway_cidr_approval",
                "disable_bgp_gateway_cidr_approval",
            ),
            Self::SetApprovedLearnedCidrs { .. } => "set_bgp_gateway_approved_cidr_rules",
            Self::SetBgpManualAdvertiseCidrs { .. } => "edit_bgp_manual_advertise_cidrs",
            Self::SetActiveStandby { enabled, .. } => {
                toggle(*enabled, "enable_active_standby", "disable_active_standby")
            }
            Self::CustomizeVpcRoutes { .. } => "edit_gateway_custom_routes",
            Self::FilterAdvertisedRoutes { .. } => "edit_gateway_filter_routes",
            Self::IncludeAdvertisedRoutes { .. } => "edit_gateway_advertised_cidr",
            Self::SetSingleIpSnat { enabled, .. } => {
                toggle(*enabled, "enable_snat", "disable_snat")
            }
            Self::UpdateTags { .. } => "update_resource_tags",
        }
    }

    /// JSON parameters, without `action` and `CID`.
    pub fn params(&self) -> Value {
        let gw_name = self.gw_name();
        match self {
            Self::Resize { gw_size, .. } => json!({ "gateway_name": gw_name, "gw_size": gw_size }),
            Self::SetMonitorSubnets {
                excluded_instances, ..
            } => json!({
                "gateway_name": gw_name,
                "monitor_exclude_gateways": excluded_instances.join(","),
            }),
            Self::SetTunnelDetectionTime { seconds, .. } => json!({
                "gateway_name": gw_name,
                "detection_time": seconds.map_or_else(|| "default".to_owned(), |s| s.to_string()),
            }),
            Self::SetLocalAsNumber { asn, .. } => {
                json!({ "gateway_name": gw_name, "local_as_num": asn })
            }
            Self::SetBgpEcmp { enabled, .. } => {
                json!({ "gateway_name": gw_name, "enable_ecmp": enabled })
            }
            Self::SetActiveStandby { preemptive, .. } => {
                json!({ "gateway_name": gw_name, "preemptive": preemptive })
            }
            Self::SetApprovedLearnedCidrs { cidrs, .. } => {
                json!({ "gateway_name": gw_name, "approved_learned_cidrs": cidrs })
            }
            Self::SetBgpManualAdvertiseCidrs { cidrs, .. } => json!({
                "gateway_name": gw_name,
                "cidrs": cidrs.join(","),
            }),
            Self::CustomizeVpcRoutes { cidrs, .. } => json!({
                "gateway_name": gw_name,
                "cidr": cidrs.join(","),
            }),
            Self::FilterAdvertisedRoutes { cidrs, .. } => json!({
                "gateway_name": gw_name,
                "cidr": cidrs.join(","),
            }),
            Self::IncludeAdvertisedRoutes { cidrs, .. } => json!({
                "gateway_name": gw_name,
                "cidr": cidrs.join(","),
            }),
            Self::UpdateTags {
                cloud_type, tags, ..
            } => json!({
                "cloud_type": cloud_type,
                "resource_type": "gw",
                "resource_name": gw_name,
                "new_tag_list": tags,
            }),
            Self::SetJumboFrame { .. }
            | Self::SetGroGso { .. }
            | Self::SetSingleAzHa { .. }
            | Self::SetVpcDnsServer { .. }
            | Self::SetPreserveAsPath { .. }
            | Self::SetLearnedCidrsApproval { .. }
            | Self::SetSingleIpSnat { .. } => json!({ "gateway_name": gw_name }),
        }
    }
}

impl ControllerClient {
    /// Apply one narrow edit.
    ///
    /// `POST /v2/api` with the action's name and parameters.
    pub async fn apply_action(&self, action: &GatewayAction) -> Result<(), Error> {
        let name = action.action_name();
        debug!(gw_name = action.gw_name(), action = name, "applying gateway action");
        let _: Value = self.post(name, action.params()).await?;
        Ok(())
    }
}
