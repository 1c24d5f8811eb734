// Shared helpers for the lifecycle tests: an in-process controller that
// records every call and echoes created gateways back the way the real
// controller encodes them.
#![allow(clippy::unwrap_used, dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde_json::{Value, json};

use gwsync_api::{
    CreateGatewayPayload, CreateHaGatewayPayload, Error, GatewayAction, GatewayInfo, NotReady,
};
use gwsync_core::codec::Placement;
use gwsync_core::{
    CloudSet, CloudType, ControlPlane, CreationDefaults, GatewayReconciler, MemoryResourceData,
    ReconcilerOptions,
};

/// Tunnel detection time the controller reports when none was set.
pub const DEFAULT_DETECTION_TIME: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(CreateGatewayPayload),
    CreateHa(CreateHaGatewayPayload),
    Get(String),
    Apply(GatewayAction),
    Delete(String),
}

#[derive(Default)]
struct State {
    gateways: BTreeMap<String, GatewayInfo>,
    calls: Vec<Call>,
    not_ready: HashMap<String, u32>,
    rejected: HashMap<String, String>,
    launched: u32,
}

/// Recording controller double.
#[derive(Default)]
pub struct FakeController {
    state: Mutex<State>,
}

impl FakeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Every call except reads.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::Get(_)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn gateway(&self, gw_name: &str) -> Option<GatewayInfo> {
        self.state.lock().unwrap().gateways.get(gw_name).cloned()
    }

    /// Drop a gateway behind the reconciler's back.
    pub fn forget(&self, gw_name: &str) {
        self.state.lock().unwrap().gateways.remove(gw_name);
    }

    /// Answer the next `times` calls of `action` with "gateway is not up".
    pub fn not_ready(&self, action: &str, times: u32) {
        self.state
            .lock()
            .unwrap()
            .not_ready
            .insert(action.to_owned(), times);
    }

    /// Fail every call of `action` with `reason`.
    pub fn reject(&self, action: &str, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .rejected
            .insert(action.to_owned(), reason.to_owned());
    }
}

fn not_found(gw_name: &str) -> Error {
    Error::NotFound {
        resource: gw_name.to_owned(),
    }
}

fn on_off(on: bool, yes: &str, no: &str) -> String {
    if on { yes.to_owned() } else { no.to_owned() }
}

/// Azure reports the zone, or the availability-set sentinel when there
/// is none.
fn azure_zone(placement: &Placement) -> String {
    if placement.zone.is_empty() {
        "AvailabilitySet".to_owned()
    } else {
        placement.zone.clone()
    }
}

impl State {
    fn next_address(&mut self) -> u32 {
        self.launched += 1;
        self.launched
    }

    fn echo_primary(&mut self, p: &CreateGatewayPayload) -> GatewayInfo {
        let cloud = CloudType::try_from(p.cloud_type).unwrap();
        let placement = Placement::decode(&p.gw_subnet);
        let n = self.next_address();
        let public_ip = p.eip.clone().unwrap_or_else(|| format!("54.0.0.{n}"));
        let defaults = CreationDefaults::default();
        let region = p.vpc_reg.clone().unwrap_or_default();

        GatewayInfo {
            gw_name: p.gw_name.clone(),
            cloud_type: p.cloud_type,
            account_name: p.account_name.clone(),
            vpc_id: p.vpc_id.clone(),
            vpc_region: region.clone(),
            gateway_zone: if cloud.belongs_to(CloudSet::GCP_RELATED) {
                region
            } else if cloud.belongs_to(CloudSet::AZURE_RELATED) {
                azure_zone(&placement)
            } else {
                String::new()
            },
            gw_size: p.gw_size.clone(),
            vpc_net: p.gw_subnet.clone(),
            availability_domain: p.availability_domain.clone().unwrap_or_default(),
            fault_domain: p.fault_domain.clone().unwrap_or_default(),
            insane_mode: on_off(p.insane_mode, "yes", "no"),
            allocate_new_eip: on_off(p.allocate_new_eip, "on", "off"),
            eip_details: p
                .azure_eip_name_resource_group
                .as_ref()
                .map(|group| format!("{group}:{public_ip}"))
                .unwrap_or_default(),
            public_ip,
            private_ip: format!("10.255.0.{n}"),
            cloud_instance_id: format!("i-{}", p.gw_name),
            private_oob: p.private_oob,
            oob_mgmt_subnet: p.oob_mgmt_subnet.clone().unwrap_or_default(),
            private_mode: p.private_mode_lb_vpc_id.is_some(),
            private_mode_lb_vpc_id: p.private_mode_lb_vpc_id.clone().unwrap_or_default(),
            enable_ipv6: p.enable_ipv6,
            enable_bgp: p.enable_bgp,
            learned_cidrs_approval: "off".into(),
            jumbo_frame: defaults.jumbo_frame_on(cloud),
            gro_gso: defaults.gro_gso_on(cloud),
            single_az_ha: "disabled".into(),
            vpc_dns_server: "Disabled".into(),
            tunnel_detection_time: Some(DEFAULT_DETECTION_TIME),
            tags: p.tags.clone().unwrap_or_default(),
            ..GatewayInfo::default()
        }
    }

    fn echo_sibling(&mut self, primary: &GatewayInfo, p: &CreateHaGatewayPayload) -> GatewayInfo {
        let cloud = CloudType::try_from(primary.cloud_type).unwrap();
        let placement = Placement::decode(&p.gw_subnet);
        let n = self.next_address();
        let public_ip = p.eip.clone().unwrap_or_else(|| format!("54.0.1.{n}"));

        GatewayInfo {
            gw_name: format!("{}-hagw", p.primary_gw_name),
            cloud_type: primary.cloud_type,
            account_name: primary.account_name.clone(),
            vpc_id: primary.vpc_id.clone(),
            vpc_region: primary.vpc_region.clone(),
            gateway_zone: if cloud.belongs_to(CloudSet::GCP_RELATED) {
                p.zone.clone().unwrap_or_default()
            } else if cloud.belongs_to(CloudSet::AZURE_RELATED) {
                azure_zone(&placement)
            } else {
                String::new()
            },
            gw_size: p.gw_size.clone(),
            vpc_net: p.gw_subnet.clone(),
            availability_domain: p.availability_domain.clone().unwrap_or_default(),
            fault_domain: p.fault_domain.clone().unwrap_or_default(),
            insane_mode: primary.insane_mode.clone(),
            allocate_new_eip: primary.allocate_new_eip.clone(),
            eip_details: p
                .azure_eip_name_resource_group
                .as_ref()
                .map(|group| format!("{group}:{public_ip}"))
                .unwrap_or_default(),
            public_ip,
            private_ip: format!("10.255.1.{n}"),
            cloud_instance_id: format!("i-{}-hagw", p.primary_gw_name),
            oob_mgmt_subnet: p.oob_mgmt_subnet.clone().unwrap_or_default(),
            primary_gw_name: p.primary_gw_name.clone(),
            ..GatewayInfo::default()
        }
    }

    fn gate(&mut self, action: &str) -> Result<(), Error> {
        if let Some(reason) = self.rejected.get(action) {
            return Err(Error::Api {
                action: action.to_owned(),
                reason: reason.clone(),
                condition: NotReady::classify(reason),
            });
        }
        if let Some(remaining) = self.not_ready.get_mut(action) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Api {
                    action: action.to_owned(),
                    reason: "gateway is not up".into(),
                    condition: Some(NotReady::GatewayNotUp),
                });
            }
        }
        Ok(())
    }
}

fn apply_to(gw: &mut GatewayInfo, action: &GatewayAction) {
    match action {
        GatewayAction::Resize { gw_size, .. } => gw.gw_size.clone_from(gw_size),
        GatewayAction::SetJumboFrame { enabled, .. } => gw.jumbo_frame = *enabled,
        GatewayAction::SetGroGso { enabled, .. } => gw.gro_gso = *enabled,
        GatewayAction::SetSingleAzHa { enabled, .. } => {
            gw.single_az_ha = on_off(*enabled, "enabled", "disabled");
        }
        GatewayAction::SetVpcDnsServer { enabled, .. } => {
            gw.vpc_dns_server = on_off(*enabled, "Enabled", "Disabled");
        }
        GatewayAction::SetMonitorSubnets {
            enabled,
            excluded_instances,
            ..
        } => {
            gw.monitor_subnets = *enabled;
            gw.monitor_exclude_gw_list.clone_from(excluded_instances);
        }
        GatewayAction::SetTunnelDetectionTime { seconds, .. } => {
            gw.tunnel_detection_time = Some(seconds.unwrap_or(DEFAULT_DETECTION_TIME));
        }
        GatewayAction::SetLocalAsNumber { asn, .. } => gw.local_as_number.clone_from(asn),
        GatewayAction::SetBgpEcmp { enabled, .. } => gw.bgp_ecmp = *enabled,
        GatewayAction::SetPreserveAsPath { enabled, .. } => gw.preserve_as_path = *enabled,
        GatewayAction::SetLearnedCidrsApproval { enabled, .. } => {
            gw.learned_cidrs_approval = on_off(*enabled, "on", "off");
        }
        GatewayAction::SetApprovedLearnedCidrs { cidrs, .. } => {
            gw.approved_learned_cidrs.clone_from(cidrs);
        }
        GatewayAction::SetBgpManualAdvertiseCidrs { cidrs, .. } => {
            gw.bgp_manual_spoke_advertise_cidrs = cidrs.join(",");
        }
        GatewayAction::SetActiveStandby {
            enabled,
            preemptive,
            ..
        } => {
            gw.active_standby = *enabled;
            gw.active_standby_preemptive = *preemptive;
        }
        GatewayAction::CustomizeVpcRoutes { cidrs, .. } => {
            gw.customized_spoke_vpc_routes = cidrs.join(",");
        }
        GatewayAction::FilterAdvertisedRoutes { cidrs, .. } => {
            gw.filtered_spoke_vpc_routes = cidrs.join(",");
        }
        GatewayAction::IncludeAdvertisedRoutes { cidrs, .. } => {
            gw.include_cidr_list = cidrs.join(",");
        }
        GatewayAction::SetSingleIpSnat { enabled, .. } => gw.single_ip_snat = *enabled,
        GatewayAction::UpdateTags { tags, .. } => gw.tags.clone_from(tags),
    }
}

impl ControlPlane for FakeController {
    async fn create_gateway(&self, request: &CreateGatewayPayload) -> Result<String, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(request.clone()));
        state.gate("create_multicloud_primary_gateway")?;

        let info = state.echo_primary(request);
        state.gateways.insert(request.gw_name.clone(), info);
        Ok(request.gw_name.clone())
    }

    async fn create_ha_gateway(&self, request: &CreateHaGatewayPayload) -> Result<String, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateHa(request.clone()));
        state.gate("create_multicloud_ha_gateway")?;

        let primary = state
            .gateways
            .get(&request.primary_gw_name)
            .cloned()
            .ok_or_else(|| not_found(&request.primary_gw_name))?;
        let sibling = state.echo_sibling(&primary, request);
        let name = sibling.gw_name.clone();
        state.gateways.insert(name.clone(), sibling);
        if let Some(primary) = state.gateways.get_mut(&request.primary_gw_name) {
            primary.ha_gw_name.clone_from(&name);
        }
        Ok(name)
    }

    async fn get_gateway(&self, gw_name: &str) -> Result<GatewayInfo, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get(gw_name.to_owned()));
        state
            .gateways
            .get(gw_name)
            .cloned()
            .ok_or_else(|| not_found(gw_name))
    }

    async fn apply(&self, action: &GatewayAction) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Apply(action.clone()));
        state.gate(action.action_name())?;

        let gw = state
            .gateways
            .get_mut(action.gw_name())
            .ok_or_else(|| not_found(action.gw_name()))?;
        apply_to(gw, action);
        Ok(())
    }

    async fn delete_gateway(&self, _cloud_type: CloudType, gw_name: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(gw_name.to_owned()));
        state.gate("delete_container")?;

        let removed = state
            .gateways
            .remove(gw_name)
            .ok_or_else(|| not_found(gw_name))?;
        if !removed.primary_gw_name.is_empty() {
            if let Some(primary) = state.gateways.get_mut(&removed.primary_gw_name) {
                primary.ha_gw_name.clear();
            }
        }
        Ok(())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn reconciler() -> GatewayReconciler<FakeController> {
    GatewayReconciler::new(FakeController::new(), ReconcilerOptions::default())
}

pub fn reconciler_with(options: ReconcilerOptions) -> GatewayReconciler<FakeController> {
    GatewayReconciler::new(FakeController::new(), options)
}

/// Minimal AWS spoke without HA.
pub fn aws_spoke() -> Value {
    json!({
        "cloud_type": 1,
        "account_name": "aws-prod",
        "gw_name": "spoke-1",
        "vpc_id": "vpc-0abc",
        "vpc_reg": "us-east-1",
        "gw_size": "t3.small",
        "subnet": "10.0.1.0/24",
        "insane_mode": false,
    })
}

pub fn azure_spoke() -> Value {
    json!({
        "cloud_type": 8,
        "account_name": "azure-prod",
        "gw_name": "spoke-az",
        "vpc_id": "vnet-1:rg-net:0000-1111",
        "vpc_reg": "East US",
        "gw_size": "Standard_B1ms",
        "subnet": "10.0.1.0/24",
        "zone": "az-2",
    })
}

pub fn gcp_spoke() -> Value {
    json!({
        "cloud_type": 4,
        "account_name": "gcp-prod",
        "gw_name": "spoke-gcp",
        "vpc_id": "vpc-gcp~-~project-1",
        "vpc_reg": "us-west1-b",
        "gw_size": "n1-standard-1",
        "subnet": "10.0.1.0/24",
    })
}

/// `base` with the members of `extra` added or replaced.
pub fn with(mut base: Value, extra: Value) -> Value {
    if let (Some(map), Value::Object(extra)) = (base.as_object_mut(), extra) {
        map.extend(extra);
    }
    base
}

/// An AWS spoke with BGP, route customisation, tags and an HA sibling.
pub fn aws_full() -> Value {
    with(
        aws_spoke(),
        json!({
            "enable_bgp": true,
            "local_as_number": "65001",
            "enable_bgp_ecmp": true,
            "enable_learned_cidrs_approval": true,
            "approved_learned_cidrs": ["10.10.0.0/16"],
            "bgp_manual_advertise_cidrs": ["10.20.0.0/16", "10.21.0.0/16"],
            "enable_active_standby": true,
            "enable_jumbo_frame": false,
            "single_az_ha": true,
            "enable_vpc_dns_server": true,
            "enable_monitor_gateway_subnets": true,
            "monitor_exclude_list": ["i-0123"],
            "tunnel_detection_time": 60,
            "customized_vpc_routes": ["10.2.0.0/16", "10.1.0.0/16"],
            "tags": { "env": "prod" },
            "ha_subnet": "10.0.2.0/24",
            "ha_gw_size": "t3.small",
        }),
    )
}

/// Short names of `calls`, for asserting order.
pub fn names(calls: &[Call]) -> Vec<String> {
    calls
        .iter()
        .map(|call| match call {
            Call::Create(p) => format!("create {}", p.gw_name),
            Call::CreateHa(p) => format!("create_ha {}", p.primary_gw_name),
            Call::Get(name) => format!("get {name}"),
            Call::Apply(action) => action.action_name().to_owned(),
            Call::Delete(name) => format!("delete {name}"),
        })
        .collect()
}

/// A store holding `values` as the planned configuration.
pub fn store(values: Value) -> MemoryResourceData {
    MemoryResourceData::planned(values)
}

/// Create `values` and commit the plan, as the framework does after a
/// successful apply. Clears the call log.
pub async fn created(
    reconciler: &GatewayReconciler<FakeController>,
    values: Value,
) -> MemoryResourceData {
    let mut d = store(values);
    reconciler.create(&mut d).await.unwrap();
    d.commit();
    reconciler.plane().clear_calls();
    d
}
