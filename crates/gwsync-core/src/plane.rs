// ── Control-plane seam ──
//
// The lifecycle talks to the controller only through `ControlPlane`.
// `ControllerClient` implements it over HTTP; tests substitute an
// in-process double.

use std::future::Future;

use gwsync_api::{
    ControllerClient, CreateGatewayPayload, CreateHaGatewayPayload, Error, GatewayAction,
    GatewayInfo,
};

use crate::model::{CloudType, HA_SUFFIX};

/// Remote operations on gateways.
///
/// `get_gateway` and `delete_gateway` report a missing gateway with an
/// error for which [`Error::is_not_found`] holds.
pub trait ControlPlane: Send + Sync {
    /// Launch a primary; returns its identifier.
    fn create_gateway(
        &self,
        request: &CreateGatewayPayload,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    /// Launch the sibling of `request.primary_gw_name`; returns its name.
    fn create_ha_gateway(
        &self,
        request: &CreateHaGatewayPayload,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    fn get_gateway(&self, gw_name: &str) -> impl Future<Output = Result<GatewayInfo, Error>> + Send;

    /// Apply one narrow edit.
    fn apply(&self, action: &GatewayAction) -> impl Future<Output = Result<(), Error>> + Send;

    fn delete_gateway(
        &self,
        cloud_type: CloudType,
        gw_name: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

impl ControlPlane for ControllerClient {
    async fn create_gateway(&self, request: &CreateGatewayPayload) -> Result<String, Error> {
        ControllerClient::create_gateway(self, request).await?;
        Ok(request.gw_name.clone())
    }

    async fn create_ha_gateway(&self, request: &CreateHaGatewayPayload) -> Result<String, Error> {
        ControllerClient::create_ha_gateway(self, request).await?;
        Ok(format!("{}{HA_SUFFIX}", request.primary_gw_name))
    }

    async fn get_gateway(&self, gw_name: &str) -> Result<GatewayInfo, Error> {
        self.get_gateway_info(gw_name).await
    }

    async fn apply(&self, action: &GatewayAction) -> Result<(), Error> {
        self.apply_action(action).await
    }

    async fn delete_gateway(&self, cloud_type: CloudType, gw_name: &str) -> Result<(), Error> {
        ControllerClient::delete_gateway(self, cloud_type.code(), gw_name).await
    }
}
