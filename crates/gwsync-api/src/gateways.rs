// Gateway endpoints
//
// Whole-object lifecycle calls: primary and HA creation, info reads,
// and deletion. Narrow attribute edits live in `actions`.

use serde_json::{Value, json};
use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::{CreateGatewayPayload, CreateHaGatewayPayload, GatewayInfo};

impl ControllerClient {
    /// Launch a primary gateway.
    ///
    /// `POST /v2/api` `action=create_multicloud_primary_gateway`
    pub async fn create_gateway(&self, payload: &CreateGatewayPayload) -> Result<(), Error> {
        debug!(gw_name = %payload.gw_name, cloud_type = payload.cloud_type, "creating gateway");
        let params = serde_json::to_value(payload).map_err(|e| Error::Encoding(e.to_string()))?;
        let _: Value = self
            .post("create_multicloud_primary_gateway", params)
            .await?;
        Ok(())
    }

    /// Launch the HA sibling of an existing primary.
    ///
    /// `POST /v2/api` `action=create_multicloud_ha_gateway`
    pub async fn create_ha_gateway(&self, payload: &CreateHaGatewayPayload) -> Result<(), Error> {
        debug!(primary = %payload.primary_gw_name, "creating HA gateway");
        let params = serde_json::to_value(payload).map_err(|e| Error::Encoding(e.to_string()))?;
        let _: Value = self.post("create_multicloud_ha_gateway", params).await?;
        Ok(())
    }

    /// Fetch one gateway.
    ///
    /// `GET /v2/api?action=get_gateway_info&gateway_name=...`.
    /// Returns [`Error::NotFound`] when the controller has no such gateway.
    pub async fn get_gateway_info(&self, gw_name: &str) -> Result<GatewayInfo, Error> {
        debug!(gw_name, "fetching gateway info");
        self.get("get_gateway_info", &[("gateway_name", gw_name)])
            .await
    }

    /// Delete a gateway (primary or HA sibling).
    ///
    /// `POST /v2/api` `action=delete_container`
    pub async fn delete_gateway(&self, cloud_type: u32, gw_name: &str) -> Result<(), Error> {
        debug!(gw_name, cloud_type, "deleting gateway");
        let _: Value = self
            .post(
                "delete_container",
                json!({
                    "cloud_type": cloud_type,
                    "gw_name": gw_name,
                }),
            )
            .await?;
        Ok(())
    }
}
