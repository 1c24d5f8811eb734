// ── Domain model ──
//
// Cloud identities and the declarative gateway configuration.

pub mod cloud;
pub mod gateway;

pub use cloud::{CloudFamily, CloudSet, CloudType, UnknownCloudType};
pub use gateway::{GatewayConfig, GatewayOutputs, HA_SUFFIX, HaSettings, fields};
