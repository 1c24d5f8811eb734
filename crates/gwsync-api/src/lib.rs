// gwsync-api: Async Rust client for the network controller's gateway action API

pub mod actions;
pub mod auth;
pub mod client;
pub mod error;
pub mod gateways;
pub mod models;
pub mod transport;

pub use actions::GatewayAction;
pub use client::ControllerClient;
pub use error::{Error, NotReady};
pub use models::{CreateGatewayPayload, CreateHaGatewayPayload, GatewayInfo};
pub use transport::{TlsMode, TransportConfig};
