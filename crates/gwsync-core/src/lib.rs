//! Reconciliation of cloud gateways against a network controller.
//!
//! This crate owns the domain model and the lifecycle logic for one
//! primary gateway and its optional HA sibling:
//!
//! - **[`GatewayReconciler`]**: the Create / Read / Update / Delete entry
//!   points. Each takes a [`ResourceData`] store and talks to the
//!   controller through a [`ControlPlane`].
//!
//! - **Validation and marshaling** ([`mod@validate`], [`marshal`]): cloud-scoped
//!   cross-field rules, the create payloads, and the narrow per-group
//!   [`GatewayAction`](gwsync_api::GatewayAction)s used after creation and
//!   on update.
//!
//! - **HA sibling** ([`ha`]): create, delete, resize or recreate the sibling
//!   from the old and new HA settings.
//!
//! - **Projection** ([`project()`]): turns the controller's flattened
//!   gateway record back into a [`GatewayConfig`] for drift detection.

pub mod codec;
pub mod error;
pub mod ha;
pub mod lifecycle;
pub mod marshal;
pub mod model;
pub mod options;
pub mod plane;
pub mod project;
pub mod resource;
pub mod retry;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use codec::Placement;
pub use error::ReconcileError;
pub use ha::HaPlan;
pub use lifecycle::{GatewayReconciler, Phase, ReadOutcome};
pub use marshal::{FieldGroup, Step};
pub use model::{CloudFamily, CloudSet, CloudType, GatewayConfig, GatewayOutputs, HaSettings};
pub use options::{CreationDefaults, ReconcilerOptions, RetryPolicy};
pub use plane::ControlPlane;
pub use project::project;
pub use resource::{MemoryResourceData, ResourceData};
pub use validate::validate;
