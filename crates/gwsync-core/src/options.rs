// ── Reconciler options ──
//
// Plain values handed in by the embedding application. The core never
// reads files or the environment itself.

use std::time::Duration;

use gwsync_api::NotReady;

use crate::model::{CloudSet, CloudType};

/// Bounded fixed-interval retry for calls that fail while a gateway is
/// still provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub interval: Duration,
    /// Conditions worth waiting out. Anything else fails immediately.
    pub retry_on: &'static [NotReady],
}

impl RetryPolicy {
    /// Route table edits.
    pub const ROUTES: Self = Self {
        max_attempts: 30,
        interval: Duration::from_secs(10),
        retry_on: &NotReady::ALL,
    };

    /// Advertisement list edits.
    pub const ADVERTISE: Self = Self {
        max_attempts: 10,
        interval: Duration::from_secs(10),
        retry_on: &NotReady::ALL,
    };

    pub fn with_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    pub fn retries(&self, condition: NotReady) -> bool {
        self.retry_on.contains(&condition)
    }
}

/// Features the controller switches on by itself when a gateway is
/// created, per cloud. Create issues a disable call when the caller
/// declared one of these off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationDefaults {
    pub jumbo_frame: CloudSet,
    pub gro_gso: CloudSet,
}

impl Default for CreationDefaults {
    fn default() -> Self {
        Self {
            jumbo_frame: CloudSet::AWS_RELATED.union(CloudSet::GCP_RELATED),
            gro_gso: CloudSet::ALL,
        }
    }
}

impl CreationDefaults {
    pub fn jumbo_frame_on(&self, cloud: CloudType) -> bool {
        cloud.belongs_to(self.jumbo_frame)
    }

    pub fn gro_gso_on(&self, cloud: CloudType) -> bool {
        cloud.belongs_to(self.gro_gso)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerOptions {
    pub route_retry: RetryPolicy,
    pub advertise_retry: RetryPolicy,
    pub creation_defaults: CreationDefaults,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            route_retry: RetryPolicy::ROUTES,
            advertise_retry: RetryPolicy::ADVERTISE,
            creation_defaults: CreationDefaults::default(),
        }
    }
}
