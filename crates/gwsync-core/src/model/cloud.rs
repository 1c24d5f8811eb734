// ── Cloud provider types ──
//
// The controller identifies clouds with single-bit integer codes. Inside
// the core they are a closed enum; families are named `CloudSet`s and
// membership is tested with `CloudType::belongs_to`.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

/// A cloud (or sub-cloud) a gateway can be launched in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(try_from = "u32", into = "u32")]
pub enum CloudType {
    #[default]
    #[strum(serialize = "AWS")]
    Aws,
    #[strum(serialize = "GCP")]
    Gcp,
    #[strum(serialize = "Azure")]
    Azure,
    #[strum(serialize = "OCI")]
    Oci,
    #[strum(serialize = "Azure Government")]
    AzureGov,
    #[strum(serialize = "AWS GovCloud")]
    AwsGov,
    #[strum(serialize = "AWS China")]
    AwsChina,
    #[strum(serialize = "Azure China")]
    AzureChina,
    #[strum(serialize = "Alibaba Cloud")]
    AliCloud,
    #[strum(serialize = "AWS Top Secret")]
    AwsTopSecret,
    #[strum(serialize = "AWS Secret")]
    AwsSecret,
    #[strum(serialize = "Edge CSP")]
    EdgeCsp,
    #[strum(serialize = "Edge Equinix")]
    EdgeEquinix,
    #[strum(serialize = "Edge NEO")]
    EdgeNeo,
    #[strum(serialize = "Edge Megaport")]
    EdgeMegaport,
}

impl CloudType {
    /// Wire code used by the controller.
    pub const fn code(self) -> u32 {
        match self {
            Self::Aws => 1,
            Self::Gcp => 4,
            Self::Azure => 8,
            Self::Oci => 16,
            Self::AzureGov => 32,
            Self::AwsGov => 256,
            Self::AwsChina => 1024,
            Self::AzureChina => 2048,
            Self::AliCloud => 8192,
            Self::AwsTopSecret => 16384,
            Self::AwsSecret => 32768,
            Self::EdgeCsp => 65536,
            Self::EdgeNeo => 262_144,
            Self::EdgeEquinix => 524_288,
            Self::EdgeMegaport => 1_048_576,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::iter().find(|cloud| cloud.code() == code)
    }

    pub const fn belongs_to(self, set: CloudSet) -> bool {
        set.contains(self)
    }

    /// The provider family this cloud is a variant of.
    pub const fn family(self) -> CloudFamily {
        match self {
            Self::Aws | Self::AwsGov | Self::AwsChina | Self::AwsTopSecret | Self::AwsSecret => {
                CloudFamily::Aws
            }
            Self::Azure | Self::AzureGov | Self::AzureChina => CloudFamily::Azure,
            Self::Gcp => CloudFamily::Gcp,
            Self::Oci => CloudFamily::Oci,
            Self::AliCloud => CloudFamily::AliCloud,
            Self::EdgeCsp | Self::EdgeEquinix | Self::EdgeNeo | Self::EdgeMegaport => {
                CloudFamily::Edge
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown cloud type code {0}")]
pub struct UnknownCloudType(pub u32);

impl TryFrom<u32> for CloudType {
    type Error = UnknownCloudType;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(UnknownCloudType(code))
    }
}

impl From<CloudType> for u32 {
    fn from(cloud: CloudType) -> Self {
        cloud.code()
    }
}

// ── Families ─────────────────────────────────────────────────────────

/// Provider family, as named in settings files.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CloudFamily {
    Aws,
    Azure,
    Gcp,
    Oci,
    #[serde(alias = "ali")]
    AliCloud,
    Edge,
}

impl CloudFamily {
    pub const fn members(self) -> CloudSet {
        match self {
            Self::Aws => CloudSet::AWS_RELATED,
            Self::Azure => CloudSet::AZURE_RELATED,
            Self::Gcp => CloudSet::GCP_RELATED,
            Self::Oci => CloudSet::OCI_RELATED,
            Self::AliCloud => CloudSet::ALI_RELATED,
            Self::Edge => CloudSet::EDGE_RELATED,
        }
    }
}

/// A set of clouds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CloudSet(u32);

impl CloudSet {
    pub const EMPTY: Self = Self(0);

    pub const AWS_RELATED: Self = Self::of(&[
        CloudType::Aws,
        CloudType::AwsGov,
        CloudType::AwsChina,
        CloudType::AwsTopSecret,
        CloudType::AwsSecret,
    ]);
    pub const AZURE_RELATED: Self =
        Self::of(&[CloudType::Azure, CloudType::AzureGov, CloudType::AzureChina]);
    pub const GCP_RELATED: Self = Self::of(&[CloudType::Gcp]);
    pub const OCI_RELATED: Self = Self::of(&[CloudType::Oci]);
    pub const ALI_RELATED: Self = Self::of(&[CloudType::AliCloud]);
    pub const EDGE_RELATED: Self = Self::of(&[
        CloudType::EdgeCsp,
        CloudType::EdgeEquinix,
        CloudType::EdgeNeo,
        CloudType::EdgeMegaport,
    ]);

    pub const AWS_AZURE: Self = Self::AWS_RELATED.union(Self::AZURE_RELATED);
    pub const AZURE_GCP: Self = Self::AZURE_RELATED.union(Self::GCP_RELATED);
    pub const AWS_GCP_AZURE: Self = Self::AWS_AZURE.union(Self::GCP_RELATED);
    pub const AWS_GCP_AZURE_OCI: Self = Self::AWS_GCP_AZURE.union(Self::OCI_RELATED);
    pub const AWS_GCP_AZURE_EDGE: Self = Self::AWS_GCP_AZURE.union(Self::EDGE_RELATED);
    pub const ALL: Self = Self::AWS_GCP_AZURE_OCI
        .union(Self::ALI_RELATED)
        .union(Self::EDGE_RELATED);

    pub const fn of(members: &[CloudType]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < members.len() {
            bits |= members[i].code();
            i += 1;
        }
        Self(bits)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, cloud: CloudType) -> bool {
        self.0 & cloud.code() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = CloudType> {
        CloudType::iter().filter(move |cloud| self.contains(*cloud))
    }
}

impl FromIterator<CloudFamily> for CloudSet {
    fn from_iter<I: IntoIterator<Item = CloudFamily>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY, |set, family| set.union(family.members()))
    }
}

impl fmt::Display for CloudSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|cloud| cloud.to_string()).collect();
        f.write_str(&names.join(", "))
    }
}

impl fmt::Debug for CloudSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
