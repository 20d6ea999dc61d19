use serde::{Deserialize, Serialize};

use super::codes::{code_enum, entity_fields};
use super::{Entity, EntityKey};
use crate::criteria::UpdateColumns;

code_enum! {
    /// Storage tier; studies migrate from tier 1 towards tier 3
    FilesystemTier {
        Tier1 => "Tier1",
        Tier2 => "Tier2",
        Tier3 => "Tier3",
    }
}

/// A storage location studies can be written to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filesystem {
    pub key: EntityKey,
    pub filesystem_path: String,
    pub enabled: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub description: String,
    pub filesystem_tier: FilesystemTier,
    /// Percent used at which purging stops
    pub low_watermark: f64,
    /// Percent used at which purging starts
    pub high_watermark: f64,
}

entity_fields! {
    /// Columns of [`Filesystem`]
    FilesystemField {
        Key => "key",
        FilesystemPath => "filesystem_path",
        Enabled => "enabled",
        ReadOnly => "read_only",
        WriteOnly => "write_only",
        Description => "description",
        FilesystemTier => "filesystem_tier",
        LowWatermark => "low_watermark",
        HighWatermark => "high_watermark",
    }
}

impl Entity for Filesystem {
    type Field = FilesystemField;
    const NAME: &'static str = "Filesystem";
    const TABLE: &'static str = "filesystem";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl Filesystem {
    pub fn columns(path: impl Into<String>, tier: FilesystemTier) -> UpdateColumns<Filesystem> {
        UpdateColumns::new()
            .set(FilesystemField::FilesystemPath, path.into())
            .set(FilesystemField::FilesystemTier, tier)
    }

    pub fn to_columns(&self) -> UpdateColumns<Filesystem> {
        use FilesystemField as F;
        UpdateColumns::new()
            .set(F::FilesystemPath, &self.filesystem_path)
            .set(F::Enabled, self.enabled)
            .set(F::ReadOnly, self.read_only)
            .set(F::WriteOnly, self.write_only)
            .set(F::Description, &self.description)
            .set(F::FilesystemTier, self.filesystem_tier)
            .set(F::LowWatermark, self.low_watermark)
            .set(F::HighWatermark, self.high_watermark)
    }

    /// Whether new studies may be written here
    pub fn is_writable(&self) -> bool {
        self.enabled && !self.read_only
    }
}
