//! Server partition configuration
//!
//! A partition is linked to the authority groups allowed to see it through
//! `ServerPartitionDataAccess` rows. Adding or updating a partition rewrites
//! those links in the same context as the partition itself, creating any
//! `DataAccessGroup` that does not exist yet.

use std::collections::BTreeSet;

use imgsrv_core::errors::{ExError, ExErrorKind, Result};
use imgsrv_core::model::{
    DataAccessGroup, DataAccessGroupField, Device, DeviceField, EntityKey, ServerPartition,
    ServerPartitionDataAccess, ServerPartitionDataAccessField, ServerPartitionField, Study,
    StudyField, WorkQueue, WorkQueueField,
};
use imgsrv_core::{Entity, Principal, SelectCriteria, UpdateColumns};
use imgsrv_store::adaptor::{
    DataAccessGroupAdaptor, DeviceAdaptor, ServerPartitionAdaptor,
    ServerPartitionDataAccessAdaptor,
};
use imgsrv_store::{EntityAdaptor, PersistentStore, UpdateContext};
use serde::{Deserialize, Serialize};

use super::logged;

/// Settings for a new partition; the rest takes the table defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSettings {
    pub ae_title: String,
    pub partition_folder: String,
    pub port: u16,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl PartitionSettings {
    pub fn new(ae_title: impl Into<String>, partition_folder: impl Into<String>, port: u16) -> Self {
        Self {
            ae_title: ae_title.into(),
            partition_folder: partition_folder.into(),
            port,
            description: String::new(),
            enabled: true,
        }
    }

    fn to_columns(&self) -> UpdateColumns<ServerPartition> {
        ServerPartition::columns(self.ae_title.as_str(), self.partition_folder.as_str(), self.port)
            .set(ServerPartitionField::Description, self.description.as_str())
            .set(ServerPartitionField::Enabled, self.enabled)
    }
}

#[derive(Debug, Clone)]
pub struct ServerPartitionController {
    store: PersistentStore,
    partitions: ServerPartitionAdaptor,
    devices: DeviceAdaptor,
    groups: DataAccessGroupAdaptor,
    links: ServerPartitionDataAccessAdaptor,
}

impl ServerPartitionController {
    pub fn new(store: PersistentStore) -> Self {
        Self {
            partitions: EntityAdaptor::new(store.clone()),
            devices: EntityAdaptor::new(store.clone()),
            groups: EntityAdaptor::new(store.clone()),
            links: EntityAdaptor::new(store.clone()),
            store,
        }
    }

    /// All partitions ordered by AE title
    pub fn partitions(&self) -> Result<Vec<ServerPartition>> {
        self.partitions.find_sorted()
    }

    /// Partitions the principal may see, ordered by AE title
    ///
    /// A partition is visible through a `ServerPartitionDataAccess` link to a
    /// non-deleted group whose OID the principal holds. The all-partitions
    /// token lifts the restriction.
    pub fn partitions_for(&self, principal: &Principal) -> Result<Vec<ServerPartition>> {
        if principal.can_access_all_partitions() {
            return self.partitions();
        }
        let ctx = self.store.open_read_context()?;
        let groups = self.groups.find_in(
            &ctx,
            &SelectCriteria::new()
                .is_in(DataAccessGroupField::AuthorityGroupOid, principal.authority_groups())
                .equal_to(DataAccessGroupField::Deleted, false),
        )?;
        let links = self.links.find_in(
            &ctx,
            &SelectCriteria::new().is_in(
                ServerPartitionDataAccessField::DataAccessGroupKey,
                groups.iter().map(|group| &group.key),
            ),
        )?;
        let visible = self.partitions.find_in(
            &ctx,
            &SelectCriteria::new()
                .is_in(
                    ServerPartitionField::Key,
                    links.iter().map(|link| &link.server_partition_key),
                )
                .sort_asc(ServerPartitionField::AeTitle),
        )?;
        tracing::debug!(
            user = principal.user_name(),
            visible = visible.len(),
            "resolved partition visibility"
        );
        Ok(visible)
    }

    pub fn find_by_ae_title(&self, ae_title: &str) -> Result<Option<ServerPartition>> {
        self.partitions.find_by_ae_title(ae_title)
    }

    pub fn devices(&self, partition: &ServerPartition) -> Result<Vec<Device>> {
        self.devices.find_by_partition(&partition.key)
    }

    /// Groups allowed to see the partition, ordered by OID
    pub fn data_access_groups(&self, partition: &ServerPartition) -> Result<Vec<DataAccessGroup>> {
        let ctx = self.store.open_read_context()?;
        let links = self.links.find_by_partition_in(&ctx, &partition.key)?;
        self.groups.find_in(
            &ctx,
            &SelectCriteria::new()
                .is_in(
                    DataAccessGroupField::Key,
                    links.iter().map(|link| &link.data_access_group_key),
                )
                .sort_asc(DataAccessGroupField::AuthorityGroupOid),
        )
    }

    /// Create a partition linked to the given authority groups
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when another partition uses the AE title.
    pub fn add_partition(
        &self,
        settings: &PartitionSettings,
        group_oids: &[String],
    ) -> Result<ServerPartition> {
        logged("add_partition", || {
            let ctx = self.store.open_update_context()?;
            if self
                .partitions
                .find_by_ae_title_in(&ctx, &settings.ae_title)?
                .is_some()
            {
                return Err(ExError::new(ExErrorKind::AlreadyExists)
                    .with_op("add_partition")
                    .with_entity(ServerPartition::NAME)
                    .with_message(format!("AE title {} is already in use", settings.ae_title)));
            }
            let partition = self.partitions.add_in(&ctx, &settings.to_columns())?;
            self.link_groups(&ctx, &partition.key, group_oids)?;
            ctx.commit()?;
            Ok(partition)
        })
    }

    /// Save the partition and replace its group links
    ///
    /// Returns `false` when the partition no longer exists.
    pub fn update_partition(&self, partition: &ServerPartition, group_oids: &[String]) -> Result<bool> {
        logged("update_partition", || {
            let ctx = self.store.open_update_context()?;
            if !self.partitions.save_in(&ctx, partition)? {
                return Ok(false);
            }
            self.links.delete_for_partition_in(&ctx, &partition.key)?;
            self.link_groups(&ctx, &partition.key, group_oids)?;
            ctx.commit()?;
            Ok(true)
        })
    }

    /// Delete an empty partition with its devices and group links
    ///
    /// Refused (`false`) while the partition still holds studies or work
    /// queue entries.
    pub fn delete_partition(&self, partition: &ServerPartition) -> Result<bool> {
        logged("delete_partition", || {
            let ctx = self.store.open_update_context()?;
            let studies = EntityAdaptor::<Study>::new(self.store.clone()).count_in(
                &ctx,
                &SelectCriteria::new().equal_to(StudyField::ServerPartitionKey, &partition.key),
            )?;
            let queued = EntityAdaptor::<WorkQueue>::new(self.store.clone()).count_in(
                &ctx,
                &SelectCriteria::new().equal_to(WorkQueueField::ServerPartitionKey, &partition.key),
            )?;
            if studies > 0 || queued > 0 {
                tracing::debug!(
                    partition = partition.ae_title.as_str(),
                    studies,
                    queued,
                    "partition still in use"
                );
                return Ok(false);
            }

            self.links.delete_for_partition_in(&ctx, &partition.key)?;
            self.devices.delete_where_in(
                &ctx,
                &SelectCriteria::new().equal_to(DeviceField::ServerPartitionKey, &partition.key),
            )?;
            if !self.partitions.delete_in(&ctx, &partition.key)? {
                return Ok(false);
            }
            ctx.commit()?;
            Ok(true)
        })
    }

    fn link_groups(
        &self,
        ctx: &UpdateContext<'_>,
        partition: &EntityKey,
        group_oids: &[String],
    ) -> Result<()> {
        let unique: BTreeSet<&str> = group_oids.iter().map(String::as_str).collect();
        for oid in unique {
            let group = match self.groups.find_by_oid_in(ctx, oid)? {
                Some(group) => group,
                None => self.groups.add_in(ctx, &DataAccessGroup::columns(oid))?,
            };
            self.links
                .add_in(ctx, &ServerPartitionDataAccess::columns(partition, &group.key))?;
        }
        Ok(())
    }
}
