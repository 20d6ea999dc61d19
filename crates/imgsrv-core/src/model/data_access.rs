//! Data-access groups: which authority groups may see which studies and
//! partitions

use serde::{Deserialize, Serialize};

use super::codes::entity_fields;
use super::{Entity, EntityKey};
use crate::criteria::UpdateColumns;

/// Binds an authority group (by OID) to the data-access tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAccessGroup {
    pub key: EntityKey,
    pub authority_group_oid: String,
    pub deleted: bool,
}

entity_fields! {
    DataAccessGroupField {
        Key => "key",
        AuthorityGroupOid => "authority_group_oid",
        Deleted => "deleted",
    }
}

impl Entity for DataAccessGroup {
    type Field = DataAccessGroupField;
    const NAME: &'static str = "DataAccessGroup";
    const TABLE: &'static str = "data_access_group";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl DataAccessGroup {
    pub fn columns(authority_group_oid: impl Into<String>) -> UpdateColumns<DataAccessGroup> {
        UpdateColumns::new()
            .set(
                DataAccessGroupField::AuthorityGroupOid,
                authority_group_oid.into(),
            )
            .set(DataAccessGroupField::Deleted, false)
    }
}

/// Grants a data-access group visibility of one study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyDataAccess {
    pub key: EntityKey,
    pub study_storage_key: EntityKey,
    pub data_access_group_key: EntityKey,
}

entity_fields! {
    StudyDataAccessField {
        Key => "key",
        StudyStorageKey => "study_storage_key",
        DataAccessGroupKey => "data_access_group_key",
    }
}

impl Entity for StudyDataAccess {
    type Field = StudyDataAccessField;
    const NAME: &'static str = "StudyDataAccess";
    const TABLE: &'static str = "study_data_access";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl StudyDataAccess {
    pub fn columns(
        study_storage: &EntityKey,
        group: &EntityKey,
    ) -> UpdateColumns<StudyDataAccess> {
        UpdateColumns::new()
            .set(StudyDataAccessField::StudyStorageKey, study_storage)
            .set(StudyDataAccessField::DataAccessGroupKey, group)
    }
}

/// Grants a data-access group visibility of a whole partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerPartitionDataAccess {
    pub key: EntityKey,
    pub server_partition_key: EntityKey,
    pub data_access_group_key: EntityKey,
}

entity_fields! {
    ServerPartitionDataAccessField {
        Key => "key",
        ServerPartitionKey => "server_partition_key",
        DataAccessGroupKey => "data_access_group_key",
    }
}

impl Entity for ServerPartitionDataAccess {
    type Field = ServerPartitionDataAccessField;
    const NAME: &'static str = "ServerPartitionDataAccess";
    const TABLE: &'static str = "server_partition_data_access";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl ServerPartitionDataAccess {
    pub fn columns(
        partition: &EntityKey,
        group: &EntityKey,
    ) -> UpdateColumns<ServerPartitionDataAccess> {
        UpdateColumns::new()
            .set(ServerPartitionDataAccessField::ServerPartitionKey, partition)
            .set(ServerPartitionDataAccessField::DataAccessGroupKey, group)
    }
}
