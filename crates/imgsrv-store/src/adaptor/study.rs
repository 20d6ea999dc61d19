//! Studies filtered by the caller's data-access rights

use imgsrv_core::errors::Result;
use imgsrv_core::model::{
    DataAccessGroup, DataAccessGroupField, EntityKey, Study, StudyDataAccess,
    StudyDataAccessField, StudyField,
};
use imgsrv_core::{Principal, SelectCriteria};

use super::{EntityAdaptor, QueryHook};
use crate::context::PersistentStore;

/// Restricts study queries to the authority groups of a principal
///
/// A study is visible when a `StudyDataAccess` row links its storage to a
/// non-deleted `DataAccessGroup` whose OID is one of the principal's groups.
/// Principals holding the all-studies token see everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataAccessFilter {
    /// `None` when unrestricted
    authority_groups: Option<Vec<String>>,
}

impl DataAccessFilter {
    pub fn for_principal(principal: &Principal) -> Self {
        let authority_groups = if principal.can_access_all_studies() {
            None
        } else {
            Some(principal.authority_groups().map(str::to_string).collect())
        };
        Self { authority_groups }
    }

    pub fn unrestricted() -> Self {
        Self {
            authority_groups: None,
        }
    }
}

impl QueryHook<Study> for DataAccessFilter {
    fn on_querying(&self, criteria: SelectCriteria<Study>) -> SelectCriteria<Study> {
        let Some(groups) = &self.authority_groups else {
            return criteria;
        };

        let granted_groups = SelectCriteria::<DataAccessGroup>::new()
            .is_in(DataAccessGroupField::AuthorityGroupOid, groups.iter().cloned())
            .equal_to(DataAccessGroupField::Deleted, false);
        let grants = SelectCriteria::<StudyDataAccess>::new().exists(
            StudyDataAccessField::DataAccessGroupKey,
            DataAccessGroupField::Key,
            granted_groups,
        );
        criteria.exists(
            StudyField::StudyStorageKey,
            StudyDataAccessField::StudyStorageKey,
            grants,
        )
    }

    fn restricts(&self) -> bool {
        self.authority_groups.is_some()
    }
}

/// Study adaptor that applies the principal's data-access filter to every
/// query
pub type StudyAdaptor = EntityAdaptor<Study, DataAccessFilter>;

impl EntityAdaptor<Study, DataAccessFilter> {
    pub fn for_principal(store: PersistentStore, principal: &Principal) -> Self {
        Self::with_hook(store, DataAccessFilter::for_principal(principal))
    }

    /// Study stored under this study storage, if visible
    pub fn find_by_storage(&self, study_storage: &EntityKey) -> Result<Option<Study>> {
        self.find_one(&SelectCriteria::new().equal_to(StudyField::StudyStorageKey, study_storage))
    }

    pub fn find_by_instance_uid(
        &self,
        partition: &EntityKey,
        study_instance_uid: &str,
    ) -> Result<Option<Study>> {
        self.find_one(
            &SelectCriteria::new()
                .equal_to(StudyField::ServerPartitionKey, partition)
                .equal_to(StudyField::StudyInstanceUid, study_instance_uid),
        )
    }

    /// Write every field of `study` back under its key
    pub fn save(&self, study: &Study) -> Result<bool> {
        self.update(&study.key, &study.to_columns())
    }
}
