use serde::{Deserialize, Serialize};

use super::codes::entity_fields;
use super::{Entity, EntityKey};
use crate::criteria::UpdateColumns;

/// A DICOM study stored on a partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub key: EntityKey,
    pub server_partition_key: EntityKey,
    /// Storage record the study's files and access grants hang off
    pub study_storage_key: EntityKey,
    pub study_instance_uid: String,
    pub patients_name: String,
    pub patient_id: String,
    pub accession_number: String,
    /// DICOM DA value (YYYYMMDD), if the study carried one
    pub study_date: Option<String>,
    pub study_description: String,
    pub number_of_study_related_series: i32,
    pub number_of_study_related_instances: i32,
}

entity_fields! {
    /// Columns of [`Study`]
    StudyField {
        Key => "key",
        ServerPartitionKey => "server_partition_key",
        StudyStorageKey => "study_storage_key",
        StudyInstanceUid => "study_instance_uid",
        PatientsName => "patients_name",
        PatientId => "patient_id",
        AccessionNumber => "accession_number",
        StudyDate => "study_date",
        StudyDescription => "study_description",
        NumberOfStudyRelatedSeries => "number_of_study_related_series",
        NumberOfStudyRelatedInstances => "number_of_study_related_instances",
    }
}

impl Entity for Study {
    type Field = StudyField;
    const NAME: &'static str = "Study";
    const TABLE: &'static str = "study";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl Study {
    pub fn columns(
        partition: &EntityKey,
        study_storage: &EntityKey,
        study_instance_uid: impl Into<String>,
    ) -> UpdateColumns<Study> {
        UpdateColumns::new()
            .set(StudyField::ServerPartitionKey, partition)
            .set(StudyField::StudyStorageKey, study_storage)
            .set(StudyField::StudyInstanceUid, study_instance_uid.into())
    }

    pub fn to_columns(&self) -> UpdateColumns<Study> {
        use StudyField as F;
        UpdateColumns::new()
            .set(F::ServerPartitionKey, &self.server_partition_key)
            .set(F::StudyStorageKey, &self.study_storage_key)
            .set(F::StudyInstanceUid, &self.study_instance_uid)
            .set(F::PatientsName, &self.patients_name)
            .set(F::PatientId, &self.patient_id)
            .set(F::AccessionNumber, &self.accession_number)
            .set(F::StudyDate, self.study_date.as_deref())
            .set(F::StudyDescription, &self.study_description)
            .set(
                F::NumberOfStudyRelatedSeries,
                self.number_of_study_related_series,
            )
            .set(
                F::NumberOfStudyRelatedInstances,
                self.number_of_study_related_instances,
            )
    }
}
