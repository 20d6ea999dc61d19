use serde::{Deserialize, Serialize};

use super::codes::{code_enum, entity_fields};
use super::{Entity, EntityKey};
use crate::criteria::UpdateColumns;

code_enum! {
    /// What to do when a SOP instance arrives that is already stored
    DuplicateSopPolicy {
        SendSuccess => "SendSuccess",
        RejectDuplicates => "RejectDuplicates",
        AcceptLatest => "AcceptLatest",
        CompareDuplicates => "CompareDuplicates",
    }
}

/// A virtual DICOM server (AE title + port + storage folder) hosted by the
/// image server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerPartition {
    pub key: EntityKey,
    pub ae_title: String,
    pub description: String,
    pub enabled: bool,
    pub partition_folder: String,
    pub port: u16,
    pub default_remote_port: u16,
    pub auto_insert_device: bool,
    pub accept_any_device: bool,
    pub duplicate_sop_policy: DuplicateSopPolicy,
    pub match_patients_name: bool,
    pub match_patient_id: bool,
    pub match_patients_birth_date: bool,
    pub match_accession_number: bool,
    pub match_issuer_of_patient_id: bool,
    pub match_patients_sex: bool,
    pub audit_delete_study: bool,
    pub accept_latest_report: bool,
}

entity_fields! {
    /// Columns of [`ServerPartition`]
    ServerPartitionField {
        Key => "key",
        AeTitle => "ae_title",
        Description => "description",
        Enabled => "enabled",
        PartitionFolder => "partition_folder",
        Port => "port",
        DefaultRemotePort => "default_remote_port",
        AutoInsertDevice => "auto_insert_device",
        AcceptAnyDevice => "accept_any_device",
        DuplicateSopPolicy => "duplicate_sop_policy",
        MatchPatientsName => "match_patients_name",
        MatchPatientId => "match_patient_id",
        MatchPatientsBirthDate => "match_patients_birth_date",
        MatchAccessionNumber => "match_accession_number",
        MatchIssuerOfPatientId => "match_issuer_of_patient_id",
        MatchPatientsSex => "match_patients_sex",
        AuditDeleteStudy => "audit_delete_study",
        AcceptLatestReport => "accept_latest_report",
    }
}

impl Entity for ServerPartition {
    type Field = ServerPartitionField;
    const NAME: &'static str = "ServerPartition";
    const TABLE: &'static str = "server_partition";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl ServerPartition {
    /// Columns for a new partition; everything else takes the table defaults
    pub fn columns(
        ae_title: impl Into<String>,
        partition_folder: impl Into<String>,
        port: u16,
    ) -> UpdateColumns<ServerPartition> {
        UpdateColumns::new()
            .set(ServerPartitionField::AeTitle, ae_title.into())
            .set(ServerPartitionField::PartitionFolder, partition_folder.into())
            .set(ServerPartitionField::Port, port)
    }

    /// Every non-key property as update columns
    pub fn to_columns(&self) -> UpdateColumns<ServerPartition> {
        use ServerPartitionField as F;
        UpdateColumns::new()
            .set(F::AeTitle, &self.ae_title)
            .set(F::Description, &self.description)
            .set(F::Enabled, self.enabled)
            .set(F::PartitionFolder, &self.partition_folder)
            .set(F::Port, self.port)
            .set(F::DefaultRemotePort, self.default_remote_port)
            .set(F::AutoInsertDevice, self.auto_insert_device)
            .set(F::AcceptAnyDevice, self.accept_any_device)
            .set(F::DuplicateSopPolicy, self.duplicate_sop_policy)
            .set(F::MatchPatientsName, self.match_patients_name)
            .set(F::MatchPatientId, self.match_patient_id)
            .set(F::MatchPatientsBirthDate, self.match_patients_birth_date)
            .set(F::MatchAccessionNumber, self.match_accession_number)
            .set(F::MatchIssuerOfPatientId, self.match_issuer_of_patient_id)
            .set(F::MatchPatientsSex, self.match_patients_sex)
            .set(F::AuditDeleteStudy, self.audit_delete_study)
            .set(F::AcceptLatestReport, self.accept_latest_report)
    }
}
