//! Row decoding for every persisted entity
//!
//! Columns are read by name so the mapping does not depend on column order in
//! the schema.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use imgsrv_core::errors::{ExError, ExErrorKind};
use imgsrv_core::model::{
    DataAccessGroup, Device, EntityKey, Filesystem, ServerPartition, ServerPartitionDataAccess,
    ServiceLock, Study, StudyDataAccess, WorkQueue, WorkQueueUid,
};
use rusqlite::types::Type;
use rusqlite::Row;

use super::Table;

/// Typed accessors for the encodings the schema uses
trait RowExt {
    fn get_key(&self, column: &str) -> rusqlite::Result<EntityKey>;
    fn get_opt_key(&self, column: &str) -> rusqlite::Result<Option<EntityKey>>;
    fn get_code<T: FromStr<Err = ExError>>(&self, column: &str) -> rusqlite::Result<T>;
    fn get_time(&self, column: &str) -> rusqlite::Result<DateTime<Utc>>;
    fn get_opt_time(&self, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>>;
}

fn conversion_error(row: &Row<'_>, column: &str, ty: Type, err: ExError) -> rusqlite::Error {
    let index = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(index, ty, Box::new(err))
}

fn millis_to_time(row: &Row<'_>, column: &str, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
        conversion_error(
            row,
            column,
            Type::Integer,
            ExError::new(ExErrorKind::Persistence)
                .with_message(format!("{} holds an out of range timestamp {}", column, millis)),
        )
    })
}

impl RowExt for Row<'_> {
    fn get_key(&self, column: &str) -> rusqlite::Result<EntityKey> {
        let raw: String = self.get(column)?;
        EntityKey::parse(raw).map_err(|e| conversion_error(self, column, Type::Text, e))
    }

    fn get_opt_key(&self, column: &str) -> rusqlite::Result<Option<EntityKey>> {
        match self.get::<_, Option<String>>(column)? {
            Some(raw) => EntityKey::parse(raw)
                .map(Some)
                .map_err(|e| conversion_error(self, column, Type::Text, e)),
            None => Ok(None),
        }
    }

    fn get_code<T: FromStr<Err = ExError>>(&self, column: &str) -> rusqlite::Result<T> {
        let raw: String = self.get(column)?;
        raw.parse()
            .map_err(|e| conversion_error(self, column, Type::Text, e))
    }

    fn get_time(&self, column: &str) -> rusqlite::Result<DateTime<Utc>> {
        let millis: i64 = self.get(column)?;
        millis_to_time(self, column, millis)
    }

    fn get_opt_time(&self, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
        match self.get::<_, Option<i64>>(column)? {
            Some(millis) => millis_to_time(self, column, millis).map(Some),
            None => Ok(None),
        }
    }
}

impl Table for ServerPartition {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            ae_title: row.get("ae_title")?,
            description: row.get("description")?,
            enabled: row.get("enabled")?,
            partition_folder: row.get("partition_folder")?,
            port: row.get("port")?,
            default_remote_port: row.get("default_remote_port")?,
            auto_insert_device: row.get("auto_insert_device")?,
            accept_any_device: row.get("accept_any_device")?,
            duplicate_sop_policy: row.get_code("duplicate_sop_policy")?,
            match_patients_name: row.get("match_patients_name")?,
            match_patient_id: row.get("match_patient_id")?,
            match_patients_birth_date: row.get("match_patients_birth_date")?,
            match_accession_number: row.get("match_accession_number")?,
            match_issuer_of_patient_id: row.get("match_issuer_of_patient_id")?,
            match_patients_sex: row.get("match_patients_sex")?,
            audit_delete_study: row.get("audit_delete_study")?,
            accept_latest_report: row.get("accept_latest_report")?,
        })
    }
}

impl Table for Device {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            server_partition_key: row.get_key("server_partition_key")?,
            ae_title: row.get("ae_title")?,
            description: row.get("description")?,
            ip_address: row.get("ip_address")?,
            port: row.get("port")?,
            enabled: row.get("enabled")?,
            dhcp: row.get("dhcp")?,
            allow_storage: row.get("allow_storage")?,
            allow_retrieve: row.get("allow_retrieve")?,
            allow_query: row.get("allow_query")?,
            allow_auto_route: row.get("allow_auto_route")?,
            throttle_max_connections: row.get("throttle_max_connections")?,
            device_type: row.get_code("device_type")?,
            last_accessed_time: row.get_opt_time("last_accessed_time")?,
        })
    }
}

impl Table for Filesystem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            filesystem_path: row.get("filesystem_path")?,
            enabled: row.get("enabled")?,
            read_only: row.get("read_only")?,
            write_only: row.get("write_only")?,
            description: row.get("description")?,
            filesystem_tier: row.get_code("filesystem_tier")?,
            low_watermark: row.get("low_watermark")?,
            high_watermark: row.get("high_watermark")?,
        })
    }
}

impl Table for ServiceLock {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            service_lock_type: row.get_code("service_lock_type")?,
            locked: row.get("locked")?,
            scheduled_time: row.get_time("scheduled_time")?,
            enabled: row.get("enabled")?,
            filesystem_key: row.get_opt_key("filesystem_key")?,
            processor_id: row.get("processor_id")?,
        })
    }
}

impl Table for Study {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            server_partition_key: row.get_key("server_partition_key")?,
            study_storage_key: row.get_key("study_storage_key")?,
            study_instance_uid: row.get("study_instance_uid")?,
            patients_name: row.get("patients_name")?,
            patient_id: row.get("patient_id")?,
            accession_number: row.get("accession_number")?,
            study_date: row.get("study_date")?,
            study_description: row.get("study_description")?,
            number_of_study_related_series: row.get("number_of_study_related_series")?,
            number_of_study_related_instances: row.get("number_of_study_related_instances")?,
        })
    }
}

impl Table for WorkQueue {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            server_partition_key: row.get_key("server_partition_key")?,
            study_storage_key: row.get_key("study_storage_key")?,
            work_queue_type: row.get_code("work_queue_type")?,
            work_queue_status: row.get_code("work_queue_status")?,
            work_queue_priority: row.get_code("work_queue_priority")?,
            processor_id: row.get("processor_id")?,
            scheduled_time: row.get_time("scheduled_time")?,
            expiration_time: row.get_opt_time("expiration_time")?,
            inserted_time: row.get_time("inserted_time")?,
            last_updated_time: row.get_opt_time("last_updated_time")?,
            failure_count: row.get("failure_count")?,
            failure_description: row.get("failure_description")?,
            device_key: row.get_opt_key("device_key")?,
        })
    }
}

impl Table for WorkQueueUid {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            work_queue_key: row.get_key("work_queue_key")?,
            series_instance_uid: row.get("series_instance_uid")?,
            sop_instance_uid: row.get("sop_instance_uid")?,
            failed: row.get("failed")?,
            failure_count: row.get("failure_count")?,
        })
    }
}

impl Table for DataAccessGroup {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            authority_group_oid: row.get("authority_group_oid")?,
            deleted: row.get("deleted")?,
        })
    }
}

impl Table for StudyDataAccess {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            study_storage_key: row.get_key("study_storage_key")?,
            data_access_group_key: row.get_key("data_access_group_key")?,
        })
    }
}

impl Table for ServerPartitionDataAccess {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get_key("key")?,
            server_partition_key: row.get_key("server_partition_key")?,
            data_access_group_key: row.get_key("data_access_group_key")?,
        })
    }
}
