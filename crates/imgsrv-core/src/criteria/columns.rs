use std::fmt;
use std::marker::PhantomData;

use crate::errors::{DomainError, Result};
use crate::model::{Entity, Field, Value};

/// Sparse set of column assignments for entity `E`
///
/// Only assigned columns are written. On update the rest are left alone, on
/// insert they take the table defaults. Assigning the same column twice keeps
/// the last value.
pub struct UpdateColumns<E: Entity> {
    assignments: Vec<(E::Field, Value)>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> UpdateColumns<E> {
    pub fn new() -> Self {
        Self {
            assignments: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Assign `value` to `field`
    pub fn set(mut self, field: E::Field, value: impl Into<Value>) -> Self {
        self.assign(field, value);
        self
    }

    /// In-place form of [`set`](Self::set)
    pub fn assign(&mut self, field: E::Field, value: impl Into<Value>) {
        let value = value.into();
        match self.assignments.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((field, value)),
        }
    }

    pub fn get(&self, field: E::Field) -> Option<&Value> {
        self.assignments
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Assignments as (column, value), in assignment order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.assignments.iter().map(|(f, v)| (f.column(), v))
    }

    /// Reject assignments the store must never apply
    ///
    /// # Errors
    ///
    /// Returns `InvalidColumn` if the key column is assigned.
    pub fn validate(&self) -> Result<()> {
        if self.get(E::Field::KEY).is_some() {
            return Err(DomainError::KeyAssignment { entity: E::NAME }.into());
        }
        Ok(())
    }
}

impl<E: Entity> Default for UpdateColumns<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for UpdateColumns<E> {
    fn clone(&self) -> Self {
        Self {
            assignments: self.assignments.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for UpdateColumns<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use crate::model::{Device, DeviceField, EntityKey};

    #[test]
    fn test_last_assignment_wins() {
        let columns = UpdateColumns::<Device>::new()
            .set(DeviceField::Port, 104u16)
            .set(DeviceField::Port, 11112u16);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns.get(DeviceField::Port), Some(&Value::Integer(11112)));
    }

    #[test]
    fn test_none_becomes_null() {
        let columns =
            UpdateColumns::<Device>::new().set(DeviceField::LastAccessedTime, None::<chrono::DateTime<chrono::Utc>>);
        assert_eq!(columns.get(DeviceField::LastAccessedTime), Some(&Value::Null));
    }

    #[test]
    fn test_key_assignment_is_rejected() {
        let columns =
            UpdateColumns::<Device>::new().set(DeviceField::Key, EntityKey::generate());
        let err = columns.validate().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidColumn);
    }

    #[test]
    fn test_iter_yields_column_names() {
        let columns = UpdateColumns::<Device>::new()
            .set(DeviceField::AeTitle, "CT1")
            .set(DeviceField::Enabled, true);
        let names: Vec<_> = columns.iter().map(|(c, _)| c).collect();
        assert_eq!(names, vec!["ae_title", "enabled"]);
    }
}
