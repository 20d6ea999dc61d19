use std::fmt;
use std::marker::PhantomData;

use super::predicate::{CompareOp, Predicate, SortDirection, SortKey, Subquery};
use crate::model::{Entity, EntityKey, Field, Value};

/// Query specification for entity `E`
///
/// All predicates must hold (conjunction). An empty criteria matches every
/// row. Sort keys apply in the order they were added.
///
/// ```
/// use imgsrv_core::criteria::SelectCriteria;
/// use imgsrv_core::model::{WorkQueue, WorkQueueField, WorkQueueStatus};
///
/// let criteria = SelectCriteria::<WorkQueue>::new()
///     .equal_to(WorkQueueField::WorkQueueStatus, WorkQueueStatus::Pending)
///     .sort_asc(WorkQueueField::ScheduledTime);
/// assert_eq!(criteria.predicates().len(), 1);
/// ```
pub struct SelectCriteria<E: Entity> {
    predicates: Vec<Predicate>,
    sorts: Vec<SortKey>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SelectCriteria<E> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            sorts: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Criteria selecting the single row with `key`
    pub fn by_key(key: &EntityKey) -> Self {
        Self::new().equal_to(E::Field::KEY, key)
    }

    fn compare(mut self, field: E::Field, op: CompareOp, value: Value) -> Self {
        self.predicates.push(Predicate::Compare {
            column: field.column(),
            op,
            value,
        });
        self
    }

    /// `field = value`; comparing with `Value::Null` means `IS NULL`
    pub fn equal_to(self, field: E::Field, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::Equal, value.into())
    }

    pub fn not_equal_to(self, field: E::Field, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::NotEqual, value.into())
    }

    pub fn less_than(self, field: E::Field, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::LessThan, value.into())
    }

    pub fn less_or_equal(self, field: E::Field, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::LessOrEqual, value.into())
    }

    pub fn greater_than(self, field: E::Field, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::GreaterThan, value.into())
    }

    pub fn greater_or_equal(self, field: E::Field, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::GreaterOrEqual, value.into())
    }

    /// SQL `LIKE` pattern match
    pub fn like(self, field: E::Field, pattern: impl Into<String>) -> Self {
        self.compare(field, CompareOp::Like, Value::Text(pattern.into()))
    }

    pub fn is_in<V, I>(mut self, field: E::Field, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        self.predicates.push(Predicate::In {
            column: field.column(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_null(mut self, field: E::Field) -> Self {
        self.predicates.push(Predicate::IsNull {
            column: field.column(),
            negated: false,
        });
        self
    }

    pub fn is_not_null(mut self, field: E::Field) -> Self {
        self.predicates.push(Predicate::IsNull {
            column: field.column(),
            negated: true,
        });
        self
    }

    /// Require a related `R` row where `R.related = E.outer` that matches
    /// `related_criteria`
    ///
    /// Sort keys on `related_criteria` are ignored.
    pub fn exists<R: Entity>(
        mut self,
        outer: E::Field,
        related: R::Field,
        related_criteria: SelectCriteria<R>,
    ) -> Self {
        self.predicates.push(Predicate::Exists(Subquery {
            entity: R::NAME,
            table: R::TABLE,
            outer_column: outer.column(),
            inner_column: related.column(),
            predicates: related_criteria.predicates,
        }));
        self
    }

    pub fn sort_asc(mut self, field: E::Field) -> Self {
        self.sorts.push(SortKey {
            column: field.column(),
            direction: SortDirection::Ascending,
        });
        self
    }

    pub fn sort_desc(mut self, field: E::Field) -> Self {
        self.sorts.push(SortKey {
            column: field.column(),
            direction: SortDirection::Descending,
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn sorts(&self) -> &[SortKey] {
        &self.sorts
    }

    /// True when the criteria has no predicates (matches every row)
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl<E: Entity> Default for SelectCriteria<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for SelectCriteria<E> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            sorts: self.sorts.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for SelectCriteria<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectCriteria")
            .field("entity", &E::NAME)
            .field("predicates", &self.predicates)
            .field("sorts", &self.sorts)
            .finish()
    }
}
