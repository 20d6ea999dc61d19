use crate::model::Value;

/// Binary comparison between a column and a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    /// SQL `LIKE` with `%` and `_` wildcards
    Like,
}

/// One node of the predicate tree
///
/// Columns are the static names from an entity's field enum, never user
/// input.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: &'static str,
        op: CompareOp,
        value: Value,
    },
    /// Matches when the column equals any of `values`; an empty list matches
    /// nothing
    In {
        column: &'static str,
        values: Vec<Value>,
    },
    IsNull {
        column: &'static str,
        negated: bool,
    },
    /// Matches when at least one related row satisfies the subquery
    Exists(Subquery),
}

/// Correlated subquery over a related table
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    /// Related entity name, for diagnostics
    pub entity: &'static str,
    pub table: &'static str,
    /// Column of the enclosing row
    pub outer_column: &'static str,
    /// Column of the related row that must equal `outer_column`
    pub inner_column: &'static str,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub direction: SortDirection,
}
