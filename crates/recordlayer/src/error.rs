use thiserror::Error;

/// The error vocabulary exported at the crate boundary (spec.md §6). Every
/// sub-crate error collapses into one of these variants rather than being
/// re-exported verbatim, so a caller retrying at the transaction boundary
/// only ever has to match on this one enum (spec.md §7's taxonomy: dividing
/// errors into validation, not-found, invariant, transient, and fatal).
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was attempted through a [`rl_txn::TransactionContext`]
    /// that already committed or cancelled.
    #[error("transaction context already closed")]
    ContextAlreadyClosed,
    #[error("index not found: {0}")]
    IndexNotFound(String),
    /// The index exists but is not yet `Readable` (spec.md §4.F), so a
    /// query planner cannot use it as a candidate access path.
    #[error("index not ready for queries: {0}")]
    IndexNotReady(String),
    #[error("record type not found: {0}")]
    RecordTypeNotFound(String),
    /// A key expression or physical key could not be decoded back into a
    /// tuple (malformed bytes at keyspace boundaries), as distinct from
    /// [`Error::InvalidSerializedData`], which covers the record payload.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// The record payload bytes stored alongside a primary key could not be
    /// decoded, distinct from a schema-level [`Error::DeserializationFailed`].
    #[error("invalid serialized record data: {0}")]
    InvalidSerializedData(String),
    #[error("failed to serialize record: {0}")]
    SerializationFailed(String),
    #[error("failed to deserialize record: {0}")]
    DeserializationFailed(String),
    #[error("uniqueness violation for index {index}: key already owned by primary key {conflicting_primary_key:?}")]
    UniquenessViolation { index: String, conflicting_primary_key: Vec<rl_type::TupleValue> },
    #[error("no valid plan for this query")]
    NoValidPlan,
    /// Anything that does not fit the named categories above: transient KV
    /// errors that exhausted retries, index-state-machine misuse, missing
    /// maintainer registrations, or a migration-manager failure.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<rl_kv::Error> for Error {
    fn from(err: rl_kv::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<rl_txn::Error> for Error {
    fn from(err: rl_txn::Error) -> Self {
        match err {
            rl_txn::Error::AlreadyClosed => Error::ContextAlreadyClosed,
            rl_txn::Error::Kv(kv) => kv.into(),
        }
    }
}

impl From<rl_tuple::Error> for Error {
    fn from(err: rl_tuple::Error) -> Self {
        Error::InvalidKey(err.to_string())
    }
}

impl From<rl_expr::Error> for Error {
    fn from(err: rl_expr::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<rl_schema::Error> for Error {
    fn from(err: rl_schema::Error) -> Self {
        match err {
            rl_schema::Error::RecordTypeNotFound(name) => Error::RecordTypeNotFound(name),
            rl_schema::Error::IndexNotFound(name) => Error::IndexNotFound(name),
            rl_schema::Error::SerializationFailed(msg) => Error::SerializationFailed(msg),
            rl_schema::Error::DeserializationFailed(msg) => Error::DeserializationFailed(msg),
            rl_schema::Error::DuplicateName(name) => Error::Internal(format!("duplicate name in schema: {name}")),
        }
    }
}

impl From<rl_planner::Error> for Error {
    fn from(err: rl_planner::Error) -> Self {
        match err {
            rl_planner::Error::NoValidPlan => Error::NoValidPlan,
            rl_planner::Error::Schema(schema_err) => schema_err.into(),
        }
    }
}

impl From<rl_store::Error> for Error {
    fn from(err: rl_store::Error) -> Self {
        match err {
            rl_store::Error::UniquenessViolation { index, conflicting_primary_key } => {
                Error::UniquenessViolation { index, conflicting_primary_key }
            }
            rl_store::Error::Kv(kv) => kv.into(),
            rl_store::Error::Txn(txn) => txn.into(),
            rl_store::Error::Schema(schema) => schema.into(),
            rl_store::Error::Expr(expr) => expr.into(),
            rl_store::Error::Planner(planner) => planner.into(),
            rl_store::Error::Tuple(tuple) => Error::InvalidSerializedData(tuple.to_string()),
            other => Error::Internal(other.to_string()),
        }
    }
}

impl From<rl_model::Error> for Error {
    fn from(err: rl_model::Error) -> Self {
        match err {
            rl_model::Error::Store(store) => store.into(),
        }
    }
}

impl From<rl_evolution::Error> for Error {
    fn from(err: rl_evolution::Error) -> Self {
        match err {
            rl_evolution::Error::Store(store) => store.into(),
            rl_evolution::Error::Txn(txn) => txn.into(),
            rl_evolution::Error::Tuple(tuple) => Error::InvalidKey(tuple.to_string()),
            other => Error::Internal(other.to_string()),
        }
    }
}
