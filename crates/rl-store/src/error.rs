use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("uniqueness violation for index {index}: key already owned by primary key {conflicting_primary_key:?}")]
    UniquenessViolation { index: String, conflicting_primary_key: Vec<rl_type::TupleValue> },
    #[error("invalid index-state transition for {index}: {from:?} -> {to:?}")]
    InvalidTransition { index: String, from: crate::index_state::IndexState, to: crate::index_state::IndexState },
    #[error("index {0} has no single-field root expression, cannot be used for a range scan")]
    NotSingleFieldIndex(String),
    #[error("no maintainer registered for index kind {kind:?} (index {index})")]
    MaintainerMissing { index: String, kind: rl_schema::IndexKind },
    #[error("index maintainer error: {0}")]
    Maintainer(String),
    #[error(transparent)]
    Kv(#[from] rl_kv::Error),
    #[error(transparent)]
    Txn(#[from] rl_txn::Error),
    #[error(transparent)]
    Schema(#[from] rl_schema::Error),
    #[error(transparent)]
    Expr(#[from] rl_expr::Error),
    #[error(transparent)]
    Planner(#[from] rl_planner::Error),
    #[error("malformed physical key/value: {0}")]
    Tuple(#[from] rl_tuple::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
