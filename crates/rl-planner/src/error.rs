use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("no valid plan for this query")]
    NoValidPlan,
    #[error(transparent)]
    Schema(#[from] rl_schema::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
