use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Raised by a [`crate::Visitor`]'s default fallthrough when the
    /// implementor did not override the variant being visited.
    #[error("key expression variant {0} is not supported here")]
    UnsupportedExpression(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
