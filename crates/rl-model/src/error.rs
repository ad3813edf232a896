use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] rl_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
