//! Error type for `olymp-workflow`.

use olymp_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request was refused; the caller can act on the carried reason.
  #[error(transparent)]
  Rejected(#[from] olymp_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Split a backend error into a domain rejection or an infrastructure
  /// fault.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.into_rejection() {
      Ok(rejection) => Error::Rejected(rejection),
      Err(fault) => Error::Store(Box::new(fault)),
    }
  }

  pub fn rejection(&self) -> Option<&olymp_core::Error> {
    match self {
      Error::Rejected(e) => Some(e),
      Error::Store(_) => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
