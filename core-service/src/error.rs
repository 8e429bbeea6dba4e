use bridge_traits::BridgeError;
use core_sync::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

impl From<BridgeError> for CoreError {
    fn from(err: BridgeError) -> Self {
        CoreError::Sync(SyncError::RemoteOperationFailed(err))
    }
}

impl CoreError {
    /// The underlying path/sync error, if any
    pub fn as_sync(&self) -> Option<&SyncError> {
        match self {
            CoreError::Sync(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
