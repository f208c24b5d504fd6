use lattice_core::LatticeError;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("response decode failed: {0}")]
    Decode(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl From<TransportError> for LatticeError {
    fn from(error: TransportError) -> Self {
        LatticeError::Transport(error.to_string())
    }
}
