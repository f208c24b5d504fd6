use std::fmt;
use thiserror::Error;

/// What the bootstrap store did when a registry lookup missed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapOutcome {
    NoBootstrapper,
    RanWithoutKey,
}

impl fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBootstrapper => {
                f.write_str("no bootstrapper registered; install one before hydrating")
            }
            Self::RanWithoutKey => {
                f.write_str("bootstrap ran but did not register this type")
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("type '{key}' is not registered: {bootstrap}")]
    NotRegistered {
        key: String,
        bootstrap: BootstrapOutcome,
    },
}

impl RegistryError {
    pub fn not_registered(key: impl Into<String>, bootstrap: BootstrapOutcome) -> Self {
        Self::NotRegistered {
            key: key.into(),
            bootstrap,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::NotRegistered { key, .. } => key,
        }
    }

    pub fn bootstrap_ran(&self) -> bool {
        matches!(
            self,
            Self::NotRegistered {
                bootstrap: BootstrapOutcome::RanWithoutKey,
                ..
            }
        )
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    #[error("entity {field} read before rehydrate")]
    NotHydrated { field: &'static str },
    #[error("entity {type_name}/{id} is already hydrated")]
    AlreadyHydrated { type_name: String, id: String },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum HydrationError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error("malformed resource: {0}")]
    Malformed(String),
    #[error("type mismatch: expected {expected}, factory produced {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
}

impl HydrationError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

#[derive(Debug, Error)]
pub enum LatticeError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Hydration(HydrationError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<HydrationError> for LatticeError {
    fn from(error: HydrationError) -> Self {
        match error {
            HydrationError::Registry(inner) => Self::Registry(inner),
            other => Self::Hydration(other),
        }
    }
}

impl From<serde_json::Error> for LatticeError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
