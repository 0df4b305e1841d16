//! Error type shared by the loader, the emitters and the driver.

use std::path::PathBuf;
use thiserror::Error;

use crate::codegen::orchestration::PhaseReport;

pub type Result<T> = std::result::Result<T, CodegenError>;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Entity '{entity}' has no fields, so no key can be inferred")]
    EmptyEntity { entity: String },

    #[error("Entities {entities:?} all generate the type name '{type_name}'")]
    NameCollision {
        type_name: String,
        entities: Vec<String>,
    },

    #[error("Entity '{entity}' has no usable type name")]
    EmptyTypeName { entity: String },

    /// The controller phase failed; the completed model phase is kept
    #[error("Controller generation failed: {cause}")]
    ControllerPhase {
        #[source]
        cause: Box<CodegenError>,
        models: Box<PhaseReport>,
    },

    #[error("Generation task failed: {0}")]
    Task(String),
}

impl CodegenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CodegenError::Io {
            path: path.into(),
            source,
        }
    }

    /// The error that started a failure, looking through phase wrappers
    pub fn root_cause(&self) -> &CodegenError {
        match self {
            CodegenError::ControllerPhase { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
