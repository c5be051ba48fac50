use std::path::PathBuf;
use thiserror::Error;

/// Reasons a night is left out of an import. None of them stop the run.
#[derive(Debug, Error)]
pub enum NightSkip {
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("no 'doc' directory")]
    MissingDocDir,
    #[error("no ObservationSequence HTML")]
    MissingObservationSequence,
    #[error("no Gaia targets in astronomer's log")]
    NoLogTargets,
    #[error("unrecognized date token in `{0}`")]
    UnrecognizedDate(String),
}

impl NightSkip {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DirectoryNotFound(_) => "S001_DIR_NOT_FOUND",
            Self::MissingDocDir => "S002_NO_DOC_DIR",
            Self::MissingObservationSequence => "S003_NO_OBS_SEQUENCE",
            Self::NoLogTargets => "S004_NO_LOG_TARGETS",
            Self::UnrecognizedDate(_) => "S005_BAD_DATE_TOKEN",
        }
    }
}
