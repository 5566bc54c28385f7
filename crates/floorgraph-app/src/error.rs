use floorgraph_core::FloorId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Document root is not an object")]
    NotAnObject,
    #[error("Document is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("Document has more than one floor at level {0}")]
    DuplicateFloorLevel(i32),
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction failed: {0}")]
    Collaborator(String),
    #[error("Extraction returned no result")]
    Empty,
    #[error("No floor at level {0}")]
    UnknownFloor(i32),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A floor at level {0} already exists")]
    DuplicateFloorLevel(i32),
    #[error("A floor with id {0} already exists")]
    DuplicateFloorId(FloorId),
    #[error("Unknown floor: {0}")]
    UnknownFloor(FloorId),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
