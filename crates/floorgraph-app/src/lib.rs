pub mod error;
pub mod extraction;
pub mod persist;
pub mod session;
pub mod settings;
pub mod tabular;

pub use error::{ExportError, ExtractionError, ImportError, SessionError};
pub use extraction::{
    DropReason, DroppedConnection, ExtractedConnection, ExtractedNode, ExtractionRequest,
    ExtractionResult, FloorPlanExtractor, MergeReport, PreparedImage,
};
pub use persist::{DocumentMetadata, PersistedDocument};
pub use session::EditorSession;
pub use settings::EditorSettings;
