//! Running an upload request: storing its files and writing its record.
//!
//! [`UploadOrchestrator`] drives a request through the phases in [`Phase`].
//! The steps it is built from are usable on their own: [`upload`] stores one
//! file and [`persist`] writes one record.
mod asset;
pub use self::asset::{AssetRef, upload};

mod orchestrator;
pub use self::orchestrator::{
    Completed, DEFAULT_COLLECTION, OrchestratorBuilder, Timeouts, UploadOrchestrator,
};

mod record;
pub use self::record::{Role, ScoreRecord, persist};

mod state;
pub use self::state::Phase;
