//! Search orchestration and incremental rendering for the NeuroDoc client.
//!
//! [`SearchSession`] is the entry point: it validates and issues searches,
//! discards responses from superseded requests, reveals textual responses one
//! character at a time and keeps a deduplicated search history.

pub mod app_event;
pub mod app_event_sender;
pub mod backend;
pub mod config;
mod error;
pub mod history;
pub mod i18n;
pub mod notification;
pub mod orchestrator;
mod persist;
pub mod preferences;
pub mod reveal;
pub mod session;
pub mod upload;

pub use app_event::AppEvent;
pub use backend::HttpBackend;
pub use backend::SearchBackend;
pub use config::ClientConfig;
pub use config::find_data_dir;
pub use error::BackendError;
pub use error::ConfigError;
pub use error::StoreError;
pub use error::ValidationError;
pub use history::HistoryFile;
pub use history::SearchHistory;
pub use i18n::TextBundle;
pub use notification::Notice;
pub use orchestrator::SearchTicket;
pub use preferences::FilePreferenceStore;
pub use preferences::MemoryPreferenceStore;
pub use preferences::PreferenceStore;
pub use preferences::Preferences;
pub use session::SearchPhase;
pub use session::SearchSession;
pub use session::SessionInit;
pub use upload::UploadFile;
