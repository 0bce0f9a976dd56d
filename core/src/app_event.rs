use crate::error::BackendError;
use neurodoc_protocol::SearchPayload;

/// Completions reported back to the session by its spawned tasks. All state
/// changes happen when the session handles one of these, never inside the
/// tasks themselves.
#[derive(Debug)]
pub enum AppEvent {
    /// A search request finished. `generation` identifies the invocation so
    /// that a superseded request cannot overwrite newer state.
    SearchSettled {
        generation: u64,
        outcome: Result<SearchPayload, BackendError>,
    },

    /// An upload finished; failures are only logged.
    UploadSettled {
        file_name: String,
        outcome: Result<(), BackendError>,
    },

    /// Reveal the next character of the response identified by `response_id`.
    RevealTick { response_id: u64 },
}
