//! Search lifecycle: validation, sequencing of overlapping invocations and
//! reconciliation of settled responses into render state.
//!
//! Every issued search gets a strictly increasing generation. Only the latest
//! generation may reconcile; anything older is reported as
//! [`Reconciliation::Stale`] and leaves the render state alone.

use crate::error::BackendError;
use crate::error::ValidationError;
use crate::i18n::TextBundle;
use neurodoc_protocol::SearchPayload;
use neurodoc_protocol::SearchResult;

/// Trims `raw`; whitespace-only input never becomes a search.
pub fn normalize_query(raw: &str) -> Result<&str, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyQuery)
    } else {
        Ok(trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: String,
}

/// What the presentation layer shows. `results` and `response` are never both
/// non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub results: Vec<SearchResult>,
    pub response: String,
    /// Bumped on every assignment to `response`; keys the reveal.
    pub response_id: u64,
    pub uploaded_file: Option<String>,
}

impl RenderState {
    fn set_response(&mut self, text: &str) {
        self.response.clear();
        self.response.push_str(text);
        self.response_id += 1;
    }

    fn clear(&mut self) {
        self.results.clear();
        if !self.response.is_empty() {
            self.set_response("");
        }
        self.uploaded_file = None;
    }
}

#[derive(Debug)]
pub enum Reconciliation {
    /// Settled after a newer search was issued; discarded.
    Stale { generation: u64 },
    Results { query: String, count: usize },
    NoResults { query: String },
    Failed { query: String, error: BackendError },
}

#[derive(Debug, Default)]
pub struct SearchOrchestrator {
    issued: u64,
    in_flight: Option<SearchTicket>,
    render: RenderState,
}

impl SearchOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters `Searching` for an already validated query: clears everything a
    /// previous operation left on screen and supersedes any in-flight search.
    pub fn begin(&mut self, query: &str) -> SearchTicket {
        self.issued += 1;
        self.render.clear();
        let ticket = SearchTicket {
            generation: self.issued,
            query: query.to_string(),
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    pub fn reconcile(
        &mut self,
        generation: u64,
        outcome: Result<SearchPayload, BackendError>,
        texts: &TextBundle,
    ) -> Reconciliation {
        let ticket = match self.in_flight.take() {
            Some(ticket) if ticket.generation == generation => ticket,
            other => {
                self.in_flight = other;
                return Reconciliation::Stale { generation };
            }
        };

        match outcome {
            Ok(payload) => {
                let results = payload.into_results();
                if results.is_empty() {
                    self.render.results.clear();
                    self.render.set_response(texts.no_results);
                    Reconciliation::NoResults {
                        query: ticket.query,
                    }
                } else {
                    let count = results.len();
                    self.render.results = results;
                    Reconciliation::Results {
                        query: ticket.query,
                        count,
                    }
                }
            }
            Err(error) => {
                self.render.results.clear();
                self.render.set_response(texts.connection_error);
                Reconciliation::Failed {
                    query: ticket.query,
                    error,
                }
            }
        }
    }

    /// Clears the render state without affecting an in-flight search.
    pub fn clear_input(&mut self) {
        self.render.clear();
    }

    pub fn annotate_upload(&mut self, file_name: String) {
        self.render.uploaded_file = Some(file_name);
    }

    pub fn render(&self) -> &RenderState {
        &self.render
    }

    pub fn in_flight(&self) -> Option<&SearchTicket> {
        self.in_flight.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.in_flight.is_some()
    }
}
