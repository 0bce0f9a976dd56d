//! Wire and preference types shared between the NeuroDoc engine and its front
//! ends.

pub mod config_types;
pub mod locale;
pub mod search;

pub use config_types::Theme;
pub use locale::Locale;
pub use locale::LocaleSelection;
pub use locale::UnknownLocale;
pub use search::FilterSpec;
pub use search::SearchPayload;
pub use search::SearchRequest;
pub use search::SearchResult;
