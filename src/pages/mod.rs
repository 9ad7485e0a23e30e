//! Headless page controllers
//!
//! Each page owns its own state (inputs, last result, last error) and talks
//! to one or two services. Requests take `&mut self`, so a page cannot start
//! a second request while one is outstanding.

pub mod analyzer;
pub mod chat;
pub mod editor;
pub mod generator;

pub use analyzer::AnalyzerPage;
pub use chat::ChatPage;
pub use editor::EditorPage;
pub use generator::GeneratorPage;

use crate::Result;

/// Store the failure message for display and hand the result back.
pub(crate) fn record<T>(error: &mut Option<String>, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        tracing::error!("{}", e);
        *error = Some(e.to_string());
    }
    result
}
