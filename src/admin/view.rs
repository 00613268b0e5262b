//! Presentation seam for page-mode answers

use super::errors::{AdminError, AdminResult};
use super::payload::ViewModel;

/// A rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub content_type: &'static str,
    pub body: String,
}

/// Turns view models into pages
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &ViewModel) -> AdminResult<RenderedView>;
}

/// Emits the view model itself as JSON, for a front end that renders client-side
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonViewRenderer;

impl ViewRenderer for JsonViewRenderer {
    fn render(&self, view: &ViewModel) -> AdminResult<RenderedView> {
        let body = serde_json::to_string(view).map_err(|e| AdminError::Render(e.to_string()))?;
        Ok(RenderedView {
            content_type: "application/json",
            body,
        })
    }
}
