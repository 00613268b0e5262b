//! # Response Shapes
//!
//! Every admin action answers in one of two modes. Programmatic callers
//! get structured data; page callers get a view model or a redirect.
//! The functions here are the only place that choice is made.

use serde::Serialize;
use serde_json::{json, Value};

use crate::listing::Paginated;
use crate::resource::{RecordId, ResourceDescriptor};

/// Message key returned after a successful mutation
pub const OPERATION_SUCCEEDED: &str = "operation.succeeded";

/// How the caller wants the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Rendered page (browser navigation)
    Page,
    /// Structured data; `bulk` asks listings for primary keys only
    Programmatic { bulk: bool },
}

impl RequestMode {
    pub fn is_programmatic(&self) -> bool {
        matches!(self, RequestMode::Programmatic { .. })
    }
}

/// Template plus the data it renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub template: String,
    pub context: Value,
}

/// Where a page-mode mutation sends the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    To(String),
    /// The referring page, or the index when there is none
    Back { fallback: String },
}

/// Answer of an admin action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    BulkItems {
        #[serde(rename = "bulkItems")]
        bulk_items: Vec<RecordId>,
    },
    Data {
        data: Value,
    },
    Notice {
        #[serde(skip_serializing_if = "Option::is_none")]
        redirect: Option<String>,
        message: String,
    },
    View(ViewModel),
    Redirect(Location),
}

impl Payload {
    pub fn view(template: String, context: Value) -> Self {
        Payload::View(ViewModel { template, context })
    }

    pub fn succeeded(redirect: Option<String>) -> Self {
        Payload::Notice {
            redirect,
            message: OPERATION_SUCCEEDED.to_string(),
        }
    }
}

/// Shape a listing page
pub fn listing(descriptor: &ResourceDescriptor, page: &Paginated, mode: RequestMode) -> Payload {
    match mode {
        RequestMode::Programmatic { bulk: true } => Payload::BulkItems {
            bulk_items: page.ids(),
        },
        RequestMode::Programmatic { bulk: false } => Payload::Data { data: json!(page) },
        RequestMode::Page => Payload::view(descriptor.template("index"), json!({ "data": page })),
    }
}

/// Shape a single-record or form view. `record` is `None` for the create form.
pub fn record(
    descriptor: &ResourceDescriptor,
    action: &str,
    record: Option<Value>,
    mode: RequestMode,
) -> Payload {
    match mode {
        RequestMode::Programmatic { .. } => Payload::Data {
            data: record.unwrap_or_else(|| json!({ "fillable": descriptor.fillable() })),
        },
        RequestMode::Page => {
            let mut context = serde_json::Map::new();
            if let Some(record) = record {
                context.insert(descriptor.name().to_string(), record);
            }
            Payload::view(descriptor.template(action), Value::Object(context))
        }
    }
}

/// Shape the answer to store and update
pub fn saved(descriptor: &ResourceDescriptor, mode: RequestMode) -> Payload {
    match mode {
        RequestMode::Programmatic { .. } => Payload::succeeded(Some(descriptor.index_url())),
        RequestMode::Page => Payload::Redirect(Location::To(descriptor.index_url())),
    }
}

/// Shape the answer to destroy
pub fn destroyed(descriptor: &ResourceDescriptor, mode: RequestMode) -> Payload {
    match mode {
        RequestMode::Programmatic { .. } => Payload::succeeded(None),
        RequestMode::Page => Payload::Redirect(Location::Back {
            fallback: descriptor.index_url(),
        }),
    }
}

/// Bulk destroy answers the same way in both modes
pub fn bulk_destroyed() -> Payload {
    Payload::succeeded(None)
}
