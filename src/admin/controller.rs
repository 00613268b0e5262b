//! Per-resource controller
//!
//! One method per admin action. Each runs the matching `AdminService`
//! executor and shapes the answer for the request mode.

use std::sync::Arc;

use serde_json::Value;

use super::errors::AdminResult;
use super::payload::{self, Payload, RequestMode};
use super::service::AdminService;
use crate::auth::Caller;
use crate::listing::ListParams;
use crate::resource::{RecordId, ResourceDescriptor};

/// Admin actions for one resource
pub struct ResourceController<'a> {
    service: &'a AdminService,
    descriptor: Arc<ResourceDescriptor>,
}

impl<'a> ResourceController<'a> {
    pub fn new(service: &'a AdminService, descriptor: Arc<ResourceDescriptor>) -> Self {
        Self {
            service,
            descriptor,
        }
    }

    /// Resolve the controller for a URL (plural) resource name
    pub fn for_plural(service: &'a AdminService, plural: &str) -> AdminResult<Self> {
        Ok(Self::new(service, service.resource(plural)?))
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn index(&self, caller: &Caller, params: &ListParams, mode: RequestMode) -> AdminResult<Payload> {
        let page = self.service.list(&self.descriptor, caller, params)?;
        Ok(payload::listing(&self.descriptor, &page, mode))
    }

    pub fn create(&self, caller: &Caller, mode: RequestMode) -> AdminResult<Payload> {
        self.service.create_form(&self.descriptor, caller)?;
        Ok(payload::record(&self.descriptor, "create", None, mode))
    }

    pub fn store(&self, caller: &Caller, input: &Value, mode: RequestMode) -> AdminResult<Payload> {
        self.service.create(&self.descriptor, caller, input)?;
        Ok(payload::saved(&self.descriptor, mode))
    }

    pub fn show(&self, caller: &Caller, id: RecordId, mode: RequestMode) -> AdminResult<Payload> {
        let record = self.service.show(&self.descriptor, caller, id)?;
        Ok(payload::record(&self.descriptor, "show", Some(record), mode))
    }

    pub fn edit(&self, caller: &Caller, id: RecordId, mode: RequestMode) -> AdminResult<Payload> {
        let record = self.service.edit_form(&self.descriptor, caller, id)?;
        Ok(payload::record(
            &self.descriptor,
            "edit",
            Some(record.into_value()),
            mode,
        ))
    }

    pub fn update(
        &self,
        caller: &Caller,
        id: RecordId,
        input: &Value,
        mode: RequestMode,
    ) -> AdminResult<Payload> {
        self.service.update(&self.descriptor, caller, id, input)?;
        Ok(payload::saved(&self.descriptor, mode))
    }

    pub fn destroy(&self, caller: &Caller, id: RecordId, mode: RequestMode) -> AdminResult<Payload> {
        self.service.destroy(&self.descriptor, caller, id)?;
        Ok(payload::destroyed(&self.descriptor, mode))
    }

    pub fn bulk_destroy(&self, caller: &Caller, input: &Value) -> AdminResult<Payload> {
        self.service.bulk_destroy(&self.descriptor, caller, input)?;
        Ok(payload::bulk_destroyed())
    }
}
