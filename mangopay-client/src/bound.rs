//! Records attached to a session.
//!
//! A [`Bound`] pairs a [`MangoPay`] handle with a record. Saving replaces the
//! record with the service response in a single assignment; the handle is
//! never part of the payload and is never touched by the merge.

use std::{
    fmt,
    ops::{Deref, DerefMut},
};

use tracing::debug;

use crate::{
    action::Action,
    client::MangoPay,
    dispatch::{Dispatched, PathParams},
    error::Result,
    fields::Sanitizer,
    model::Record,
    rate_limit::RateLimitInfo,
    transport::{HttpTransport, Transport},
};

/// A record attached to the session that produced it.
///
/// Derefs to the record, so its fields read directly:
/// `hook.url`, `transfer.reply.status`...
pub struct Bound<R, T = HttpTransport> {
    service: MangoPay<T>,
    record: R,
}

impl<R, T> Bound<R, T> {
    pub(crate) fn new(service: MangoPay<T>, record: R) -> Self {
        Self { service, record }
    }

    /// Session this object belongs to.
    #[must_use]
    pub fn service(&self) -> &MangoPay<T> {
        &self.service
    }

    /// The server-state record.
    #[must_use]
    pub fn record(&self) -> &R {
        &self.record
    }

    /// Mutable access to the record, for edits before the next save.
    pub fn record_mut(&mut self) -> &mut R {
        &mut self.record
    }

    /// Detaches the record from its session.
    #[must_use]
    pub fn into_record(self) -> R {
        self.record
    }
}

impl<R: Record, T: Transport> Bound<R, T> {
    /// Identifier of the record, empty before creation.
    #[must_use]
    pub fn id(&self) -> &str {
        self.record.id()
    }

    /// Sends the record for `action` and merges the response into it.
    ///
    /// The record is replaced only when the dispatch succeeds. A logical
    /// failure is reported after the merge, so the failed state stays
    /// inspectable on `self`.
    pub(crate) async fn submit(
        &mut self,
        action: Action,
        params: &PathParams,
    ) -> Result<Option<RateLimitInfo>> {
        let fields = self.record.to_fields(action.intent())?;
        let fields = Sanitizer::for_record::<R>().sanitize(fields, action);
        debug!(action = %action, fields = fields.len(), kind = R::KIND, "submitting record");

        let Dispatched { value, rate_limit } =
            self.service.request::<R>(action, params, Some(fields)).await?;
        self.record = value;

        match self.record.failure() {
            Some(err) => Err(err),
            None => Ok(rate_limit),
        }
    }
}

impl<R, T> Deref for Bound<R, T> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}

impl<R, T> DerefMut for Bound<R, T> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.record
    }
}

impl<R: fmt::Debug, T: Transport> fmt::Debug for Bound<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("client_id", &self.service.client_id())
            .field("record", &self.record)
            .finish()
    }
}
