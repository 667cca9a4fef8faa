//! PAC capability interface

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::PacResult;
use crate::types::{CancelReceipt, CancelRequest, SatStatus, StampReceipt, StatusQuery};

/// What the engine needs from a certification provider.
///
/// Each call is a single bounded attempt; retry decisions belong to the caller.
#[async_trait]
pub trait PacClient: Send + Sync {
    /// Stamp a sealed CFDI
    async fn stamp(&self, signed_xml: &str) -> PacResult<StampReceipt>;

    /// Cancel a stamped CFDI
    async fn cancel(&self, request: &CancelRequest) -> PacResult<CancelReceipt>;

    /// Read-only SAT status lookup
    async fn query_status(&self, query: &StatusQuery) -> PacResult<SatStatus>;
}

#[async_trait]
impl<T: PacClient + ?Sized> PacClient for Arc<T> {
    async fn stamp(&self, signed_xml: &str) -> PacResult<StampReceipt> {
        (**self).stamp(signed_xml).await
    }

    async fn cancel(&self, request: &CancelRequest) -> PacResult<CancelReceipt> {
        (**self).cancel(request).await
    }

    async fn query_status(&self, query: &StatusQuery) -> PacResult<SatStatus> {
        (**self).query_status(query).await
    }
}
