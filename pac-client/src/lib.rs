//! PAC (Proveedor Autorizado de Certificación) client
//!
//! - [`PacClient`]: capability trait the engine depends on
//! - [`HttpPacClient`]: JSON-over-HTTP implementation
//! - [`wire`]: the HTTP contract, shared with the development PAC server

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;
pub mod wire;

pub use client::PacClient;
pub use config::PacConfig;
pub use error::{PacError, PacResult};
pub use http::HttpPacClient;
pub use types::{
    CancelReceipt, CancelRequest, SatDocumentState, SatStatus, StampReceipt, StatusQuery,
};
