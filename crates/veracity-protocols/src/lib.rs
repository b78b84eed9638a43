//! # Veracity Protocols
//!
//! Core protocol definitions for the Veracity fact-check shell.
//! Contains the relay message vocabulary, the verification data model,
//! and the traits the surfaces communicate through - no implementations.
//!
//! ## Core Concepts
//!
//! - [`RelayMessage`] - Typed payloads exchanged between the three surfaces
//! - [`MessageBus`] - The host messaging bus the surfaces send through
//! - [`HostActions`] - Side-effecting host operations (open panel, open tab)
//! - [`VerificationResult`] - The response payload of the external service

pub mod bus;
pub mod error;
pub mod message;
pub mod report;
pub mod verdict;

// Re-export core types
pub use bus::{Endpoint, Envelope, HostActions, MessageBus};
pub use error::{DeliveryError, HostError, StoreError, SurfaceError, VerifyError};
pub use message::{Ack, RelayMessage};
pub use report::SavedReport;
pub use verdict::{Analysis, CheckRequest, EvidenceItem, ScamSignal, SourceRef, VerificationResult};
