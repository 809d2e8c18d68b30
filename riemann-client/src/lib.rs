//! Blocking client for the Riemann event protocol
//!
//! This crate provides the pieces an event forwarder needs to talk to a
//! Riemann collector:
//! - Protobuf message types for the collector's wire schema
//! - A length-prefixed TCP transport that checks the collector's acknowledgement
//! - A fire-and-forget UDP transport
//! - A [`RiemannClient`] that connects lazily and reconnects after failures

pub mod client;
pub mod errors;
pub mod models;
pub mod proto;
pub mod traits;

pub use client::{RiemannClient, TcpTransport, UdpTransport};
pub use errors::*;
pub use models::*;
pub use proto::{Attribute, Event, Msg, Query, State};
pub use traits::*;
