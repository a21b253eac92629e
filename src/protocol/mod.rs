//! Protocol module - action codes, status codes and wire envelopes.
//!
//! - [`Action`] - CRUD action codes and HTTP method mapping
//! - [`Status`] - numeric result status
//! - [`Packet`], [`BatchRequest`], [`BatchResponse`], [`PacketResult`] - batch protocol
//! - [`Request`], [`Response`] - single-operation envelope

mod action;
mod packet;
mod status;

pub use action::Action;
pub use packet::{
    BatchRequest, BatchResponse, Packet, PacketResult, Request, Response, OK_MESSAGE,
};
pub use status::{InvalidStatus, Status};
