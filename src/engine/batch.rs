//! Batch execution over wire packets.
//!
//! Every packet is decoded, dispatched and encoded on its own: a failing
//! packet becomes an error result and never aborts the batch. Results keep
//! the request's length and order.

use bytes::Bytes;

use super::Engine;
use crate::codec::Codec;
use crate::error::{CallError, CrudpError, Result};
use crate::handler::{CallArgs, CallContext, HandlerRecord, HandlerTable, Value};
use crate::protocol::{
    Action, BatchRequest, BatchResponse, Packet, PacketResult, Request, Response, Status,
    OK_MESSAGE,
};

impl<C: Codec> Engine<C> {
    /// Execute a batch against one snapshot of the handler table.
    ///
    /// `context` is injected into the context slot of every packet's
    /// argument bag.
    pub fn execute(&self, request: &BatchRequest, context: &CallContext) -> BatchResponse {
        let table = self.snapshot();
        let results = request
            .packets
            .iter()
            .map(|packet| self.execute_packet(&table, packet, context))
            .collect();
        BatchResponse { results }
    }

    /// Decode a batch envelope, execute it and encode the response.
    ///
    /// # Errors
    ///
    /// Returns [`CrudpError::MalformedBatch`] if no codec is configured or
    /// the envelope cannot be decoded. Per-packet failures are reported
    /// inside the response.
    pub fn handle_batch(&self, body: &[u8], context: &CallContext) -> Result<Vec<u8>> {
        let codec = self
            .codec
            .as_ref()
            .ok_or_else(|| CrudpError::MalformedBatch("no codec configured".to_string()))?;

        let request: BatchRequest = codec
            .decode(body)
            .map_err(|e| CrudpError::MalformedBatch(e.to_string()))?;

        tracing::debug!("executing batch of {} packets", request.len());
        let response = self.execute(&request, context);
        Ok(codec.encode(&response)?)
    }

    /// Run a single-operation request.
    ///
    /// `path` fills the path slot of the argument bag. Failures become an
    /// error-status response echoing the request id.
    pub fn call_single(
        &self,
        handler_id: u8,
        action: Action,
        request: &Request,
        context: &CallContext,
        path: Option<&str>,
    ) -> Response {
        let table = self.snapshot();
        match self.run(&table, handler_id, action.code(), &request.data, context, path) {
            Ok(data) => Response {
                req_id: request.req_id.clone(),
                data,
                message_type: Status::Success,
                message: OK_MESSAGE.to_string(),
            },
            Err(e) => {
                tracing::debug!(handler_id, action = %action, "call failed: {}", e);
                Response {
                    req_id: request.req_id.clone(),
                    data: Vec::new(),
                    message_type: Status::Error,
                    message: e.to_string(),
                }
            }
        }
    }

    fn execute_packet(
        &self,
        table: &HandlerTable<C>,
        packet: &Packet,
        context: &CallContext,
    ) -> PacketResult {
        match self.run(table, packet.handler_id, packet.action, &packet.data, context, None) {
            Ok(data) => PacketResult::success(packet, data),
            Err(e) => {
                tracing::debug!(
                    req_id = %packet.req_id,
                    handler_id = packet.handler_id,
                    "packet failed: {}",
                    e
                );
                PacketResult::error(packet, e.to_string())
            }
        }
    }

    fn run(
        &self,
        table: &HandlerTable<C>,
        handler_id: u8,
        action: u8,
        data: &[Bytes],
        context: &CallContext,
        path: Option<&str>,
    ) -> std::result::Result<Vec<Bytes>, CallError> {
        let record = table
            .get(handler_id)
            .ok_or(CallError::UnknownHandler(handler_id))?;

        let items = self.decode_items(record, data)?;
        let args = CallArgs::from_parts(context.clone(), path.map(str::to_string), items);

        match self.dispatch(table, handler_id, action, args)? {
            Some(output) => {
                let codec = self
                    .codec
                    .as_ref()
                    .ok_or(CallError::CodecNotConfigured("encode"))?;
                record.binding().encode(codec, &output)
            }
            None => Ok(Vec::new()),
        }
    }

    fn decode_items(
        &self,
        record: &HandlerRecord<C>,
        data: &[Bytes],
    ) -> std::result::Result<Vec<Value>, CallError> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        // No argument type: blocks pass through untouched.
        if record.item_type().is_none() {
            return Ok(data.iter().map(|block| Box::new(block.clone()) as Value).collect());
        }

        let codec = self
            .codec
            .as_ref()
            .ok_or(CallError::CodecNotConfigured("decode"))?;
        record.binding().decode(codec, data)
    }
}
