//! Language server exposing W3C validation to editors.
//!
//! Speaks JSON-RPC over any byte stream (stdio in production). Validation
//! results become `textDocument/publishDiagnostics`; the status items travel
//! in a `webvalidator/status` notification the editor extension renders.

pub mod codec;
pub mod protocol;

mod host;
mod server;

pub use codec::{FrameError, FrameReader, FrameWriter};
pub use server::{ExitReason, ServerOptions, serve, serve_stdio};
