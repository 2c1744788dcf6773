//! # arpc-codec — Schema-Driven JSON-RPC Codec
//!
//! Decodes JSON-RPC 2.0 requests into native values and encodes results
//! and errors back, using the method signatures resolved by
//! `arpc-schema`.
//!
//! ## Decoding
//!
//! [`Codec::decode_request`] checks the envelope, looks the method up,
//! validates each parameter against its schema and converts it by the
//! root of its type: BOOLEAN to `bool`, DATA to bytes, QUANTITY to
//! [`Quantity`], OBJECT through the [`ObjectCodecTable`].
//!
//! ## Encoding
//!
//! [`Codec::encode_response`] converts a [`NativeValue`] by the declared
//! result type and validates the output before sending it.
//! [`Codec::encode_error`] always produces a valid error response.
//!
//! ## Error Codes
//!
//! | code | meaning |
//! |---|---|
//! | -32700 | parse error |
//! | -32600 | invalid request |
//! | -32601 | method not found |
//! | -32602 | invalid params |
//! | -32603 | internal error |
//! | -32001 | schema error |
//! | other | domain error declared by the method |

pub mod catalog;
pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod envelope;
pub mod error;
pub mod hex;
pub mod objects;
pub mod quantity;
pub mod scalar;
pub mod value;

pub use catalog::{CatalogError, MethodCatalog, MethodSignature, TypedSchema, WarmupReport};
pub use codec::{Codec, CodecBuilder};
pub use decoder::{id_of_request, RequestDecoder};
pub use encoder::{encode_error, ResponseEncoder};
pub use envelope::{DecodedRequest, JsonRpcError, JsonRpcRequest, JsonRpcResponse, Outcome, JSONRPC_VERSION};
pub use error::{CodecError, ErrorKind, RpcError};
pub use objects::{ObjectCodec, ObjectCodecTable};
pub use quantity::Quantity;
pub use value::{NativeValue, ObjectValue, Record};
