//! Transport plumbing shared by the session store, token authority and
//! dispatcher.

pub mod reqwest_client;
pub mod transport;
pub mod types;
pub mod urls;

pub use reqwest_client::{ReqwestConnection, ReqwestTransport};
pub use transport::{Connection, Transport, TransportError};
pub use types::{
    BasicAuth, RawResponse, RequestBody, SessionOptions, SessionProfile, TransportRequest,
};
pub use urls::{join_endpoint, origin_from_url, split_url};

#[cfg(test)]
pub(crate) mod testing;
