//! Printful API integration
//!
//! The cached, throttled client plus its supporting pieces: the transport
//! seam, the session caches, offset pagination and the mockup task poller.

mod cache;
mod client;
mod error;
mod models;
mod pagination;
mod task;
mod transport;

pub use client::{
    CredentialCheck, PrintfulClient, IMAGE_PAGE_LIMIT, STYLE_PAGE_LIMIT, TEMPLATE_PAGE_LIMIT,
};
pub use error::{ClientError, ClientResult};
pub use models::{PrintfulResponse, TaskMockup, TaskStatus, UploadedFile};
pub use transport::{HttpTransport, RawResponse, Transport};
