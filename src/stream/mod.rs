//! Stream module for the feed connection

mod client;
mod url;

pub use client::{
    connect, Frame, StreamEvent, StreamHandle, ABNORMAL_CLOSURE, NO_STATUS_RECEIVED,
};
pub use url::{normalize_stream_url, STREAM_PATH_SUFFIX};
