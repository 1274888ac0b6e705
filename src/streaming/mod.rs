//! Media streaming core.
//!
//! Turns an HTTP request for a stored object into a chunked read from one of
//! several equivalent upstream clients.
//!
//! # Request flow
//!
//! 1. [`locator`] parses the path/query into an object id and token
//! 2. [`load::UpstreamPool`] picks the least-loaded upstream client
//! 3. [`resolver::ObjectResolver`] resolves (and memoizes) object metadata and
//!    checks the token
//! 4. [`range`] turns the `Range` header into a chunk-aligned [`RangePlan`]
//! 5. [`producer::ChunkProducer`] fetches and trims the planned chunks

pub mod load;
pub mod locator;
pub mod mime;
pub mod producer;
pub mod range;
pub mod resolver;

pub use load::{LoadGuard, LoadTracker, UpstreamPool};
pub use locator::{locate, Locator};
pub use producer::ChunkProducer;
pub use range::{
    parse_range_header, parse_range_spec, plan_range, plan_range_spec, ByteRange, RangePlan,
    RangeSpec,
};
pub use resolver::{verify_token, MetadataCache, ObjectResolver};
