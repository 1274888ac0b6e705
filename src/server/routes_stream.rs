//! Object streaming routes.
//!
//! - `GET /file/{id}/{file_name}?hash={token}[&download=1]`
//! - `GET /{token}{id}` and `GET /{id}[/...]?hash={token}` (fallback)
//!
//! Each request runs `Received -> Authorized -> RangePlanned -> Streaming`
//! and ends either completed or aborted when the body stream stops early.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use mediarelay_common::Error;
use serde::Deserialize;

use super::{AppContext, AppError};
use crate::streaming::{
    locate, mime, parse_range_spec, plan_range_spec, ChunkProducer, Locator, ObjectResolver,
};

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub download: Option<String>,
}

impl StreamQuery {
    fn download(&self) -> bool {
        self.download.as_deref() == Some("1")
    }
}

/// `GET /file/{id}/{file_name}`
pub async fn file_stream(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let locator = locate(&path, query.hash.as_deref())?;
    media_streamer(&ctx, locator, query.download(), &headers).await
}

/// Fallback for every path no other route claims.
pub async fn path_stream(
    State(ctx): State<AppContext>,
    method: Method,
    uri: Uri,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }
    let locator = locate(uri.path(), query.hash.as_deref())?;
    media_streamer(&ctx, locator, false, &headers).await
}

/// Serve the requested range of an object from the least-loaded client.
pub async fn media_streamer(
    ctx: &AppContext,
    locator: Locator,
    download: bool,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let range_header = headers
        .get(header::RANGE)
        .map(|v| {
            v.to_str()
                .map_err(|_| Error::malformed_range("Range header is not valid ASCII"))
        })
        .transpose()?;
    // Syntax is checked before any upstream work; bounds need the object size.
    let range = parse_range_spec(range_header)?;

    let (client, source) = ctx.pool.select();
    // Released on every early return below, or when the body finishes.
    let load = ctx.pool.loads().acquire(client);
    if ctx.pool.len() > 1 {
        tracing::info!(
            client = %client,
            object_id = %locator.id,
            "Client {} is now serving",
            client
        );
    }

    let object = ctx
        .resolver
        .resolve(client, source.as_ref(), locator.id)
        .await?;
    ObjectResolver::authorize(&object, locator.token.as_deref())?;

    let plan = plan_range_spec(range, object.size_bytes, ctx.config.stream.chunk_size)?;
    tracing::debug!(
        client = %client,
        object_id = %object.object_id,
        start = plan.start_byte,
        end = plan.end_byte_inclusive,
        chunks = plan.chunk_count,
        "Streaming range"
    );

    let file_name = mime::display_name(object.file_name.as_deref());
    let content_type = mime::content_type(&file_name, object.mime_type.as_deref());
    let disposition = HeaderValue::from_bytes(
        mime::content_disposition(&file_name, download).as_bytes(),
    )
    .map_err(|e| Error::internal(format!("invalid Content-Disposition: {e}")))?;
    let status = if range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };
    let content_range = plan.content_range(object.size_bytes);

    let producer = ChunkProducer::new(source, Arc::clone(&object), plan).with_load_guard(load);
    let body = Body::from_stream(producer.into_stream());

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, plan.content_length())
        .header(header::CONTENT_RANGE, content_range)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Range, Content-Type")
        .header(header::X_FRAME_OPTIONS, "ALLOWALL")
        .body(body)
        .map_err(|e| AppError(Error::internal(format!("building response: {e}"))))
}
