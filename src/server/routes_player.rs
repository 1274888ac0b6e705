//! Player page routes.
//!
//! - `GET /watch/{id}/{file_name}?hash={token}` or `GET /watch/{token}{id}`
//! - `GET /embed/...` - same, minimal page for iframes

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Response},
};

use super::routes_stream::StreamQuery;
use super::{AppContext, AppError};
use crate::streaming::locate;

pub async fn watch(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, AppError> {
    render_player(&ctx, &path, query.hash.as_deref(), false).await
}

pub async fn embed(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, AppError> {
    render_player(&ctx, &path, query.hash.as_deref(), true).await
}

async fn render_player(
    ctx: &AppContext,
    path: &str,
    hash: Option<&str>,
    is_embed: bool,
) -> Result<Response, AppError> {
    let locator = locate(path, hash)?;
    let html = ctx
        .renderer
        .render(locator.id, locator.token.as_deref(), is_embed)
        .await?;

    let mut response = Html(html).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("ALLOWALL"));
    if is_embed {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("frame-ancestors *"),
        );
    }
    Ok(response)
}
