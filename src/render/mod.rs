//! HTML player pages.
//!
//! The watch page shows a full player with file details and a download link;
//! the embed page is a bare player meant for iframes. Both stream from the
//! `/file/{id}/{name}` route.

use std::sync::Arc;

use mediarelay_common::{ObjectId, ObjectMetadata, Result};

use crate::streaming::{mime, ObjectResolver, UpstreamPool};

const PLAYER_TEMPLATE: &str = include_str!("../../templates/player.html");
const EMBED_TEMPLATE: &str = include_str!("../../templates/embed.html");

/// Renders player pages for stored objects.
pub struct PlayerRenderer {
    pool: Arc<UpstreamPool>,
    resolver: Arc<ObjectResolver>,
    base_url: String,
}

impl PlayerRenderer {
    pub fn new(pool: Arc<UpstreamPool>, resolver: Arc<ObjectResolver>, base_url: String) -> Self {
        Self {
            pool,
            resolver,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Render the page for object `id`, checking `token` first.
    ///
    /// Rendering only needs metadata, so it does not count against the
    /// selected client's load.
    pub async fn render(
        &self,
        id: ObjectId,
        token: Option<&str>,
        is_embed: bool,
    ) -> Result<String> {
        let (client, source) = self.pool.select();
        let object = self.resolver.resolve(client, source.as_ref(), id).await?;
        ObjectResolver::authorize(&object, token)?;

        let links = ObjectLinks::new(&self.base_url, &object);
        let mime_type = mime::content_type(&links.file_name, object.mime_type.as_deref());

        let template = if is_embed { EMBED_TEMPLATE } else { PLAYER_TEMPLATE };
        Ok(template
            .replace("{{ file_name }}", &escape_html(&links.file_name))
            .replace("{{ file_size }}", &human_size(object.size_bytes))
            .replace("{{ mime_type }}", &escape_html(&mime_type))
            .replace("{{ download_url }}", &escape_html(&links.download))
            .replace("{{ stream_url }}", &escape_html(&links.stream)))
    }
}

/// Public URLs for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLinks {
    pub file_name: String,
    pub watch: String,
    pub embed: String,
    pub stream: String,
    pub download: String,
    /// `/{token}{id}`, usable without a query string
    pub compact: String,
}

impl ObjectLinks {
    pub fn new(base_url: &str, object: &ObjectMetadata) -> Self {
        let base = base_url.trim_end_matches('/');
        let file_name = mime::display_name(object.file_name.as_deref());
        let id = object.object_id;
        let token = object.short_token();
        let tail = format!("{}/{}?hash={}", id, urlencoding::encode(&file_name), token);

        let stream = format!("{base}/file/{tail}");
        Self {
            watch: format!("{base}/watch/{tail}"),
            embed: format!("{base}/embed/{tail}"),
            download: format!("{stream}&download=1"),
            stream,
            compact: format!("{base}/{token}{id}"),
            file_name,
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}
