//! Request path grammar.
//!
//! Two forms address an object:
//!
//! - `{id}[/{file_name}]?hash={token}` - explicit token in the query; the
//!   file name is cosmetic and ignored
//! - `{token}{id}` - compact form, a 6-character token immediately followed by
//!   the numeric id
//!
//! The compact form is only considered when no `hash` query parameter is
//! present, so an all-digit id such as `123456789` with an explicit hash is
//! never split into a token and a shorter id.

use std::sync::LazyLock;

use mediarelay_common::{Error, ObjectId, Result};
use regex::Regex;

static COMPACT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9_-]{6})(\d+)$").expect("Invalid compact path regex")
});

static ID_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:/.*)?$").expect("Invalid id path regex"));

/// Object id plus the token supplied with the request, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub id: ObjectId,
    pub token: Option<String>,
}

fn parse_id(digits: &str) -> Result<ObjectId> {
    digits
        .parse()
        .map_err(|_| Error::bad_request(format!("object id out of range: {digits}")))
}

/// Parse a request path (without the route prefix or leading slash).
pub fn locate(path: &str, query_hash: Option<&str>) -> Result<Locator> {
    let path = path.trim_start_matches('/');

    if query_hash.is_none() {
        if let Some(caps) = COMPACT_PATH.captures(path) {
            return Ok(Locator {
                id: parse_id(&caps[2])?,
                token: Some(caps[1].to_string()),
            });
        }
    }

    let caps = ID_PATH
        .captures(path)
        .ok_or_else(|| Error::bad_request(format!("no object id in path: {path}")))?;
    Ok(Locator {
        id: parse_id(&caps[1])?,
        token: query_hash.map(str::to_string),
    })
}
