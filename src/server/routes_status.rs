//! `GET /` status payload.

use axum::{extract::State, Json};
use serde::{Serialize, Serializer};

use super::AppContext;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub server_status: &'static str,
    pub uptime: String,
    pub telegram_bot: String,
    pub connected_bots: usize,
    /// `bot1..botN` ranked by decreasing load.
    #[serde(serialize_with = "ordered_map")]
    pub loads: Vec<(String, usize)>,
    pub version: &'static str,
}

fn ordered_map<S: Serializer>(
    entries: &[(String, usize)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
}

pub async fn status(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    let mut loads = ctx.pool.loads().snapshot();
    loads.sort_by(|a, b| b.cmp(a));

    Json(StatusResponse {
        server_status: "running",
        uptime: readable_duration(ctx.started_at.elapsed().as_secs()),
        telegram_bot: format!("@{}", ctx.config.server.bot_username),
        connected_bots: ctx.pool.len(),
        loads: loads
            .into_iter()
            .enumerate()
            .map(|(rank, load)| (format!("bot{}", rank + 1), load))
            .collect(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Render seconds as `1d 2h 3m 4s`, dropping leading zero units.
pub fn readable_duration(total_secs: u64) -> String {
    let parts = [
        (total_secs / 86_400, "d"),
        ((total_secs % 86_400) / 3_600, "h"),
        ((total_secs % 3_600) / 60, "m"),
        (total_secs % 60, "s"),
    ];
    let first = parts
        .iter()
        .position(|(value, _)| *value > 0)
        .unwrap_or(parts.len() - 1);
    parts[first..]
        .iter()
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect::<Vec<_>>()
        .join(" ")
}
