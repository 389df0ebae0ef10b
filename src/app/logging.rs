// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const QUIET_DEPENDENCIES: &str =
    "h2=info,hyper=info,hyper_util=info,reqwest=info,rustls=info,alloy_transport_http=info,alloy_rpc_client=info";

/// Builds the filter string: a bare level gets dependency noise capped,
/// explicit directive lists pass through untouched.
pub fn filter_directives(log_level: &str, debug: bool) -> String {
    let normalized = log_level.trim();
    if normalized.contains(',') || normalized.contains('=') {
        return normalized.to_string();
    }
    let base = match (normalized.is_empty(), debug) {
        (_, true) => "debug",
        (true, false) => "info",
        (false, false) => normalized,
    };
    format!("{base},{QUIET_DEPENDENCIES}")
}

pub fn setup_logging(log_level: &str, debug: bool, json_format: bool) {
    let filter_spec = filter_directives(log_level, debug);
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).init();
    }

    tracing::info!(
        target: "config",
        filter = %filter_spec,
        format = if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
}
