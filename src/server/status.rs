use super::AppState;

const ROUTES: &[(&str, &str)] = &[
    ("GET", "/now-playing"),
    ("GET", "/recently-played?limit="),
    ("GET", "/top/tracks?limit=&time_range="),
    ("GET", "/top/artists?limit=&time_range="),
    ("GET", "/search?q=&limit=&market=&force="),
    ("GET", "/track/{id}?force="),
    ("GET", "/preview/{id}"),
    ("GET", "/playlist"),
    ("POST", "/playlist/tracks"),
    ("DELETE", "/playlist/tracks/{id}"),
    ("PUT", "/library/tracks/{id}"),
    ("DELETE", "/library/tracks/{id}"),
    ("GET", "/health"),
];

/// little html page so hitting the root in a browser tells you it's alive
pub async fn render(state: &AppState) -> String {
    let credentials = state.gateway.tokens().status();
    let credential_rows: String = credentials
        .iter()
        .map(|c| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                c.kind,
                match (c.refreshing, c.valid) {
                    (true, _) => "refreshing",
                    (false, true) => "valid",
                    (false, false) => "not fetched / stale",
                },
                c.expires_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string())
            )
        })
        .collect();

    let mut cache_rows = String::new();
    for cache in [&state.search_cache, &state.track_cache] {
        cache_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}s</td></tr>",
            cache.name(),
            cache.len().await,
            cache.default_ttl().num_seconds()
        ));
    }

    let route_rows: String = ROUTES
        .iter()
        .map(|(method, path)| {
            format!(
                "<tr><td>{}</td><td><code>{}</code></td></tr>",
                method,
                html_escape(path)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>tunesproxy</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 640px;
            margin: 60px auto;
            padding: 20px;
            color: #333;
        }}
        h1 {{ color: #1db954; }}
        table {{ border-collapse: collapse; width: 100%; margin-bottom: 30px; }}
        td {{ padding: 6px 10px; border-bottom: 1px solid #eee; }}
        code {{ background: #f5f5f5; padding: 2px 4px; border-radius: 4px; }}
    </style>
</head>
<body>
    <h1>tunesproxy is up</h1>
    <p>Playlist: <code>{}</code></p>
    <h2>Credentials</h2>
    <table>{}</table>
    <h2>Caches</h2>
    <table>{}</table>
    <h2>Routes</h2>
    <table>{}</table>
</body>
</html>"#,
        html_escape(&state.playlist_id),
        credential_rows,
        cache_rows,
        route_rows
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
