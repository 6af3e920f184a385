use std::borrow::Cow;
use std::sync::Arc;

use crate::controller::Controller;
use crate::server::api::{self, ApiError};

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn json(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }
}

fn respond(result: Result<String, ApiError>) -> HttpResponse {
    match result {
        Ok(payload) => HttpResponse::json(payload),
        Err(err) => {
            let (status_code, status_text) = err.status();
            if status_code >= 500 {
                tracing::warn!(status_code, error = %err, "request failed");
            }
            error_response(status_code, status_text, &err.to_string())
        }
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_string())
}

/// Dispatches one `/api` request. Path segments are percent-decoded before matching.
///
/// Everything except the solver call touches the state file, so those routes run on the
/// blocking pool instead of an async worker.
pub async fn route_request(
    ctl: &Arc<Controller>,
    method: &str,
    path: &str,
    body: &str,
) -> HttpResponse {
    let path = path.split('?').next().unwrap_or_default();
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode)
        .collect();

    if method == "POST" && segments == ["api", "optimize"] {
        return respond(api::optimize_payload(ctl, body).await);
    }

    let ctl = Arc::clone(ctl);
    let method = method.to_string();
    let body = body.to_string();
    let task = tokio::task::spawn_blocking(move || dispatch(&ctl, &method, &segments, &body));
    match task.await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "request handler panicked");
            error_response(500, "Internal Server Error", "Request handler failed")
        }
    }
}

fn dispatch(ctl: &Controller, method: &str, segments: &[String], body: &str) -> HttpResponse {
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match (method, segments.as_slice()) {
        ("GET", ["api", "health"]) => respond(api::health_payload(ctl)),
        ("GET", ["api", "state"]) => respond(api::state_payload(ctl)),
        ("DELETE", ["api", "state"]) => respond(api::state_reset_payload(ctl)),
        ("POST", ["api", "state", "save"]) => respond(api::state_save_payload(ctl)),
        ("POST", ["api", "state", "load"]) => respond(api::state_load_payload(ctl)),
        ("POST", ["api", "orbs", "import"]) => respond(api::orbs_import_payload(ctl, body)),
        ("POST", ["api", "orbs"]) => respond(api::orb_add_payload(ctl, body)),
        ("DELETE", ["api", "orbs"]) => respond(api::orbs_clear_payload(ctl)),
        ("DELETE", ["api", "orbs", index]) => respond(api::orb_remove_payload(ctl, index)),
        ("POST", ["api", "profiles"]) => respond(api::profile_add_payload(ctl)),
        ("POST", ["api", "profiles", "import"]) => {
            respond(api::profiles_import_payload(ctl, body))
        }
        ("GET", ["api", "profiles", "export"]) => respond(api::profiles_export_payload(ctl)),
        ("DELETE", ["api", "profiles", index]) => {
            respond(api::profile_remove_payload(ctl, index))
        }
        ("PATCH", ["api", "profiles", index]) => {
            respond(api::profile_edit_payload(ctl, index, body))
        }
        ("PUT", ["api", "profiles", index, "categories", category]) => {
            respond(api::category_set_payload(ctl, index, category, body))
        }
        ("POST", ["api", "profiles", index, "template"]) => {
            respond(api::template_apply_payload(ctl, index, body))
        }
        ("POST", ["api", "shareable", category]) => {
            respond(api::shareable_toggle_payload(ctl, category))
        }
        ("GET", ["api", "templates"]) => respond(api::templates_payload(ctl)),
        ("GET", ["api", "result"]) => respond(api::result_payload(ctl)),
        _ => error_response(404, "Not Found", "Route not found"),
    }
}

pub fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}

pub fn index_html() -> &'static str {
    r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Orbsmith Console</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 900px; margin: 24px auto; padding: 0 12px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    textarea { width: 100%; min-height: 120px; box-sizing: border-box; font-family: monospace; }
    button { margin: 8px 8px 0 0; padding: 8px 14px; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 180px; }
  </style>
</head>
<body>
  <h1>Orbsmith Local API</h1>

  <div class="card">
    <strong>State</strong>
    <div>
      <button data-method="GET" data-path="/api/state">GET /api/state</button>
      <button data-method="POST" data-path="/api/profiles">Add profile</button>
      <button data-method="GET" data-path="/api/templates">Templates</button>
      <button data-method="GET" data-path="/api/result">Last result</button>
    </div>
  </div>

  <div class="card">
    <strong>Import orbs (JSON or CSV)</strong>
    <textarea id="orbs">[{"type":"Flame","set":"Lucifer","rarity":"Epic","value":"12%","level":4}]</textarea>
    <button id="import-btn">POST /api/orbs/import</button>
    <button data-method="POST" data-path="/api/optimize">POST /api/optimize</button>
  </div>

  <pre id="output">Ready.</pre>

  <script>
    const output = document.getElementById('output');
    async function request(method, path, body) {
      output.textContent = 'Loading…';
      const response = await fetch(path, { method, body });
      output.textContent = 'HTTP ' + response.status + '\n' + await response.text();
    }
    document.querySelectorAll('button[data-path]').forEach(btn => {
      btn.addEventListener('click', () => request(btn.dataset.method, btn.dataset.path));
    });
    document.getElementById('import-btn').addEventListener('click', () => {
      request('POST', '/api/orbs/import', document.getElementById('orbs').value);
    });
  </script>
</body>
</html>
"#
}
