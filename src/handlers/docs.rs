//! API description and documentation pages.

use crate::state::AppState;
use axum::{extract::State, response::Html, Json};
use serde::Serialize;
use utoipa::openapi::OpenApi;

const OPENAPI_PATH: &str = "/openapi.json";

#[derive(Serialize)]
pub struct WelcomeBody {
    pub message: String,
}

pub async fn welcome(State(state): State<AppState>) -> Json<WelcomeBody> {
    Json(WelcomeBody {
        message: format!("Welcome to {}", state.name),
    })
}

pub async fn openapi_json(State(state): State<AppState>) -> Json<OpenApi> {
    Json(state.api_doc.as_ref().clone())
}

pub async fn redoc(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>{title} - API Reference</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>body {{ margin: 0; padding: 0; }}</style>
  </head>
  <body>
    <div id="redoc-container"></div>
    <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
    <script>
      Redoc.init('{openapi}', {{}}, document.getElementById('redoc-container'))
    </script>
  </body>
</html>
"#,
        title = html_escape(&state.name),
        openapi = OPENAPI_PATH
    ))
}

pub async fn swagger(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <title>{title} - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
      window.onload = function() {{
        window.ui = SwaggerUIBundle({{
          url: '{openapi}',
          dom_id: '#swagger-ui',
          deepLinking: true,
          presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
          layout: "StandaloneLayout"
        }});
      }};
    </script>
  </body>
</html>
"#,
        title = html_escape(&state.name),
        openapi = OPENAPI_PATH
    ))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
