use crate::models::errors::AppError;
use axum::{
    http::Uri,
    response::{Html, IntoResponse, Response},
};

/// Unknown API paths get a JSON 404; everything else gets the app shell
pub async fn fallback(uri: Uri) -> Response {
    let path = uri.path();
    if path == "/api" || path.starts_with("/api/") {
        return AppError::not_found("Endpoint").into_response();
    }

    Html(APP_SHELL).into_response()
}

const APP_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Patient Information &amp; Shop</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 800px;
            margin: 0 auto;
            padding: 2rem;
            background: #f5f5f5;
        }
        .container {
            background: white;
            padding: 2rem;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        h1 {
            color: #333;
            text-align: center;
        }
        .status {
            text-align: center;
            color: #666;
            margin-top: 1rem;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>Patient Information &amp; Shop</h1>
        <p class="status">Server is running. API endpoints are available under /api.</p>
    </div>
</body>
</html>
"#;
