use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner", body = String)
    ),
    tag = "health"
)]
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, response::IntoResponse};

    #[tokio::test]
    async fn root_returns_banner() {
        let response = root().await.into_response();
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let banner = String::from_utf8(body.to_vec()).unwrap();
        assert!(banner.starts_with(env!("CARGO_PKG_NAME")));
    }
}
