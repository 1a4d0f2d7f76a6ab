use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::api::handlers::{analyze::analyze_capture, health::health};

/// Root endpoint to provide information about the API
async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "sharkstats",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Per-protocol traffic statistics for uploaded packet captures",
        "endpoints": [
            {
                "path": "/analyze",
                "method": "POST",
                "description": "Upload a capture as multipart field `pcap` and get protocol statistics"
            },
            {
                "path": "/health",
                "method": "GET",
                "description": "Check that the packet decoder is available"
            }
        ]
    }))
}

/// Configure API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health))
        .route("/analyze", web::post().to(analyze_capture));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn index_lists_analyze_endpoint() {
        let app = test::init_service(App::new().configure(configure)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["name"], "sharkstats");
        assert_eq!(body["endpoints"][0]["path"], "/analyze");
    }

    #[actix_web::test]
    async fn analyze_rejects_get() {
        let app = test::init_service(App::new().configure(configure)).await;
        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/analyze").to_request()).await;
        assert!(resp.status().is_client_error());
    }
}
