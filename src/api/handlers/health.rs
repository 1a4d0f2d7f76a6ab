use actix_web::{web, HttpResponse};
use log::error;
use serde_json::json;

use crate::api::AppState;
use crate::utils::error::{AppError, AppResult};

/// Report whether the decoder can be launched, and which version it is
pub async fn health(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tshark = state.analyzer.tshark().clone();

    let version = match web::block(move || tshark.version()).await {
        Ok(version) => version?,
        Err(e) => {
            error!("Health check worker failed: {}", e);
            return Err(AppError::Unknown);
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "tshark": version
    })))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::analysis::tshark::fake;
    use crate::api::routes;
    use crate::models::config::AppConfig;
    use actix_web::{http::StatusCode, test, App};
    use tempfile::TempDir;

    #[actix_web::test]
    async fn reports_decoder_version() {
        let tools = TempDir::new().unwrap();
        let config = AppConfig {
            tshark_path: fake::script(tools.path(), "exit 0"),
            ..AppConfig::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(config)))
                .configure(routes::configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["tshark"], "TShark (Wireshark) 4.2.2.");
    }

    #[actix_web::test]
    async fn missing_decoder_is_unhealthy() {
        let tools = TempDir::new().unwrap();
        let config = AppConfig {
            tshark_path: tools.path().join("absent"),
            ..AppConfig::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(config)))
                .configure(routes::configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "tshark is not installed or not found in PATH.");
    }
}
