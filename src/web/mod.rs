pub mod pages;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::core::config::Config;
use crate::edgar::filing::ReportCategory;
use crate::edgar::{EdgarClient, Stock};
use crate::export::{export_report, ExportRequest};

const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    edgar: Arc<EdgarClient>,
    // Stocks are expensive to build (one FilingSummary fetch per
    // filing), so they are cached per ticker for the process lifetime.
    stocks: Arc<RwLock<HashMap<String, Arc<Stock>>>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let edgar = EdgarClient::new(&config.user_agent)?
            .with_cache_dir(config.data_dir.join("filings"));
        Ok(Self {
            config: Arc::new(config),
            edgar: Arc::new(edgar),
            stocks: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    async fn stock(&self, ticker: &str) -> Result<Arc<Stock>> {
        let key = ticker.trim().to_uppercase();
        if let Some(stock) = self.stocks.read().await.get(&key) {
            return Ok(Arc::clone(stock));
        }

        // Built outside the lock; a concurrent load of the same ticker
        // just does the work twice and the last insert wins.
        let stock = Arc::new(Stock::load(&self.edgar, &key, &Stock::default_forms()).await?);
        self.stocks
            .write()
            .await
            .insert(key, Arc::clone(&stock));
        Ok(stock)
    }
}

/// Export endpoint response. The discriminator is standardized on
/// `"error"` for every failure kind; clients never see a non-JSON body.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExportResponse {
    Ok {
        download_url: String,
        filename: String,
    },
    Error {
        message: String,
    },
}

async fn home() -> Html<String> {
    Html(pages::home_page())
}

async fn filings(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Html<String> {
    match state.stock(&ticker).await {
        Ok(stock) => Html(pages::filings_page(&stock)),
        Err(e) => {
            log::error!("Failed to load filings for {}: {}", ticker, e);
            Html(pages::error_page(&ticker, &e.to_string()))
        }
    }
}

async fn export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Json<ExportResponse> {
    let result = export_report(
        &state.edgar,
        &request,
        &state.config.export_dir,
        &ReportCategory::Statement,
    )
    .await;

    match result {
        Ok(outcome) => Json(ExportResponse::Ok {
            download_url: "/download".to_string(),
            filename: outcome.filename,
        }),
        Err(e) => {
            log::error!("Export failed for url={}: {}", request.url, e);
            Json(ExportResponse::Error {
                message: e.to_string(),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadParams {
    filename: String,
}

/// Download filenames are produced by the exporter and must stay inside
/// the export dir; anything that could climb out is rejected.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
}

async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Response {
    if !is_safe_filename(&params.filename) {
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    }

    let path = state.config.export_dir.join(&params.filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", params.filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            log::warn!("Download of {:?} failed: {}", path, e);
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/filings/:ticker", get(filings))
        .route("/export", post(export))
        .route("/download", get(download))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<()> {
    let addr = config.bind_addr;
    let state = AppState::new(config)?;
    let app = router(state);

    log::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
