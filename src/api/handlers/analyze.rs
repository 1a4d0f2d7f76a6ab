use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::api::AppState;
use crate::utils::error::{AppError, AppResult};

/// Multipart field carrying the capture
pub const UPLOAD_FIELD: &str = "pcap";

/// An upload written to a temp file; the file is removed when this drops
struct StagedUpload {
    file: NamedTempFile,
    filename: String,
    size: u64,
}

/// What the multipart body held under [`UPLOAD_FIELD`]
enum UploadSlot {
    Missing,
    EmptyFilename,
    Staged(StagedUpload),
}

/// Analyze an uploaded capture and return per-protocol statistics
pub async fn analyze_capture(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let request_id = Uuid::new_v4();
    info!("[{}] Analysis requested by {:?}", request_id, req.peer_addr());

    let staged = match stage_upload(&req, payload, state.config.upload_dir.as_deref()).await {
        Ok(staged) => staged,
        Err(e) => {
            warn!("[{}] Rejected upload: {}", request_id, e);
            return Err(e);
        }
    };

    info!(
        "[{}] Staged {:?} ({} bytes) at {}",
        request_id,
        staged.filename,
        staged.size,
        staged.file.path().display()
    );

    let analyzer = state.analyzer.clone();
    let outcome = web::block(move || {
        let result = analyzer.analyze(staged.file.path());
        let path = staged.file.path().to_path_buf();
        if let Err(e) = staged.file.close() {
            warn!("[{}] Failed to remove {}: {}", request_id, path.display(), e);
        }
        result
    })
    .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            error!("[{}] Analysis worker failed: {}", request_id, e);
            Err(AppError::Unknown)
        }
    };

    match result {
        Ok(analysis) => {
            info!(
                "[{}] Analyzed {} packets across {} protocols ({} lines skipped)",
                request_id,
                analysis.total_packets,
                analysis.protocols.len(),
                analysis.skipped_lines
            );
            Ok(HttpResponse::Ok().json(analysis))
        }
        Err(e) => {
            error!("[{}] Analysis failed: {}", request_id, e);
            Err(e)
        }
    }
}

/// Write the first `pcap` file part to a temp file, draining everything else
async fn stage_upload(
    req: &HttpRequest,
    mut payload: Multipart,
    upload_dir: Option<&Path>,
) -> AppResult<StagedUpload> {
    if !req.content_type().eq_ignore_ascii_case("multipart/form-data") {
        return Err(AppError::MissingFilePart);
    }

    let mut slot = UploadSlot::Missing;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(upload_error)?;

        let (is_capture, filename) = {
            let disposition = field.content_disposition();
            (
                disposition.get_name() == Some(UPLOAD_FIELD),
                disposition.get_filename().map(str::to_owned),
            )
        };

        let vacant = matches!(slot, UploadSlot::Missing);
        match (vacant, is_capture, filename) {
            (true, true, Some(filename)) if filename.is_empty() => {
                drain(&mut field).await?;
                slot = UploadSlot::EmptyFilename;
            }
            (true, true, Some(filename)) => {
                let file = create_staging_file(upload_dir)?;
                let (file, size) = copy_field(&mut field, file).await?;
                slot = UploadSlot::Staged(StagedUpload {
                    file,
                    filename,
                    size,
                });
            }
            _ => drain(&mut field).await?,
        }
    }

    match slot {
        UploadSlot::Staged(staged) => Ok(staged),
        UploadSlot::EmptyFilename => Err(AppError::EmptyFilename),
        UploadSlot::Missing => Err(AppError::MissingFilePart),
    }
}

fn create_staging_file(upload_dir: Option<&Path>) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("sharkstats-").suffix(".pcap");
    match upload_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
}

/// Stream a field into `file`; each chunk is written on the blocking pool
async fn copy_field(
    field: &mut Field,
    mut file: NamedTempFile,
) -> AppResult<(NamedTempFile, u64)> {
    let mut size = 0u64;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(upload_error)?;
        size += chunk.len() as u64;
        file = web::block(move || file.write_all(&chunk).map(|_| file))
            .await
            .map_err(|_| AppError::Unknown)??;
    }
    let file = web::block(move || file.flush().map(|_| file))
        .await
        .map_err(|_| AppError::Unknown)??;
    Ok((file, size))
}

async fn drain(field: &mut Field) -> AppResult<()> {
    let mut skipped = 0usize;
    while let Some(chunk) = field.next().await {
        skipped += chunk.map_err(upload_error)?.len();
    }
    debug!("Ignored multipart field ({} bytes)", skipped);
    Ok(())
}

fn upload_error(err: MultipartError) -> AppError {
    AppError::Upload(err.to_string())
}
