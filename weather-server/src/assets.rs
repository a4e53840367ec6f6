//! Static frontend bundle with single-page-application fallback.

use std::path::{Path, PathBuf};

use actix_files::{Files, NamedFile};
use actix_web::{
    dev::{ServiceRequest, ServiceResponse, fn_service},
    http::StatusCode,
};
use tracing::debug;

use crate::server::envelope;

pub const INDEX_DOCUMENT: &str = "index.html";

/// Fail early on a bundle path that is not a directory.
pub fn check_root(root: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(
        root.is_dir(),
        "Static directory does not exist or is not a directory: {}",
        root.display()
    );
    Ok(())
}

/// Serve files under `root`; any path without a file gets the index document.
pub fn spa_files(root: &Path) -> Files {
    let index: PathBuf = root.join(INDEX_DOCUMENT);

    Files::new("/", root)
        .index_file(INDEX_DOCUMENT)
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                let res = match NamedFile::open_async(&index).await {
                    Ok(file) => file.into_response(&req),
                    Err(err) => {
                        debug!(error = %err, path = %index.display(), "index document missing");
                        envelope(StatusCode::NOT_FOUND, "Not found")
                    }
                };
                Ok::<_, actix_web::Error>(ServiceResponse::new(req, res))
            }
        }))
}
