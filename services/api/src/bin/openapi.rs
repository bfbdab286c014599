//! services/api/src/bin/openapi.rs
//!
//! Writes the Globe Explorer OpenAPI document for client generators.
//! Usage: `openapi [OUTPUT]`, where OUTPUT defaults to `openapi.json`.

use std::path::PathBuf;

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let doc = ApiDoc::openapi();
    std::fs::write(&output, doc.to_pretty_json()?)?;

    println!(
        "Wrote {} v{} ({} paths) to {}",
        doc.info.title,
        doc.info.version,
        doc.paths.paths.len(),
        output.display()
    );
    Ok(())
}
