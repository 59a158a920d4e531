//! services/api/src/bin/openapi.rs
//!
//! Dumps the course-summary API's OpenAPI 3.0 document to `openapi.json`,
//! for clients that want the contract without running the server.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = "openapi.json";
    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!("Wrote the OpenAPI document to {}", path);
    Ok(())
}
