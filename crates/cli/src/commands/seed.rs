//! Seed the catalog from a YAML file.
//!
//! The file holds a list of products using the same fields as the
//! `POST /products` body:
//!
//! ```yaml
//! - name: Desk lamp
//!   price: 19.99
//!   quantity: 4
//!   category: Lighting
//!   inventory_status: INSTOCK
//! ```
//!
//! Every product goes through the catalog service, so it is validated and
//! gets a generated code.

use std::path::Path;

use tracing::{error, info};

use cartwheel_server::routes::products::ProductRequest;
use cartwheel_server::services::catalog::CatalogService;

use super::connect;

/// Create every product listed in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database is
/// unreachable, or any product is rejected.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Parse before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let requests: Vec<ProductRequest> = serde_yaml::from_str(&content)?;
    info!(products = requests.len(), "Parsed file");

    let (config, store) = connect().await?;
    let catalog = CatalogService::new(store.as_ref(), &config.catalog, &config.messages);

    let mut created = 0_usize;
    let mut failed = 0_usize;
    for (index, request) in requests.into_iter().enumerate() {
        let name = request.name.clone().unwrap_or_default();
        match catalog.create(request.into()).await {
            Ok(product) => {
                created += 1;
                info!(code = %product.code, name = %product.name, "Product created");
            }
            Err(e) => {
                failed += 1;
                error!(index, name = %name, error = %e, "Product rejected");
            }
        }
    }

    info!(created, failed, "Seeding complete");
    if failed > 0 {
        return Err(format!("{failed} product(s) could not be created").into());
    }
    Ok(())
}
