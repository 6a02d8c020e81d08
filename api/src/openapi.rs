pub mod common;
pub mod partners;
pub mod system;

pub use partners::PartnersApi;
pub use system::SystemApi;

use poem_openapi::OpenApi;

/// Combines all API modules into a single OpenAPI specification
pub fn create_combined_api() -> impl OpenApi {
    (SystemApi, PartnersApi)
}
