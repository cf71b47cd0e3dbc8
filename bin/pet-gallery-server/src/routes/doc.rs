use utoipa::OpenApi;

use super::{about, downloads, exports, health, pets, selection};

#[derive(OpenApi)]
#[openapi(info(
    title = "pet-gallery-server",
    description = "Browse, select and bundle-download pet photos"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(about::AboutApi::openapi());
    root.merge(pets::PetsApi::openapi());
    root.merge(selection::SelectionApi::openapi());
    root.merge(exports::ExportsApi::openapi());
    root.merge(downloads::DownloadsApi::openapi());
    root
}
