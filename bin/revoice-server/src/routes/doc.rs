use utoipa::OpenApi;

use crate::routes::health;
use crate::routes::v1;

#[derive(OpenApi)]
#[openapi(info(
    title = "revoice-server",
    description = "Asynchronous voice conversion API",
    version = "0.1.0",
    contact(name = "revoice", url = "https://github.com/revoice-dev/revoice")
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(v1::api_docs());
    root.merge(health::HealthApi::openapi());
    root
}
