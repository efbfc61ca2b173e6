use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use futures::StreamExt;
use tracing::{info, warn};

use super::{CORS_HEADERS, Relay, RelayResponse, Upstream, UreqUpstream};
use crate::error::Result;

/// Route handler for every path: the relay has a single endpoint.
///
/// The body is read from the raw payload stream so no extractor size limit
/// can answer before the relay does.
pub async fn relay_entry<U: Upstream + 'static>(
    req: HttpRequest,
    mut payload: web::Payload,
    relay: web::Data<Relay<U>>,
) -> HttpResponse {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        match chunk {
            Ok(chunk) => body.extend_from_slice(&chunk),
            Err(e) => {
                warn!(error = %e, "failed to read inbound body");
                return into_http_response(RelayResponse::text(500, format!("Proxy error: {e}")));
            }
        }
    }
    let response = relay.handle(req.method().as_str(), &body).await;
    into_http_response(response)
}

pub fn into_http_response(response: RelayResponse) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);
    for (name, value) in CORS_HEADERS {
        builder.insert_header((*name, *value));
    }
    if let Some(content_type) = response.content_type {
        builder.insert_header((header::CONTENT_TYPE, content_type));
    }
    builder.body(response.body)
}

/// Serve the relay on `bind` until the process is stopped.
pub async fn serve(relay: Relay<UreqUpstream>, bind: &str) -> Result<()> {
    info!(
        bind,
        upstream = %relay.config().upstream_url,
        "relay listening"
    );
    let data = web::Data::new(relay);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .default_service(web::to(relay_entry::<UreqUpstream>))
    })
    .bind(bind)?
    .run()
    .await?;
    Ok(())
}
