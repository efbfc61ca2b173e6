#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};

/// One request as seen by the fake upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct FakeState {
    status: u16,
    body: String,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

/// An HTTP server on an ephemeral port that answers every request with a
/// fixed status and body and records what it received. Runs on its own
/// thread so tests may block while it serves.
pub struct FakeUpstream {
    pub addr: SocketAddr,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeUpstream {
    pub fn start(status: u16, body: &str) -> Self {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let state = web::Data::new(FakeState {
            status,
            body: body.to_string(),
            recorded: recorded.clone(),
        });

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            actix_web::rt::System::new().block_on(async move {
                let server = HttpServer::new(move || {
                    App::new()
                        .app_data(state.clone())
                        .default_service(web::to(respond))
                })
                .workers(1)
                .bind(("127.0.0.1", 0))
                .unwrap();
                tx.send(server.addrs()[0]).unwrap();
                server.run().await
            })
        });

        let addr = rx.recv().unwrap();
        Self { addr, recorded }
    }

    pub fn url(&self) -> String {
        format!("http://{}/v1/chat/completions", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }
}

async fn respond(req: HttpRequest, body: web::Bytes, state: web::Data<FakeState>) -> HttpResponse {
    state.recorded.lock().unwrap().push(Recorded {
        method: req.method().to_string(),
        headers: req
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect(),
        body: String::from_utf8_lossy(&body).to_string(),
    });
    let status = actix_web::http::StatusCode::from_u16(state.status).unwrap();
    HttpResponse::build(status)
        .content_type("application/json")
        .body(state.body.clone())
}

/// Chat-completion body whose message content is `content`.
pub fn chat_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}
