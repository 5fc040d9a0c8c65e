use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Result, Context};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use log::info;
use serde::Serialize;

use crate::config::Config;

/// Read-only status report over the current configuration.
#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    timestamp: String,
    timezone: String,
    mode: String,
    gmail_query: String,
    poll_interval: u64,
}

fn health_response(config: &Config) -> Response<Body> {
    let report = HealthReport {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        timezone: config.timezone.to_string(),
        mode: config.mode.as_str().to_string(),
        gmail_query: config.gmail_query.clone(),
        poll_interval: config.poll_interval_seconds,
    };

    let body = serde_json::to_string(&report)
        .unwrap_or_else(|_| "{\"status\":\"healthy\"}".to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

async fn handle(req: Request<Body>, config: Arc<Config>) -> Result<Response<Body>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/health") => health_response(&config),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Not Found"))
            .unwrap_or_else(|_| Response::new(Body::empty())),
    };

    Ok(response)
}

/// Serve GET /health until the process exits. Shares nothing mutable with
/// the poll loop; the config it reports is read-only.
pub async fn run_health_server(config: Config) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let config = Arc::new(config);

    let make_service = make_service_fn(move |_conn| {
        let config = Arc::clone(&config);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                handle(req, Arc::clone(&config))
            }))
        }
    });

    info!("🩺 Health endpoint listening on http://{}/health", addr);

    Server::bind(&addr)
        .serve(make_service)
        .await
        .context("Health server failed")?;

    Ok(())
}
