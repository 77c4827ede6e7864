use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::aggregate;
use crate::config::Config;
use crate::sources::Sources;

pub async fn run(address: std::net::SocketAddr, config: Config) -> anyhow::Result<()> {
    let sources = Sources::new()?;
    let routes = routes(Arc::new(config), sources);

    log::info!("Serving on {}", address);
    warp::serve(routes).run(address).await;
    Ok(())
}

pub fn routes(
    config: Arc<Config>,
    sources: Sources,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health_route = warp::path::end().and(warp::get()).map(health);

    let display_route = warp::path!("display")
        .and(warp::get())
        .and(authorized(config.clone()))
        .and(with_config(config))
        .and(with_sources(sources))
        .and_then(display);

    health_route.or(display_route).recover(rejection)
}

fn with_config(config: Arc<Config>) -> impl Filter<Extract = (Arc<Config>,), Error = Infallible> + Clone {
    warp::any().map(move || config.clone())
}

fn with_sources(sources: Sources) -> impl Filter<Extract = (Sources,), Error = Infallible> + Clone {
    warp::any().map(move || sources.clone())
}

/// Rejects the request unless it carries the configured bearer key.
/// Without a configured key every request passes.
fn authorized(config: Arc<Config>) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_config(config))
        .and_then(|header: Option<String>, config: Arc<Config>| async move {
            match &config.api_key {
                None => Ok(()),
                Some(key) if header.as_deref() == Some(format!("Bearer {}", key).as_str()) => Ok(()),
                Some(_) => Err(warp::reject::custom(Unauthorized)),
            }
        })
        .untuple_one()
}

#[derive(Serialize)]
struct Health {
    success: bool,
}

fn health() -> impl Reply {
    warp::reply::json(&Health { success: true })
}

pub async fn display(config: Arc<Config>, sources: Sources) -> Result<impl Reply, Rejection> {
    let payload = aggregate::snapshot(&sources, &config).await;
    Ok(warp::reply::json(&payload))
}

#[derive(Debug)]
struct Unauthorized;
impl warp::reject::Reject for Unauthorized {}

#[derive(Serialize)]
struct ErrorMessage {
    error: String,
}

pub async fn rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if err.find::<Unauthorized>().is_some() {
        (StatusCode::UNAUTHORIZED, "Unauthorized")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        log::error!("Error: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    let json = warp::reply::json(&ErrorMessage {
        error: message.into(),
    });

    Ok(warp::reply::with_status(json, code))
}
