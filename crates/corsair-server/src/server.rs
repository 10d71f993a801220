//! HTTP shell over the in-memory engine.
//!
//! The snapshot is loaded once on a blocking task at startup; after that
//! every request is a lock-free read against the immutable store (the only
//! mutable state is the tally counter and the sampler's RNG). Routing is a
//! single match over path segments; status codes are the whole error
//! policy: 404 for unknown ids and routes, 400 for malformed input, 200
//! otherwise.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use bytes::Bytes;
use clap::Args;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use url::form_urlencoded;

use corsair_graph::{
    Aggregator, GraphError, GraphStore, Label, PathFinder, QueryEngine, Sampler, SearchIndex,
    Snapshot, TallyCounter,
};

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,

    /// Snapshot JSON file (defaults to $CORSAIR_SNAPSHOT).
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Fix the sampler seed for reproducible picks.
    #[arg(long)]
    pub seed: Option<u64>,
}

struct ServerState {
    engine: QueryEngine,
    sampler: Sampler,
    tally: TallyCounter,
}

pub fn cmd_serve(args: &ServeArgs) -> Result<()> {
    let path = resolve_snapshot_path(args.snapshot.clone())?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;
    rt.block_on(serve_async(args.clone(), path))
}

pub fn resolve_snapshot_path(arg: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path);
    }
    match std::env::var("CORSAIR_SNAPSHOT") {
        Ok(v) if !v.trim().is_empty() => Ok(PathBuf::from(v)),
        _ => Err(anyhow!("pass --snapshot <file.json> or set CORSAIR_SNAPSHOT")),
    }
}

async fn serve_async(args: ServeArgs, path: PathBuf) -> Result<()> {
    let store = tokio::task::spawn_blocking(move || -> Result<GraphStore, GraphError> {
        let snapshot = Snapshot::from_json_file(&path)?;
        GraphStore::from_snapshot(snapshot)
    })
    .await
    .map_err(|e| anyhow!("serve: failed to join loader task: {e}"))??;

    let engine = QueryEngine::new(Arc::new(store));
    tracing::info!(
        nodes = engine.node_count(),
        edges = engine.edge_count(),
        "snapshot loaded"
    );

    let sampler = match args.seed {
        Some(seed) => Sampler::with_seed(engine.clone(), seed),
        None => Sampler::new(engine.clone()),
    };
    let state = Arc::new(ServerState {
        engine,
        sampler,
        tally: TallyCounter::new(),
    });

    let listener = TcpListener::bind(args.listen)
        .await
        .map_err(|e| anyhow!("serve: failed to bind {}: {e}", args.listen))?;
    tracing::info!(addr = %args.listen, "listening");

    loop {
        let (stream, _peer) = listener
            .accept()
            .await
            .map_err(|e| anyhow!("serve: accept failed: {e}"))?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!("connection error: {e}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let movie = query_param(query.as_deref(), "movie_id");

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let engine = &state.engine;

    let resp = match (&method, segments.as_slice()) {
        (&Method::GET, ["api", "health"]) => json_response(
            StatusCode::OK,
            &serde_json::json!({
                "status": "connected",
                "nodes": engine.node_count(),
                "edges": engine.edge_count(),
            }),
        ),
        (&Method::GET, ["api", "characters"]) => {
            json_response(StatusCode::OK, &engine.characters())
        }
        (&Method::GET, ["api", "characters", "relationships"]) => {
            json_response(StatusCode::OK, &engine.relationships(None))
        }
        (&Method::GET, ["api", "relationships", movie_id]) => {
            json_response(StatusCode::OK, &engine.relationships(Some(*movie_id)))
        }
        (&Method::GET, ["api", "character", id, "connections"]) => {
            match engine.character_connections(id) {
                Ok(rows) => json_response(StatusCode::OK, &rows),
                Err(e) => graph_error_response(&e),
            }
        }
        (&Method::GET, ["api", "character", id, "movies"]) => match engine.character_movies(id) {
            Ok(rows) => json_response(StatusCode::OK, &rows),
            Err(e) => graph_error_response(&e),
        },
        (&Method::GET, ["api", "ships", "routes"]) => {
            json_response(StatusCode::OK, &engine.ship_routes(movie.as_deref()))
        }
        (&Method::GET, ["api", "rivalries"]) => {
            json_response(StatusCode::OK, &engine.rivalries(movie.as_deref()))
        }
        (&Method::GET, ["api", "graph", "full"]) => {
            json_response(StatusCode::OK, &engine.full_graph())
        }
        (&Method::GET, ["api", "search"]) => {
            let q = query_param(query.as_deref(), "q").unwrap_or_default();
            json_response(StatusCode::OK, &SearchIndex::new(engine).search(&q))
        }
        (&Method::GET, ["api", "movies"]) => json_response(StatusCode::OK, &engine.movies()),
        (&Method::GET, ["api", "factions"]) => {
            json_response(StatusCode::OK, &engine.faction_breakdown(movie.as_deref()))
        }
        (&Method::GET, ["api", "path", from, to]) => {
            json_response(StatusCode::OK, &PathFinder::new(engine).shortest_path(from, to))
        }
        (&Method::GET, ["api", "leaderboard"]) => {
            json_response(StatusCode::OK, &Aggregator::new(engine).leaderboard())
        }
        (&Method::GET, ["api", "sample", label]) => match Label::parse(label) {
            Some(label) => match state.sampler.pick(label) {
                Ok(node) => json_response(StatusCode::OK, &node),
                Err(e) => graph_error_response(&e),
            },
            None => json_error(
                StatusCode::BAD_REQUEST,
                &format!("unknown label `{label}` (expected character|ship|location|movie)"),
            ),
        },
        (&Method::GET, ["api", "tally"]) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "count": state.tally.read() }),
        ),
        (&Method::POST, ["api", "tally"]) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "count": state.tally.increment() }),
        ),
        _ => json_error(StatusCode::NOT_FOUND, "not found"),
    };

    Ok(resp)
}

fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    let query = query?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{\"error\":\"serialize\"}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header("access-control-allow-origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{\"error\":\"internal\"}"))))
}

fn json_error(status: StatusCode, msg: &str) -> Response<Full<Bytes>> {
    let v = serde_json::json!({ "error": msg });
    json_response(status, &v)
}

/// Map the core taxonomy onto status codes: unknown ids and empty sample
/// pools are 404s, everything else is a 500.
fn graph_error_response(e: &GraphError) -> Response<Full<Bytes>> {
    let status = match e {
        GraphError::NotFound { .. } | GraphError::EmptyCollection { .. } => StatusCode::NOT_FOUND,
        GraphError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        GraphError::StoreUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, &e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_extracts_and_decodes() {
        assert_eq!(
            query_param(Some("movie_id=m1&q=black%20pearl"), "q").as_deref(),
            Some("black pearl")
        );
        assert_eq!(
            query_param(Some("movie_id=m1"), "movie_id").as_deref(),
            Some("m1")
        );
        assert_eq!(query_param(Some("movie_id="), "movie_id"), None);
        assert_eq!(query_param(None, "movie_id"), None);
    }

    #[test]
    fn explicit_snapshot_path_wins_over_env() {
        let explicit = resolve_snapshot_path(Some(PathBuf::from("x.json"))).unwrap();
        assert_eq!(explicit, PathBuf::from("x.json"));
    }
}
