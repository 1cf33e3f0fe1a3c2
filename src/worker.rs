//! Dedicated route worker.
//!
//! One owner task holds the graph and POI set; callers talk to it over
//! channels. Requests are answered strictly in order, one at a time, so a
//! route calculation never observes a half-initialized graph and a second
//! request queues behind the first. Clone the request sender to fan
//! several producers into the same worker.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::geo::Coord;
use crate::graph::{GraphStore, RawEdge, RawNode};
use crate::postprocess::{assemble_reply, Poi, RouteReply};
use crate::search::{find_path, SearchRequest};

/// Requests accepted by the worker.
#[derive(Debug)]
pub enum WorkerRequest {
    /// Build (or replace) the worker's graph; answered with
    /// [`WorkerEvent::Ready`] or [`WorkerEvent::InitFailed`].
    InitGraph {
        nodes: Vec<RawNode>,
        edges: Vec<RawEdge>,
        pois: Vec<Poi>,
    },
    /// Compute one route; answered with [`WorkerEvent::RouteResult`].
    CalcRoute(RouteJob),
}

/// One route calculation.
#[derive(Debug, Clone)]
pub struct RouteJob {
    pub request: SearchRequest,
    /// Off-road origin to prepend to the raw path, typically the caller's
    /// position projected onto the road it snapped from.
    pub prepend_start: Option<Coord>,
}

/// Events emitted by the worker, one per request, in request order.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Graph accepted; route requests will be answered.
    Ready { nodes: usize, edges: usize },
    /// Graph rejected; the worker keeps serving its previous graph, if any.
    InitFailed { reason: String },
    /// Answer to one [`WorkerRequest::CalcRoute`]; `None` when no route
    /// exists or no graph has been initialized yet.
    RouteResult(Option<RouteReply>),
}

struct WorkerState {
    graph: GraphStore,
    pois: Vec<Poi>,
}

/// Spawns the worker onto the current runtime and returns its endpoints.
///
/// The worker runs until every request sender is dropped or the event
/// receiver goes away.
pub fn spawn(capacity: usize) -> (mpsc::Sender<WorkerRequest>, mpsc::Receiver<WorkerEvent>) {
    let (request_tx, mut request_rx) = mpsc::channel(capacity);
    let (event_tx, event_rx) = mpsc::channel(capacity);

    tokio::spawn(async move {
        let mut state: Option<WorkerState> = None;
        while let Some(request) = request_rx.recv().await {
            let event = handle(&mut state, request);
            if event_tx.send(event).await.is_err() {
                break;
            }
        }
    });

    (request_tx, event_rx)
}

fn handle(state: &mut Option<WorkerState>, request: WorkerRequest) -> WorkerEvent {
    match request {
        WorkerRequest::InitGraph { nodes, edges, pois } => {
            match GraphStore::build(&nodes, &edges) {
                Ok(graph) => {
                    let (nodes, edges) = (graph.node_count(), graph.edge_count());
                    info!(nodes, edges, "route worker ready");
                    *state = Some(WorkerState { graph, pois });
                    WorkerEvent::Ready { nodes, edges }
                }
                Err(err) => {
                    warn!(%err, "route worker rejected graph");
                    WorkerEvent::InitFailed {
                        reason: err.to_string(),
                    }
                }
            }
        }
        WorkerRequest::CalcRoute(job) => {
            let Some(state) = state.as_ref() else {
                warn!("route requested before any graph was initialized");
                return WorkerEvent::RouteResult(None);
            };
            let reply = find_path(&state.graph, &job.request)
                .map(|found| assemble_reply(found, job.prepend_start, &state.pois));
            WorkerEvent::RouteResult(reply)
        }
    }
}
