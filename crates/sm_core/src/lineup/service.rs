//! Asynchronous lineup-request boundary.
//!
//! The full-catalog search is the one CPU-heavy operation in the core, so the
//! clock never runs it inline: callers fire a batch of requests (one per
//! team) across a channel and collect the responses later. Batches resolve in
//! parallel; response order always matches request order.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::assigner::{self, Lineup};
use crate::models::Player;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineupRequestKind {
    /// Search the whole catalog for the best formation.
    New,
    /// Refill the team's current formation; falls back to `New` when no
    /// current formation exists.
    Update,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupRequest {
    pub kind: LineupRequestKind,
    pub team: String,
    pub players: Vec<Player>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current_formation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupResponse {
    pub team: String,
    pub lineup: Lineup,
}

/// Resolve one batch synchronously. Exposed for hosts that bring their own
/// scheduling; the channel service below wraps it in a worker thread.
pub fn resolve_batch(batch: Vec<LineupRequest>) -> Vec<LineupResponse> {
    batch.into_par_iter().map(resolve_one).collect()
}

fn resolve_one(request: LineupRequest) -> LineupResponse {
    let current = match request.kind {
        LineupRequestKind::Update => {
            request.current_formation.as_deref().and_then(super::formation)
        }
        LineupRequestKind::New => None,
    };
    let lineup = match current {
        Some(formation) => assigner::fill_known(formation, &request.players),
        None => assigner::best_formation(&request.players),
    };
    LineupResponse { team: request.team, lineup }
}

/// Channel-backed worker owning the request/response boundary.
pub struct LineupService {
    requests: Option<Sender<Vec<LineupRequest>>>,
    responses: Receiver<Vec<LineupResponse>>,
    worker: Option<JoinHandle<()>>,
}

impl LineupService {
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = channel::<Vec<LineupRequest>>();
        let (response_tx, response_rx) = channel();
        let worker = thread::spawn(move || {
            while let Ok(batch) = request_rx.recv() {
                if response_tx.send(resolve_batch(batch)).is_err() {
                    break;
                }
            }
        });
        LineupService {
            requests: Some(request_tx),
            responses: response_rx,
            worker: Some(worker),
        }
    }

    /// Queue a batch. Empty batches are allowed and resolve to empty
    /// responses.
    pub fn submit(&self, batch: Vec<LineupRequest>) {
        if let Some(tx) = &self.requests {
            // A send failure means the worker is gone; the caller observes
            // that as a missing response.
            let _ = tx.send(batch);
        }
    }

    /// Block until the next resolved batch, `None` once the worker is gone.
    pub fn recv(&self) -> Option<Vec<LineupResponse>> {
        self.responses.recv().ok()
    }

    /// Non-blocking poll for a resolved batch.
    pub fn try_recv(&self) -> Option<Vec<LineupResponse>> {
        self.responses.try_recv().ok()
    }
}

impl Drop for LineupService {
    fn drop(&mut self) {
        // Closing the request channel lets the worker drain and exit.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contract, Position};

    fn pool() -> Vec<Player> {
        use Position::*;
        let layout = [GK, LB, CB, CB, RB, CDM, CM, CM, LW, ST, RW, CM, ST];
        layout
            .iter()
            .enumerate()
            .map(|(i, &pos)| Player {
                id: i as u32 + 1,
                name: format!("Player {i}"),
                position: pos,
                score: 45.0 + i as f32 * 1.5,
                age: 24,
                contract: Contract { salary: 150_000, seasons_left: 2 },
            })
            .collect()
    }

    #[test]
    fn batch_preserves_team_correspondence() {
        let batch: Vec<LineupRequest> = (0..6)
            .map(|i| LineupRequest {
                kind: LineupRequestKind::New,
                team: format!("Team {i}"),
                players: pool(),
                current_formation: None,
            })
            .collect();
        let responses = resolve_batch(batch);
        assert_eq!(responses.len(), 6);
        for (i, response) in responses.iter().enumerate() {
            assert_eq!(response.team, format!("Team {i}"));
        }
    }

    #[test]
    fn update_refills_the_current_formation() {
        let request = LineupRequest {
            kind: LineupRequestKind::Update,
            team: "Keepers".to_string(),
            players: pool(),
            current_formation: Some("5-3-2".to_string()),
        };
        let response = resolve_batch(vec![request]).remove(0);
        assert_eq!(response.lineup.formation_key, "5-3-2");
    }

    #[test]
    fn update_without_current_formation_falls_back_to_search() {
        for current in [None, Some("0-0-0".to_string())] {
            let request = LineupRequest {
                kind: LineupRequestKind::Update,
                team: "Drifters".to_string(),
                players: pool(),
                current_formation: current,
            };
            let response = resolve_batch(vec![request]).remove(0);
            assert!(super::super::formation(&response.lineup.formation_key).is_some());
        }
    }

    #[test]
    fn service_round_trips_batches_in_order() {
        let service = LineupService::spawn();
        service.submit(vec![LineupRequest {
            kind: LineupRequestKind::New,
            team: "Alpha".to_string(),
            players: pool(),
            current_formation: None,
        }]);
        service.submit(Vec::new());

        let first = service.recv().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].team, "Alpha");
        let second = service.recv().unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn request_wire_shape_round_trips() {
        let request = LineupRequest {
            kind: LineupRequestKind::Update,
            team: "Wire".to_string(),
            players: pool(),
            current_formation: Some("4-4-2".to_string()),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"update\""));
        let back: LineupRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.team, "Wire");
        assert_eq!(back.kind, LineupRequestKind::Update);
    }
}
