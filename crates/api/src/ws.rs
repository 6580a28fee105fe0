use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::state::{AppState, LabEvent};

/// `?experiment_id=N` narrows the stream to one experiment.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    experiment_id: Option<u64>,
}

impl EventFilter {
    fn admits(&self, event: &LabEvent) -> bool {
        match (self.experiment_id, event.experiment_id()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }
}

pub async fn events_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Response {
    ws.on_upgrade(move |socket| stream_events(socket, state, filter))
}

async fn stream_events(mut socket: WebSocket, state: AppState, filter: EventFilter) {
    // Subscribe first so nothing published after the greeting is missed.
    let mut events = state.subscribe_events();
    let connected = LabEvent::Connected {
        experiment_id: filter.experiment_id,
    };
    if send_event(&mut socket, &connected).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                    Some(Ok(_)) => {}
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) if filter.admits(&event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            return;
                        }
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return,
                }
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &LabEvent) -> Result<(), ()> {
    let payload = serde_json::to_string(event).map_err(|_| ())?;
    socket.send(Message::Text(payload)).await.map_err(|_| ())
}
