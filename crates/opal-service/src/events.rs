//! Node membership events from the central scheduler.
//!
//! The scheduler publishes node add/update/remove events on a bounded
//! channel; [`run_node_events`] drains it on its own task and applies
//! each event to the service, independently of AM call traffic.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use opal_core::{NodeId, NodeRecord};

use crate::service::AmService;

/// A change in the scheduler's node set.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    Added(NodeRecord),
    Updated(NodeRecord),
    Removed(NodeId),
}

impl NodeEvent {
    pub fn node_id(&self) -> &NodeId {
        match self {
            NodeEvent::Added(node) | NodeEvent::Updated(node) => &node.node_id,
            NodeEvent::Removed(node_id) => node_id,
        }
    }
}

pub type NodeEventSender = mpsc::Sender<NodeEvent>;
pub type NodeEventReceiver = mpsc::Receiver<NodeEvent>;

/// Create the bounded channel between scheduler and service.
pub fn node_event_channel(capacity: usize) -> (NodeEventSender, NodeEventReceiver) {
    mpsc::channel(capacity)
}

/// Apply node events until every sender is dropped or shutdown is signalled.
pub async fn run_node_events(
    service: Arc<AmService>,
    mut events: NodeEventReceiver,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("node event loop started");
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => service.handle(event),
                    None => {
                        debug!("node event channel closed");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => break,
        }
    }
    info!(applied = service.registry().events_applied(), "node event loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::Resource;

    fn node(host: &str) -> NodeRecord {
        NodeRecord::new(NodeId::new(host, 1234), format!("{host}:8042"), Resource::new(4096, 8))
    }

    #[test]
    fn every_event_names_its_node() {
        let id = NodeId::new("h1", 1234);
        assert_eq!(NodeEvent::Added(node("h1")).node_id(), &id);
        assert_eq!(NodeEvent::Updated(node("h1")).node_id(), &id);
        assert_eq!(NodeEvent::Removed(id.clone()).node_id(), &id);
    }

    #[tokio::test]
    async fn channel_delivers_events_in_order() {
        let (tx, mut rx) = node_event_channel(4);
        tx.send(NodeEvent::Added(node("h1"))).await.unwrap();
        tx.send(NodeEvent::Removed(NodeId::new("h1", 1234))).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(NodeEvent::Added(node("h1"))));
        assert_eq!(rx.recv().await, Some(NodeEvent::Removed(NodeId::new("h1", 1234))));
        assert_eq!(rx.recv().await, None);
    }
}
