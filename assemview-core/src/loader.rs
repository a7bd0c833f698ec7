//! Asynchronous mesh loading interface
//!
//! A [`MeshLoader`] receives one [`MeshRequest`] per leaf and, on success,
//! sends a [`MeshCompletion`] back through the [`CompletionSender`] it was
//! handed. Completions are drained on the UI thread by
//! [`ViewerContext::pump`](crate::ViewerContext::pump). A loader that fails
//! simply never sends.

use std::sync::Arc;

use crate::{NodeId, TriangleMesh};

/// A leaf's request for its geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshRequest {
    pub node: NodeId,
    /// Mesh reference as written in the assembly
    pub reference: String,
}

/// A successfully loaded mesh for a leaf
#[derive(Debug, Clone)]
pub struct MeshCompletion {
    pub node: NodeId,
    pub mesh: Arc<TriangleMesh>,
}

/// Sending half of the completion channel
#[derive(Debug, Clone)]
pub struct CompletionSender(flume::Sender<MeshCompletion>);

impl CompletionSender {
    /// Deliver a loaded mesh. Returns `false` once the receiving context has
    /// been torn down.
    pub fn complete(&self, node: NodeId, mesh: TriangleMesh) -> bool {
        let delivered = self
            .0
            .send(MeshCompletion {
                node,
                mesh: Arc::new(mesh),
            })
            .is_ok();
        if !delivered {
            log::debug!("Discarding mesh for {}: viewer context is gone", node);
        }
        delivered
    }
}

/// Create a completion channel
pub fn completion_channel() -> (CompletionSender, flume::Receiver<MeshCompletion>) {
    let (sender, receiver) = flume::unbounded();
    (CompletionSender(sender), receiver)
}

/// Source of leaf geometry
pub trait MeshLoader: Send {
    /// Start loading `request`. Must not block on the load itself.
    fn load(&self, request: MeshRequest, completions: CompletionSender);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_reaches_receiver() {
        let (sender, receiver) = completion_channel();
        assert!(sender.complete(NodeId(3), TriangleMesh::new()));

        let completion = receiver.try_recv().unwrap();
        assert_eq!(completion.node, NodeId(3));
        assert!(completion.mesh.is_empty());
    }

    #[test]
    fn test_completion_after_receiver_dropped() {
        let (sender, receiver) = completion_channel();
        drop(receiver);
        assert!(!sender.complete(NodeId(1), TriangleMesh::new()));
    }
}
