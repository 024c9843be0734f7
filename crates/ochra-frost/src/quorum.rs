//! Quorum membership management.
//!
//! Manages the selection and rotation of quorum members for FROST
//! threshold signing ceremonies. Quorums are selected from eligible
//! nodes based on PoSrv scores, and churn is limited per epoch to
//! maintain key continuity.

use serde::{Deserialize, Serialize};

use crate::{FrostCoordError, Result};

/// Configuration for a quorum.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// Signing threshold (t in t-of-n).
    pub threshold: u16,
    /// Current quorum member node IDs.
    pub members: Vec<[u8; 32]>,
    /// Maximum number of members that can change per epoch.
    pub max_churn_per_epoch: usize,
}

impl QuorumConfig {
    /// Create a new quorum configuration.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Minimum signers required.
    /// * `members` - Initial quorum member node IDs.
    /// * `max_churn_per_epoch` - Maximum membership changes per epoch.
    pub fn new(threshold: u16, members: Vec<[u8; 32]>, max_churn_per_epoch: usize) -> Result<Self> {
        if threshold == 0 || threshold as usize > members.len() {
            return Err(FrostCoordError::Quorum(format!(
                "invalid threshold {threshold} for {} members",
                members.len()
            )));
        }
        if members.is_empty() {
            return Err(FrostCoordError::Quorum(
                "quorum must have at least one member".to_string(),
            ));
        }

        Ok(Self {
            threshold,
            members,
            max_churn_per_epoch,
        })
    }

    /// Get the number of quorum members.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Check if a node is a quorum member.
    pub fn is_member(&self, node_id: &[u8; 32]) -> bool {
        self.members.iter().any(|m| m == node_id)
    }
}

/// An eligible node with its PoSrv score for quorum selection.
#[derive(Clone, Debug)]
pub struct EligibleNode {
    /// The node's identifier.
    pub node_id: [u8; 32],
    /// The node's PoSrv composite score.
    pub posrv_score: f64,
}

/// Select a quorum from eligible nodes.
///
/// Selects the top `required_size` nodes by PoSrv score. Nodes are
/// sorted by score in descending order, and ties are broken by node ID
/// (lexicographic order, ascending).
///
/// # Arguments
///
/// * `eligible_nodes` - All nodes eligible for quorum participation.
/// * `required_size` - The desired quorum size.
///
/// # Returns
///
/// A vector of the selected node IDs.
pub fn select_quorum(
    eligible_nodes: &[EligibleNode],
    required_size: usize,
) -> Result<Vec<[u8; 32]>> {
    if eligible_nodes.len() < required_size {
        return Err(FrostCoordError::InsufficientSigners {
            required: required_size,
            available: eligible_nodes.len(),
        });
    }

    let mut sorted: Vec<&EligibleNode> = eligible_nodes.iter().collect();
    sorted.sort_by(|a, b| {
        b.posrv_score
            .partial_cmp(&a.posrv_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.node_id.cmp(&b.node_id))
    });

    let selected: Vec<[u8; 32]> = sorted
        .iter()
        .take(required_size)
        .map(|n| n.node_id)
        .collect();

    tracing::debug!(
        selected = selected.len(),
        eligible = eligible_nodes.len(),
        "selected quorum members"
    );

    Ok(selected)
}

/// Check if a proposed quorum rotation is valid.
///
/// A rotation is valid if the number of membership changes (additions +
/// removals) does not exceed `max_churn_per_epoch`.
///
/// # Arguments
///
/// * `current` - The current quorum configuration.
/// * `proposed` - The proposed new member list.
///
/// # Returns
///
/// `true` if the rotation is within the churn limit, `false` otherwise.
pub fn can_rotate(current: &QuorumConfig, proposed: &[[u8; 32]]) -> bool {
    let current_set: std::collections::HashSet<[u8; 32]> =
        current.members.iter().copied().collect();
    let proposed_set: std::collections::HashSet<[u8; 32]> = proposed.iter().copied().collect();

    let added = proposed_set.difference(&current_set).count();
    let removed = current_set.difference(&proposed_set).count();
    let total_churn = added + removed;

    total_churn <= current.max_churn_per_epoch
}

/// Compute the churn between current and proposed quorums.
///
/// # Returns
///
/// A tuple of `(added_count, removed_count)`.
pub fn compute_churn(current: &QuorumConfig, proposed: &[[u8; 32]]) -> (usize, usize) {
    let current_set: std::collections::HashSet<[u8; 32]> =
        current.members.iter().copied().collect();
    let proposed_set: std::collections::HashSet<[u8; 32]> = proposed.iter().copied().collect();

    let added = proposed_set.difference(&current_set).count();
    let removed = current_set.difference(&proposed_set).count();

    (added, removed)
}
