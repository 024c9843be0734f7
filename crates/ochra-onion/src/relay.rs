//! Relay selection with PoSrv-weighted random sampling.
//!
//! Selects relays for Sphinx circuit construction, applying constraints to
//! ensure diversity and resist correlation attacks:
//!
//! ## Selection Constraints
//!
//! - No two relays in the same `/24` subnet
//! - No relay sharing an AS number with the source or destination
//! - Geographic diversity (prefer relays in different country codes)
//!
//! ## PoSrv Weighting
//!
//! Relays are selected with probability proportional to their PoSrv score,
//! which reflects their Proof of Service and Routing contribution to the
//! network.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ochra_types::network::RelayDescriptor;
use tracing::debug;

use crate::{OnionError, Result, CIRCUIT_HOPS};

/// Selects relays for circuit construction with constraint enforcement.
pub struct RelaySelector {
    /// Constraints to apply during selection.
    constraints: SelectionConstraints,
}

/// Constraints applied during relay selection.
#[derive(Clone, Debug, Default)]
pub struct SelectionConstraints {
    /// AS numbers to exclude (e.g., source and destination AS).
    pub excluded_as_numbers: HashSet<u32>,
    /// When true, try to pick relays from different countries.
    pub preferred_diversity: bool,
}

/// Cached relay descriptors for selection.
pub struct RelayCache {
    /// All known relay descriptors.
    relays: Vec<RelayDescriptor>,
}

impl RelayCache {
    /// Create a new empty relay cache.
    pub fn new() -> Self {
        Self { relays: Vec::new() }
    }

    /// Create a relay cache from a list of descriptors.
    pub fn from_descriptors(relays: Vec<RelayDescriptor>) -> Self {
        Self { relays }
    }

    /// Add a relay descriptor to the cache.
    pub fn add(&mut self, relay: RelayDescriptor) {
        // Replace if same node_id already exists.
        if let Some(existing) = self.relays.iter_mut().find(|r| r.node_id == relay.node_id) {
            *existing = relay;
        } else {
            self.relays.push(relay);
        }
    }

    /// Remove a relay by node ID.
    pub fn remove(&mut self, node_id: &[u8; 32]) {
        self.relays.retain(|r| &r.node_id != node_id);
    }

    /// Return all cached relay descriptors.
    pub fn all(&self) -> &[RelayDescriptor] {
        &self.relays
    }

    /// Return the number of cached relays.
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    /// Return whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Filter relays by minimum PoSrv score.
    pub fn filter_by_min_score(&self, min_score: f32) -> Vec<&RelayDescriptor> {
        self.relays
            .iter()
            .filter(|r| r.posrv_score >= min_score)
            .collect()
    }
}

impl Default for RelayCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RelaySelector {
    /// Create a new relay selector with default constraints.
    pub fn new() -> Self {
        Self {
            constraints: SelectionConstraints::default(),
        }
    }

    /// Create a new relay selector with custom constraints.
    pub fn with_constraints(constraints: SelectionConstraints) -> Self {
        Self { constraints }
    }

    /// Select `CIRCUIT_HOPS` (3) relays from the cache for circuit construction.
    ///
    /// Uses PoSrv-weighted random sampling with constraint enforcement.
    /// Returns an ordered list: `[entry, middle, exit]`.
    pub fn select_relays(&self, cache: &RelayCache) -> Result<Vec<RelayDescriptor>> {
        let available = cache.all();

        if available.len() < CIRCUIT_HOPS {
            return Err(OnionError::InsufficientRelays {
                need: CIRCUIT_HOPS,
                have: available.len(),
            });
        }

        // Filter out relays in excluded AS numbers.
        let mut candidates: Vec<&RelayDescriptor> = available
            .iter()
            .filter(|r| !self.constraints.excluded_as_numbers.contains(&r.as_number))
            .collect();

        if candidates.len() < CIRCUIT_HOPS {
            return Err(OnionError::InsufficientRelays {
                need: CIRCUIT_HOPS,
                have: candidates.len(),
            });
        }

        let mut selected: Vec<RelayDescriptor> = Vec::with_capacity(CIRCUIT_HOPS);
        let mut used_subnets: HashSet<[u8; 3]> = HashSet::new();
        let mut used_as: HashSet<u32> = HashSet::new();
        let mut used_countries: HashSet<[u8; 2]> = HashSet::new();

        for hop_idx in 0..CIRCUIT_HOPS {
            // Filter candidates for this hop.
            let eligible: Vec<&&RelayDescriptor> = candidates
                .iter()
                .filter(|r| {
                    // Subnet constraint: no two relays in same /24.
                    let subnet = extract_subnet_24(&r.ip_addr);
                    if let Some(s) = subnet {
                        if used_subnets.contains(&s) {
                            return false;
                        }
                    }

                    // AS constraint: no shared AS with already-selected relays.
                    if used_as.contains(&r.as_number) {
                        return false;
                    }

                    // Geographic diversity: prefer different countries (soft).
                    if self.constraints.preferred_diversity
                        && used_countries.contains(&r.country_code)
                        && candidates.len() > CIRCUIT_HOPS
                    {
                        return false;
                    }

                    true
                })
                .collect();

            if eligible.is_empty() {
                // Fall back: drop geographic diversity constraint.
                let fallback: Vec<&&RelayDescriptor> = candidates
                    .iter()
                    .filter(|r| {
                        let subnet = extract_subnet_24(&r.ip_addr);
                        if let Some(s) = subnet {
                            if used_subnets.contains(&s) {
                                return false;
                            }
                        }
                        if used_as.contains(&r.as_number) {
                            return false;
                        }
                        true
                    })
                    .collect();

                if fallback.is_empty() {
                    return Err(OnionError::ConstraintViolation(format!(
                        "cannot select relay for hop {} with subnet/AS constraints",
                        hop_idx
                    )));
                }

                let chosen = weighted_select(&fallback)?;
                record_selection(chosen, &mut used_subnets, &mut used_as, &mut used_countries);
                selected.push(chosen.clone());
                let chosen_id = chosen.node_id;
                candidates.retain(|r| r.node_id != chosen_id);
            } else {
                let chosen = weighted_select(&eligible)?;
                record_selection(chosen, &mut used_subnets, &mut used_as, &mut used_countries);
                selected.push(chosen.clone());
                let chosen_id = chosen.node_id;
                candidates.retain(|r| r.node_id != chosen_id);
            }
        }

        debug!("Selected {} relays for circuit", selected.len());

        Ok(selected)
    }
}

impl Default for RelaySelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Record a selected relay's properties for constraint tracking.
fn record_selection(
    relay: &RelayDescriptor,
    used_subnets: &mut HashSet<[u8; 3]>,
    used_as: &mut HashSet<u32>,
    used_countries: &mut HashSet<[u8; 2]>,
) {
    if let Some(subnet) = extract_subnet_24(&relay.ip_addr) {
        used_subnets.insert(subnet);
    }
    used_as.insert(relay.as_number);
    used_countries.insert(relay.country_code);
}

/// Extract the /24 subnet prefix from an IP address string.
///
/// Parses addresses like "1.2.3.4:4433" and returns the first 3 octets.
fn extract_subnet_24(addr_str: &str) -> Option<[u8; 3]> {
    let ip_part = addr_str.split(':').next()?;
    let ip: Ipv4Addr = ip_part.parse().ok()?;
    let octets = ip.octets();
    Some([octets[0], octets[1], octets[2]])
}

/// Select a relay using PoSrv-weighted random sampling.
///
/// Relays with higher PoSrv scores are more likely to be selected.
fn weighted_select<'a>(relays: &[&'a &RelayDescriptor]) -> Result<&'a RelayDescriptor> {
    if relays.is_empty() {
        return Err(OnionError::InsufficientRelays { need: 1, have: 0 });
    }

    // Compute total weight (PoSrv scores, clamped to positive).
    let total_weight: f64 = relays
        .iter()
        .map(|r| f64::from(r.posrv_score).max(0.001))
        .sum();

    if total_weight <= 0.0 {
        let idx = rand::Rng::gen_range(&mut rand::thread_rng(), 0..relays.len());
        return Ok(relays[idx]);
    }

    let mut rng = rand::thread_rng();
    let threshold: f64 = rand::Rng::gen_range(&mut rng, 0.0..total_weight);

    let mut cumulative = 0.0;
    for relay in relays {
        cumulative += f64::from(relay.posrv_score).max(0.001);
        if cumulative >= threshold {
            return Ok(relay);
        }
    }

    // Fallback to last relay (floating point edge case).
    Ok(relays[relays.len() - 1])
}
