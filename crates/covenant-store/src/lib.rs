//! Covenant Store — sharded per-key agent state.
//!
//! Each (agent, principal) key logically owns one [`AgentState`]. The
//! read-modify-write cycle (window mutation, metric recompute, score
//! update, band check) is not safe to interleave for the same key, so
//! [`StateStore::record`] runs add_event + evaluate as one atomic unit
//! under that state's mutex. Distinct keys live in independent shards and
//! evaluate fully in parallel — there is no global lock.
//!
//! Persistence is the caller's concern: the store hands out snapshots and
//! accepts restores, nothing blocks on I/O internally.

#![deny(unsafe_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, RwLock};

use covenant_evaluator::{
    ActionRequest, AgentState, EvaluationResult, Evaluator, GateDecision, StateExport,
    StateSnapshot,
};
use covenant_types::{AlignmentEvent, ConfigError, EvaluatorConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Number of independent shards. Power of two, sized for tens of
/// concurrent gateway requests.
const SHARD_COUNT: usize = 16;

/// Identity of one evaluated agent-principal pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentKey {
    pub agent_id: String,
    pub principal_id: String,
}

impl AgentKey {
    pub fn new(agent_id: impl Into<String>, principal_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            principal_id: principal_id.into(),
        }
    }
}

impl std::fmt::Display for AgentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.agent_id, self.principal_id)
    }
}

/// Errors from the state store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no state for agent key: {0}")]
    AgentNotFound(AgentKey),

    #[error("state lock poisoned for agent key: {0}")]
    LockPoisoned(AgentKey),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

type Shard = RwLock<HashMap<AgentKey, Arc<Mutex<AgentState>>>>;

/// Sharded in-memory store of per-key agent states.
pub struct StateStore {
    evaluator: Evaluator,
    shards: Vec<Shard>,
}

impl StateStore {
    /// Create a store; the configuration is validated once here.
    pub fn new(config: EvaluatorConfig) -> Result<Self, StoreError> {
        let evaluator = Evaluator::new(config)?;
        let shards = (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect();
        Ok(Self { evaluator, shards })
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    fn shard(&self, key: &AgentKey) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Fetch the state cell for a key, creating a fresh state on first use.
    fn entry(&self, key: &AgentKey) -> Result<Arc<Mutex<AgentState>>, StoreError> {
        {
            let shard = self
                .shard(key)
                .read()
                .map_err(|_| StoreError::LockPoisoned(key.clone()))?;
            if let Some(cell) = shard.get(key) {
                return Ok(Arc::clone(cell));
            }
        }

        let mut shard = self
            .shard(key)
            .write()
            .map_err(|_| StoreError::LockPoisoned(key.clone()))?;
        let cell = shard.entry(key.clone()).or_insert_with(|| {
            debug!(key = %key, "created fresh agent state");
            Arc::new(Mutex::new(
                self.evaluator.new_state(&key.agent_id, &key.principal_id),
            ))
        });
        Ok(Arc::clone(cell))
    }

    /// Existing state cell, or `AgentNotFound`.
    fn existing(&self, key: &AgentKey) -> Result<Arc<Mutex<AgentState>>, StoreError> {
        let shard = self
            .shard(key)
            .read()
            .map_err(|_| StoreError::LockPoisoned(key.clone()))?;
        shard
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::AgentNotFound(key.clone()))
    }

    /// Ingest an event and run one evaluation cycle as a single atomic
    /// unit under the key's state lock. Creates the state on first use.
    pub fn record(
        &self,
        key: &AgentKey,
        event: AlignmentEvent,
        dt: f64,
    ) -> Result<EvaluationResult, StoreError> {
        let cell = self.entry(key)?;
        let mut state = cell.lock().map_err(|_| StoreError::LockPoisoned(key.clone()))?;
        self.evaluator.add_event(&mut state, event);
        Ok(self.evaluator.evaluate(&mut state, dt))
    }

    /// Run an evaluation cycle without ingesting an event (timer ticks).
    pub fn evaluate(&self, key: &AgentKey, dt: f64) -> Result<EvaluationResult, StoreError> {
        let cell = self.existing(key)?;
        let mut state = cell.lock().map_err(|_| StoreError::LockPoisoned(key.clone()))?;
        Ok(self.evaluator.evaluate(&mut state, dt))
    }

    /// Gate a proposed action against the key's current band.
    pub fn check_action(
        &self,
        key: &AgentKey,
        request: ActionRequest,
    ) -> Result<GateDecision, StoreError> {
        let cell = self.existing(key)?;
        let state = cell.lock().map_err(|_| StoreError::LockPoisoned(key.clone()))?;
        Ok(self.evaluator.check_action_allowed(&state, request))
    }

    /// Observability export (bounded event tail).
    pub fn export(&self, key: &AgentKey) -> Result<StateExport, StoreError> {
        let cell = self.existing(key)?;
        let state = cell.lock().map_err(|_| StoreError::LockPoisoned(key.clone()))?;
        Ok(self.evaluator.export_state(&state))
    }

    /// Full-fidelity snapshot for persistence or replay.
    pub fn snapshot(&self, key: &AgentKey) -> Result<StateSnapshot, StoreError> {
        let cell = self.existing(key)?;
        let state = cell.lock().map_err(|_| StoreError::LockPoisoned(key.clone()))?;
        Ok(self.evaluator.snapshot(&state))
    }

    /// Install a previously snapshotted state, replacing any existing
    /// state for the key.
    pub fn restore(&self, key: &AgentKey, snapshot: StateSnapshot) -> Result<(), StoreError> {
        let state = self.evaluator.restore(snapshot);
        let mut shard = self
            .shard(key)
            .write()
            .map_err(|_| StoreError::LockPoisoned(key.clone()))?;
        shard.insert(key.clone(), Arc::new(Mutex::new(state)));
        Ok(())
    }

    pub fn contains(&self, key: &AgentKey) -> bool {
        self.shard(key)
            .read()
            .map(|shard| shard.contains_key(key))
            .unwrap_or(false)
    }

    /// Number of tracked agent-principal pairs.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().map(|s| s.len()).unwrap_or(0))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_types::Direction;

    fn store() -> StateStore {
        StateStore::new(EvaluatorConfig::default()).unwrap()
    }

    fn event(key: &AgentKey, direction: Direction, weight: f64) -> AlignmentEvent {
        AlignmentEvent::new(
            key.agent_id.clone(),
            key.principal_id.clone(),
            direction,
            "TEST",
            "unit-test",
            weight,
        )
        .unwrap()
    }

    #[test]
    fn record_creates_state_on_first_use() {
        let store = store();
        let key = AgentKey::new("agent-1", "user:alice");
        assert!(!store.contains(&key));

        let result = store
            .record(&key, event(&key, Direction::Cooperation, 0.8), 1.0)
            .unwrap();
        assert!(result.e_new > result.e_old);
        assert!(store.contains(&key));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn read_operations_require_existing_state() {
        let store = store();
        let key = AgentKey::new("agent-ghost", "user:nobody");

        assert!(matches!(
            store.check_action(&key, ActionRequest::default()),
            Err(StoreError::AgentNotFound(_))
        ));
        assert!(matches!(store.export(&key), Err(StoreError::AgentNotFound(_))));
        assert!(matches!(store.evaluate(&key, 1.0), Err(StoreError::AgentNotFound(_))));
    }

    #[test]
    fn distinct_keys_are_independent() {
        let store = store();
        let good = AgentKey::new("agent-good", "user:alice");
        let bad = AgentKey::new("agent-bad", "user:alice");

        for _ in 0..100 {
            store
                .record(&good, event(&good, Direction::Cooperation, 0.9), 1.0)
                .unwrap();
            store
                .record(&bad, event(&bad, Direction::Defection, 0.9), 1.0)
                .unwrap();
        }

        let good_export = store.export(&good).unwrap();
        let bad_export = store.export(&bad).unwrap();
        assert!(good_export.e > bad_export.e);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_records_on_distinct_keys() {
        let store = Arc::new(store());
        let mut handles = Vec::new();

        for n in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let key = AgentKey::new(format!("agent-{n}"), "user:alice");
                for _ in 0..50 {
                    let result = store
                        .record(&key, event(&key, Direction::Cooperation, 0.5), 1.0)
                        .unwrap();
                    assert!((0.0..=1.0).contains(&result.e_new));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn concurrent_records_on_same_key_stay_consistent() {
        let store = Arc::new(store());
        let key = AgentKey::new("agent-shared", "user:alice");
        let mut handles = Vec::new();

        for _ in 0..4 {
            let store = Arc::clone(&store);
            let key = key.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    store
                        .record(&key, event(&key, Direction::Cooperation, 0.5), 1.0)
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let export = store.export(&key).unwrap();
        // 400 atomic record cycles: window is exactly at capacity and the
        // score respected its bounds the whole way.
        assert_eq!(export.event_count, 100);
        assert!((0.0..=1.0).contains(&export.e));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_restore_roundtrip_through_store() {
        let store = store();
        let key = AgentKey::new("agent-1", "user:alice");
        for _ in 0..10 {
            store
                .record(&key, event(&key, Direction::Defection, 0.7), 1.0)
                .unwrap();
        }

        let snapshot = store.snapshot(&key).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();

        let other = StateStore::new(EvaluatorConfig::default()).unwrap();
        other
            .restore(&key, serde_json::from_str(&json).unwrap())
            .unwrap();

        let e = event(&key, Direction::Cooperation, 0.6);
        let a = store.record(&key, e.clone(), 1.0).unwrap();
        let b = other.record(&key, e, 1.0).unwrap();
        assert_eq!(a.e_new.to_bits(), b.e_new.to_bits());
        assert_eq!(a.i_new.to_bits(), b.i_new.to_bits());
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let config = EvaluatorConfig {
            window_size: 0,
            ..EvaluatorConfig::default()
        };
        assert!(matches!(StateStore::new(config), Err(StoreError::Config(_))));
    }
}
