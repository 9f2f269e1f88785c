//! File d'attente de la soirée
//!
//! [`QueueStore`] possède l'état (pistes en attente + piste en cours) et
//! sérialise toutes les opérations derrière un seul mutex. Le verrou n'est
//! jamais tenu à travers un `.await`.

use crate::models::{ApproveOutcome, ProposeOutcome, QueueEntry, QueueSnapshot, RemoveOutcome};
use pmospotify::Track;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<QueueEntry>,
    current: Option<QueueEntry>,
}

impl QueueState {
    fn contains(&self, id: &str) -> bool {
        self.current.as_ref().is_some_and(|c| c.id == id) || self.pending.iter().any(|e| e.id == id)
    }
}

/// File d'attente partagée entre les handlers HTTP
///
/// Invariants maintenus par chaque opération :
/// - deux entrées en attente n'ont jamais le même `id` ;
/// - la piste en cours n'apparaît pas dans les pistes en attente.
#[derive(Debug, Default)]
pub struct QueueStore {
    state: Mutex<QueueState>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Aucune opération ne peut laisser l'état à moitié modifié
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Propose une piste
    ///
    /// L'appelant garantit que `track.id` et `track.title` ne sont pas vides.
    /// Si rien n'est en cours de lecture, la tête de file démarre dans la
    /// même section critique que l'ajout.
    pub fn propose(&self, track: Track, proposed_by: &str) -> ProposeOutcome {
        let mut state = self.lock();

        if state.contains(&track.id) {
            debug!(id = %track.id, "Duplicate proposal ignored");
            return ProposeOutcome::DuplicateIgnored;
        }

        let entry = QueueEntry::from_track(track, proposed_by);
        debug!(id = %entry.id, proposed_by = %entry.proposed_by, "Track queued");
        state.pending.push_back(entry);

        if state.current.is_none() {
            state.current = state.pending.pop_front();
            if let Some(current) = &state.current {
                info!(id = %current.id, title = %current.title, "Playback started");
            }
        }

        ProposeOutcome::Accepted
    }

    /// Marque comme approuvée la première entrée en attente portant `id`
    ///
    /// La piste en cours n'est pas concernée.
    pub fn approve(&self, id: &str) -> ApproveOutcome {
        let mut state = self.lock();
        match state.pending.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.approved = true;
                debug!(id, "Track approved");
                ApproveOutcome::Found
            }
            None => ApproveOutcome::NotFound,
        }
    }

    /// Retire de la file toutes les entrées en attente portant `id`
    ///
    /// Idempotent ; la piste en cours n'est jamais retirée.
    pub fn remove(&self, id: &str) -> RemoveOutcome {
        let mut state = self.lock();
        let before = state.pending.len();
        state.pending.retain(|e| e.id != id);
        let count = before - state.pending.len();
        if count > 0 {
            debug!(id, count, "Track removed from queue");
        }
        RemoveOutcome::Removed { count }
    }

    /// Passe à la piste suivante
    ///
    /// Retourne la nouvelle piste en cours, ou `None` (et plus rien n'est en
    /// cours) si la file était vide.
    pub fn advance(&self) -> Option<QueueEntry> {
        let mut state = self.lock();
        state.current = state.pending.pop_front();
        match &state.current {
            Some(current) => info!(id = %current.id, title = %current.title, "Advanced to next track"),
            None => info!("Queue exhausted, nothing playing"),
        }
        state.current.clone()
    }

    /// Copie de l'état courant
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.lock();
        QueueSnapshot {
            pending: state.pending.iter().cloned().collect(),
            current: state.current.clone(),
        }
    }

    /// Copie des pistes en attente
    pub fn pending(&self) -> Vec<QueueEntry> {
        self.lock().pending.iter().cloned().collect()
    }

    /// Copie de la piste en cours
    pub fn current(&self) -> Option<QueueEntry> {
        self.lock().current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Title {}", id), "Artist")
    }

    fn assert_invariants(store: &QueueStore) {
        let snapshot = store.snapshot();
        let ids: HashSet<_> = snapshot.pending.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), snapshot.pending.len(), "duplicate pending ids");
        if let Some(current) = &snapshot.current {
            assert!(!ids.contains(current.id.as_str()), "current track also pending");
        }
    }

    fn pending_ids(store: &QueueStore) -> Vec<String> {
        store.pending().into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_first_proposal_starts_playback() {
        let store = QueueStore::new();
        assert_eq!(store.propose(track("A"), "guest"), ProposeOutcome::Accepted);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.current.unwrap().id, "A");
        assert!(snapshot.pending.is_empty());
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let store = QueueStore::new();
        store.propose(track("A"), "guest");
        store.propose(track("B"), "guest");

        // A est en cours, B en attente : les deux sont des doublons
        assert_eq!(store.propose(track("A"), "bob"), ProposeOutcome::DuplicateIgnored);
        assert_eq!(store.propose(track("B"), "bob"), ProposeOutcome::DuplicateIgnored);
        assert_eq!(pending_ids(&store), vec!["B"]);
        assert_eq!(store.pending()[0].proposed_by, "guest");
    }

    #[test]
    fn test_queue_scenario() {
        let store = QueueStore::new();
        store.propose(track("A"), "guest");
        store.propose(track("B"), "guest");
        store.propose(track("C"), "guest");

        assert_eq!(store.current().unwrap().id, "A");
        assert_eq!(pending_ids(&store), vec!["B", "C"]);

        let next = store.advance().unwrap();
        assert_eq!(next.id, "B");
        assert_eq!(store.current().unwrap().id, "B");
        assert_eq!(pending_ids(&store), vec!["C"]);

        let before = store.snapshot();
        assert_eq!(store.remove("A"), RemoveOutcome::Removed { count: 0 });
        assert_eq!(store.snapshot(), before);

        assert_eq!(store.approve("C"), ApproveOutcome::Found);
        assert!(store.pending()[0].approved);
        assert_eq!(store.snapshot(), before);

        assert_eq!(store.remove("C"), RemoveOutcome::Removed { count: 1 });
        assert!(store.pending().is_empty());
        assert_eq!(store.current().unwrap().id, "B");
    }

    #[test]
    fn test_approve_ignores_current_track() {
        let store = QueueStore::new();
        store.propose(track("A"), "guest");
        assert_eq!(store.approve("A"), ApproveOutcome::NotFound);
        assert_eq!(store.approve("missing"), ApproveOutcome::NotFound);
    }

    #[test]
    fn test_remove_keeps_current_track() {
        let store = QueueStore::new();
        store.propose(track("A"), "guest");
        assert_eq!(store.remove("A"), RemoveOutcome::Removed { count: 0 });
        assert_eq!(store.current().unwrap().id, "A");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = QueueStore::new();
        store.propose(track("A"), "guest");
        store.propose(track("B"), "guest");
        store.remove("B");
        let after_first = store.snapshot();
        store.remove("B");
        assert_eq!(store.snapshot(), after_first);
    }

    #[test]
    fn test_advance_on_empty_queue_stops_playback() {
        let store = QueueStore::new();
        assert!(store.advance().is_none());

        store.propose(track("A"), "guest");
        assert!(store.advance().is_none());
        assert!(store.current().is_none());

        // La proposition suivante redémarre la lecture
        store.propose(track("B"), "guest");
        assert_eq!(store.current().unwrap().id, "B");
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = QueueStore::new();
        store.propose(track("A"), "guest");
        store.propose(track("B"), "guest");

        let mut snapshot = store.snapshot();
        snapshot.pending.clear();
        snapshot.current = None;

        assert_eq!(pending_ids(&store), vec!["B"]);
        assert!(store.current().is_some());
    }

    #[test]
    fn test_invariants_hold_over_mixed_operations() {
        let store = QueueStore::new();
        // Générateur congruentiel linéaire, séquence reproductible
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as usize
        };

        for _ in 0..2000 {
            let id = format!("t{}", next() % 12);
            match next() % 4 {
                0 => {
                    store.propose(track(&id), "guest");
                }
                1 => {
                    store.approve(&id);
                }
                2 => {
                    store.remove(&id);
                }
                _ => {
                    store.advance();
                }
            }
            assert_invariants(&store);
        }
    }

    #[test]
    fn test_concurrent_proposals_into_empty_queue() {
        let store = Arc::new(QueueStore::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        // La moitié des ids sont partagés entre les workers
                        let id = if i % 2 == 0 {
                            format!("shared-{}", i)
                        } else {
                            format!("w{}-{}", worker, i)
                        };
                        store.propose(track(&id), "guest");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_invariants(&store);
        let snapshot = store.snapshot();
        assert!(snapshot.current.is_some());
        // 25 ids partagés + 8 × 25 ids propres
        assert_eq!(snapshot.pending.len() + 1, 25 + 8 * 25);
    }

    #[test]
    fn test_concurrent_advance_and_propose() {
        let store = Arc::new(QueueStore::new());
        let proposer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    store.propose(track(&format!("p{}", i)), "guest");
                }
            })
        };
        let skipper = {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    store.advance();
                }
            })
        };

        proposer.join().unwrap();
        skipper.join().unwrap();
        assert_invariants(&store);
    }
}
