//! In-flight fetch registry
//!
//! Concurrent misses for the same study share one remote fetch: the first caller
//! leads, later callers subscribe to the leader's outcome.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::error::Result;
use crate::models::ImagingStudy;

type Outcome = Result<ImagingStudy>;

// == Flight ==
/// Role assigned to a caller by [`InflightRegistry::join_or_lead`].
pub enum Flight<'a> {
    /// Caller must fetch and then publish through the guard
    Leader(LeaderGuard<'a>),
    /// Another caller is fetching; await its outcome here
    Follower(broadcast::Receiver<Outcome>),
}

// == Inflight Registry ==
#[derive(Debug, Default)]
pub struct InflightRegistry {
    flights: Mutex<HashMap<String, broadcast::Sender<Outcome>>>,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the fetch already running for `key`, or registers a new one.
    pub fn join_or_lead(&self, key: &str) -> Flight<'_> {
        let mut flights = self.lock();
        if let Some(sender) = flights.get(key) {
            return Flight::Follower(sender.subscribe());
        }

        let (sender, _) = broadcast::channel(1);
        flights.insert(key.to_string(), sender.clone());
        Flight::Leader(LeaderGuard {
            registry: self,
            key: key.to_string(),
            sender: Some(sender),
        })
    }

    /// Number of fetches currently led.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn release(&self, key: &str, sender: &broadcast::Sender<Outcome>) {
        let mut flights = self.lock();
        if flights
            .get(key)
            .is_some_and(|current| current.same_channel(sender))
        {
            flights.remove(key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<Outcome>>> {
        self.flights.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Leader Guard ==
/// Held by the caller performing the fetch.
///
/// Dropping it without [`complete`](Self::complete) releases the slot and
/// closes the channel, so followers stop waiting.
pub struct LeaderGuard<'a> {
    registry: &'a InflightRegistry,
    key: String,
    sender: Option<broadcast::Sender<Outcome>>,
}

impl LeaderGuard<'_> {
    /// Publishes the outcome to every follower and frees the slot.
    pub fn complete(mut self, outcome: &Outcome) {
        if let Some(sender) = self.sender.take() {
            self.registry.release(&self.key, &sender);
            // no followers is fine
            let _ = sender.send(outcome.clone());
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            self.registry.release(&self.key, &sender);
        }
    }
}
