//! Single-flight execution
//!
//! At most one computation per key runs at a time. Callers that arrive
//! while it runs block until it lands and receive a clone of its result.
//! Once a flight lands its key is forgotten, so the next caller starts a
//! fresh computation.

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, warn};

enum FlightState<V> {
    Running,
    Done(V),
    /// The leader panicked; a waiter has to take over
    Abandoned,
}

struct Flight<V> {
    state: Mutex<FlightState<V>>,
    landed: Condvar,
}

impl<V: Clone> Flight<V> {
    fn new() -> Self {
        Flight {
            state: Mutex::new(FlightState::Running),
            landed: Condvar::new(),
        }
    }

    /// Block until the flight lands; `None` if it was abandoned
    fn wait(&self) -> Option<V> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                FlightState::Done(value) => return Some(value.clone()),
                FlightState::Abandoned => return None,
                FlightState::Running => self.landed.wait(&mut state),
            }
        }
    }
}

/// Deduplicates concurrent work by key
pub struct SingleFlight<K, V> {
    flights: Mutex<HashMap<K, Arc<Flight<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        SingleFlight {
            flights: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `key`, or wait for the run already in progress
    pub fn run<F>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> V,
    {
        let (flight, leader) = self.join(&key);
        if leader {
            return self.lead(&key, &flight, work);
        }

        match flight.wait() {
            Some(value) => value,
            None => {
                debug!("flight abandoned, taking over");
                self.run(key, work)
            }
        }
    }

    /// Number of keys with a computation in progress
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }

    fn join(&self, key: &K) -> (Arc<Flight<V>>, bool) {
        let mut flights = self.flights.lock();
        match flights.get(key) {
            Some(flight) => (Arc::clone(flight), false),
            None => {
                let flight = Arc::new(Flight::new());
                flights.insert(key.clone(), Arc::clone(&flight));
                (flight, true)
            }
        }
    }

    fn lead<F>(&self, key: &K, flight: &Arc<Flight<V>>, work: F) -> V
    where
        F: FnOnce() -> V,
    {
        let mut guard = LeaderGuard {
            owner: self,
            key,
            flight,
            landed: false,
        };
        let value = work();
        guard.landed = true;
        self.land(key, flight, FlightState::Done(value.clone()));
        value
    }

    fn land(&self, key: &K, flight: &Arc<Flight<V>>, state: FlightState<V>) {
        {
            let mut flights = self.flights.lock();
            if flights.get(key).is_some_and(|f| Arc::ptr_eq(f, flight)) {
                flights.remove(key);
            }
        }
        *flight.state.lock() = state;
        flight.landed.notify_all();
    }
}

/// Marks the flight abandoned if the leader unwinds before landing
struct LeaderGuard<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    owner: &'a SingleFlight<K, V>,
    key: &'a K,
    flight: &'a Arc<Flight<V>>,
    landed: bool,
}

impl<K, V> Drop for LeaderGuard<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn drop(&mut self) {
        if !self.landed {
            warn!("single-flight leader did not finish");
            self.owner
                .land(self.key, self.flight, FlightState::Abandoned);
        }
    }
}
