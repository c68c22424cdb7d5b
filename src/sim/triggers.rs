//! Trigger volumes and hazard dormancy
//!
//! Hazards bound to a trigger sleep until the player walks into that
//! trigger. A binding with a delay is queued on an [`ActivationQueue`] and
//! fires once the simulation clock reaches it, whether or not the player is
//! still inside. Reloading the level cancels everything still queued.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use super::collision::Aabb;
use super::level::{Hazard, HazardId, LevelData};
use crate::consts::CLOCK_EPSILON;

/// A queued hazard activation
#[derive(Debug, Clone, Copy)]
pub struct PendingActivation {
    /// Simulation clock (seconds) at which the hazard wakes
    pub fire_at: f64,
    pub hazard: HazardId,
    /// Level load this entry belongs to
    generation: u32,
    /// Insertion order, breaks ties between equal fire times
    seq: u64,
}

impl PartialEq for PendingActivation {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingActivation {}

impl PartialOrd for PendingActivation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingActivation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .total_cmp(&other.fire_at)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of deferred activations keyed by fire time
#[derive(Debug, Clone, Default)]
pub struct ActivationQueue {
    heap: BinaryHeap<Reverse<PendingActivation>>,
    generation: u32,
    next_seq: u64,
}

impl ActivationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at: f64, hazard: HazardId) {
        let entry = PendingActivation {
            fire_at,
            hazard,
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(entry));
    }

    /// Drop every pending activation; nothing scheduled before this call
    /// will ever fire
    pub fn cancel_all(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.heap.clear();
    }

    /// Pop every activation due at `now`, earliest first
    pub fn drain_due(&mut self, now: f64) -> Vec<HazardId> {
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.heap.peek() {
            if next.fire_at > now + CLOCK_EPSILON {
                break;
            }
            let Some(Reverse(entry)) = self.heap.pop() else {
                break;
            };
            if entry.generation == self.generation {
                due.push(entry.hazard);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Fire time of the earliest pending activation
    pub fn next_fire_time(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(entry)| entry.fire_at)
    }
}

/// Put every trigger-bound hazard to sleep and wake all others
///
/// Called on every level (re)load.
pub fn arm_dormant_hazards(level: &mut LevelData) {
    let bound: HashSet<HazardId> = level
        .triggers
        .iter()
        .flat_map(|t| t.bindings.iter())
        .filter_map(|b| b.hazard_id)
        .collect();

    for hazard in &mut level.traps {
        hazard.dormant = bound.contains(&hazard.id);
    }
    log::debug!("{} hazard(s) dormant until triggered", bound.len());
}

/// Wake one hazard; returns false when it was already awake or no longer
/// exists
pub fn activate(traps: &mut [Hazard], id: HazardId) -> bool {
    match traps.iter_mut().find(|h| h.id == id) {
        Some(hazard) if hazard.dormant => {
            hazard.dormant = false;
            log::debug!("Hazard {:?} activated", id);
            true
        }
        Some(_) => false,
        None => {
            log::debug!("Binding points at missing hazard {:?}", id);
            false
        }
    }
}

/// Fire due activations, then test the body against every trigger
///
/// Returns the hazards woken this tick.
pub fn evaluate_triggers(
    level: &mut LevelData,
    body: &Aabb,
    queue: &mut ActivationQueue,
    now: f64,
) -> Vec<HazardId> {
    let mut woken = Vec::new();

    for id in queue.drain_due(now) {
        if activate(&mut level.traps, id) {
            woken.push(id);
        }
    }

    for (index, trigger) in level.triggers.iter_mut().enumerate() {
        let inside = trigger.aabb().overlaps(body);
        let entered = inside && !trigger.occupied;
        trigger.occupied = inside;

        if !entered || (trigger.one_shot && trigger.triggered) {
            continue;
        }
        trigger.triggered = true;
        log::debug!("Trigger {} entered at t={:.3}", index, now);

        for binding in &trigger.bindings {
            let Some(id) = binding.hazard_id else {
                continue;
            };
            if binding.delay <= 0.0 {
                if activate(&mut level.traps, id) {
                    woken.push(id);
                }
            } else {
                queue.schedule(now + binding.delay as f64, id);
            }
        }
    }

    woken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::TriggerVolume;

    fn level_with_binding(delay: f32) -> (LevelData, HazardId) {
        let mut level = LevelData::default();
        let id = level.add_hazard(Hazard::spikes(500.0, 500.0, 40.0, 20.0));
        level.add_hazard(Hazard::spikes(800.0, 500.0, 40.0, 20.0));
        level.triggers.push(TriggerVolume::new(0.0, 0.0, 100.0, 100.0).bind(id, delay));
        level.prepare();
        arm_dormant_hazards(&mut level);
        (level, id)
    }

    const INSIDE: Aabb = Aabb::new(10.0, 10.0, 30.0, 40.0);
    const OUTSIDE: Aabb = Aabb::new(300.0, 10.0, 30.0, 40.0);

    #[test]
    fn test_only_bound_hazards_start_dormant() {
        let (level, id) = level_with_binding(0.0);
        assert!(level.hazard(id).unwrap().dormant);
        assert!(!level.traps[1].dormant);
    }

    #[test]
    fn test_immediate_activation() {
        let (mut level, id) = level_with_binding(0.0);
        let mut queue = ActivationQueue::new();
        let woken = evaluate_triggers(&mut level, &INSIDE, &mut queue, 0.0);
        assert_eq!(woken, vec![id]);
        assert!(!level.hazard(id).unwrap().dormant);
        assert!(level.triggers[0].triggered);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_delayed_activation_survives_leaving() {
        let (mut level, id) = level_with_binding(2.0);
        let mut queue = ActivationQueue::new();
        let dt = 1.0 / 60.0;
        let mut now = 0.0;

        evaluate_triggers(&mut level, &INSIDE, &mut queue, now);
        assert_eq!(queue.len(), 1);

        for tick in 1..=130 {
            now += dt;
            let body = if tick < 30 { INSIDE } else { OUTSIDE };
            evaluate_triggers(&mut level, &body, &mut queue, now);
            let dormant = level.hazard(id).unwrap().dormant;
            if now < 1.9 {
                assert!(dormant, "woke early at {}", now);
            }
            if now >= 2.0 {
                assert!(!dormant, "still asleep at {}", now);
            }
        }
    }

    #[test]
    fn test_one_shot_fires_once() {
        let (mut level, _) = level_with_binding(1.0);
        let mut queue = ActivationQueue::new();
        evaluate_triggers(&mut level, &INSIDE, &mut queue, 0.0);
        evaluate_triggers(&mut level, &OUTSIDE, &mut queue, 0.1);
        evaluate_triggers(&mut level, &INSIDE, &mut queue, 0.2);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_repeatable_trigger_refires_on_reentry() {
        let (mut level, _) = level_with_binding(1.0);
        level.triggers[0].one_shot = false;
        let mut queue = ActivationQueue::new();
        evaluate_triggers(&mut level, &INSIDE, &mut queue, 0.0);
        // Staying inside is not a new entry
        evaluate_triggers(&mut level, &INSIDE, &mut queue, 0.1);
        assert_eq!(queue.len(), 1);
        evaluate_triggers(&mut level, &OUTSIDE, &mut queue, 0.2);
        evaluate_triggers(&mut level, &INSIDE, &mut queue, 0.3);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_cancel_voids_pending() {
        let (mut level, id) = level_with_binding(1.0);
        let mut queue = ActivationQueue::new();
        evaluate_triggers(&mut level, &INSIDE, &mut queue, 0.0);
        queue.cancel_all();
        let woken = evaluate_triggers(&mut level, &OUTSIDE, &mut queue, 5.0);
        assert!(woken.is_empty());
        assert!(level.hazard(id).unwrap().dormant);
    }

    #[test]
    fn test_dangling_binding_is_harmless() {
        let (mut level, id) = level_with_binding(0.5);
        let mut queue = ActivationQueue::new();
        evaluate_triggers(&mut level, &INSIDE, &mut queue, 0.0);
        level.remove_hazard(id);
        let woken = evaluate_triggers(&mut level, &OUTSIDE, &mut queue, 1.0);
        assert!(woken.is_empty());
        assert_eq!(level.traps.len(), 1);
        assert!(!level.traps[0].dormant);
    }

    #[test]
    fn test_queue_orders_by_time_then_insertion() {
        let mut queue = ActivationQueue::new();
        queue.schedule(2.0, HazardId(1));
        queue.schedule(1.0, HazardId(2));
        queue.schedule(1.0, HazardId(3));
        assert_eq!(queue.next_fire_time(), Some(1.0));
        assert_eq!(queue.drain_due(1.5), vec![HazardId(2), HazardId(3)]);
        assert_eq!(queue.drain_due(2.0), vec![HazardId(1)]);
        assert!(queue.is_empty());
    }
}
