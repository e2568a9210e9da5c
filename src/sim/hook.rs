//! Observability hooks.

use std::rc::Rc;

use super::context::SimulationContext;
use super::event::EventType;

/// A callback invoked when parties record events.
///
/// Hooks see a read-mostly view of the simulation and may cancel parties
/// or the whole run through it. A hook registered without a trigger runs
/// on every event; with a trigger, only on events of that type.
pub trait Hook {
    /// Called with the id of the party that recorded the event.
    fn run(&self, party_id: usize, ctx: &SimulationContext);
}

impl<F: Fn(usize, &SimulationContext)> Hook for F {
    fn run(&self, party_id: usize, ctx: &SimulationContext) {
        self(party_id, ctx)
    }
}

/// A hook together with the event type that fires it; `None` fires on
/// everything.
pub type TriggerAndHook = (Option<EventType>, Rc<dyn Hook>);
