//! The manager: what to simulate, under which network, and what to do
//! with the results.

use std::io::Write;
use std::rc::Rc;

use super::config::{NetworkConfig, SimpleNetworkConfig};
use super::event::{write_trace, EventType, SimulationTrace};
use super::hook::{Hook, TriggerAndHook};
use crate::protocol::{Protocol, ProtocolOutput};

/// Describes one simulation: the protocols to run (one per party), the
/// network between them, hooks to observe the run, and what happens to
/// the outputs.
pub trait Manager {
    /// The protocols to simulate; the vector length decides the number of
    /// parties. Called once per run.
    fn protocol(&mut self) -> Vec<Box<dyn Protocol>>;

    /// Receives each party's trace when the simulation finishes.
    fn handle_simulator_output(&mut self, party_id: usize, trace: &SimulationTrace);

    /// Receives protocol outputs as they are produced. Discards by
    /// default.
    fn handle_protocol_output(&mut self, party_id: usize, output: &ProtocolOutput) {
        let _ = (party_id, output);
    }

    /// The network between the parties.
    fn network_configuration(&self) -> Box<dyn NetworkConfig> {
        Box::new(SimpleNetworkConfig)
    }

    /// The hooks to install for this run. Called once per run.
    fn hooks(&mut self) -> Vec<TriggerAndHook> {
        Vec::new()
    }
}

/// Builds the hook list for a [`Manager::hooks`] implementation.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<TriggerAndHook>,
}

impl HookRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook firing on events of type `trigger` only.
    pub fn add_hook(&mut self, trigger: EventType, hook: impl Hook + 'static) -> &mut Self {
        self.hooks.push((Some(trigger), Rc::new(hook)));
        self
    }

    /// Registers a hook firing on every event.
    pub fn add_hook_for_all(&mut self, hook: impl Hook + 'static) -> &mut Self {
        self.hooks.push((None, Rc::new(hook)));
        self
    }

    /// Consumes the registry into the hook list.
    pub fn into_hooks(self) -> Vec<TriggerAndHook> {
        self.hooks
    }
}

/// A manager wrapper that prints every party's trace to a stream, one
/// JSON object per line, and otherwise behaves like the wrapped manager.
pub struct StreamManager<M, W> {
    inner: M,
    stream: W,
}

impl<M: Manager, W: Write> StreamManager<M, W> {
    /// Wraps `inner`, sending traces to `stream`.
    pub fn new(inner: M, stream: W) -> Self {
        Self { inner, stream }
    }

    /// Unwraps into the inner manager and the stream.
    pub fn into_parts(self) -> (M, W) {
        (self.inner, self.stream)
    }
}

impl<M: Manager, W: Write> Manager for StreamManager<M, W> {
    fn protocol(&mut self) -> Vec<Box<dyn Protocol>> {
        self.inner.protocol()
    }

    fn handle_simulator_output(&mut self, party_id: usize, trace: &SimulationTrace) {
        let _ = write!(self.stream, "{{\"party_id\":{party_id},\"trace\":");
        let _ = write_trace(&mut self.stream, trace);
        let _ = writeln!(self.stream, "}}");
        self.inner.handle_simulator_output(party_id, trace);
    }

    fn handle_protocol_output(&mut self, party_id: usize, output: &ProtocolOutput) {
        self.inner.handle_protocol_output(party_id, output);
    }

    fn network_configuration(&self) -> Box<dyn NetworkConfig> {
        self.inner.network_configuration()
    }

    fn hooks(&mut self) -> Vec<TriggerAndHook> {
        self.inner.hooks()
    }
}
