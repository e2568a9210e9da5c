//! A deterministic network simulator for multiparty protocols.
//!
//! [`simulate`] co-executes all parties of a protocol on a single thread.
//! Each party has a virtual clock: only the wall-clock time the party
//! itself spends computing advances it, and channel operations advance it
//! by the delivery delay a real network would impose, computed from the
//! per-channel [`ChannelConfig`]. What comes out is one [`SimulationTrace`]
//! per party: the timestamped events of everything the party did.
//!
//! The scheduling model is the crate's cooperative [`Runtime`]; the
//! simulator installs an observer that starts a party's clock whenever it
//! is resumed, turns sleeps into virtual time, and makes the scheduler
//! skip cancelled parties.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::net::Network;
use crate::protocol::{Clock, Env, Protocol};
use crate::runtime::{batch, suspend_until, Runtime, RuntimeObserver};
use crate::{Error, Result};

mod channel;
mod config;
mod context;
mod event;
mod hook;
mod manager;
mod transport;

pub use config::{
    ChannelConfig, ChannelConfigBuilder, NetworkConfig, NetworkType, SimpleNetworkConfig,
};
pub use context::SimulationContext;
pub use event::{
    to_millis, write_trace, ChannelId, Event, EventKind, EventType, SimulationTrace,
};
pub use hook::{Hook, TriggerAndHook};
pub use manager::{HookRegistry, Manager, StreamManager};

use channel::SimulatedChannel;
use context::{GlobalContext, PartyContext, SharedContext};
use transport::Transport;

/// The simulator's runtime observer: virtual clocks and cancellation.
struct SimObserver {
    gctx: SharedContext,
}

impl SimObserver {
    fn view(&self, id: usize) -> PartyContext {
        PartyContext {
            id,
            gctx: self.gctx.clone(),
        }
    }
}

impl RuntimeObserver for SimObserver {
    fn on_resume(&self, party: Option<usize>) {
        // Event timestamps are computed as
        //
        //   ts = last_event_ts + (now - last_start_clock)
        //
        // so the clock has to restart here; otherwise time spent running
        // other parties, or the runtime itself, would leak into the
        // timestamp of this party's next event.
        if let Some(id) = party {
            self.view(id).start_clock();
        }
    }

    fn on_sleep(&self, party: Option<usize>, duration: Duration) -> Option<Result<()>> {
        let id = party?;
        let view = self.view(id);
        let last = view.last_event_timestamp();
        Some(view.record_event(Event::sleep(last, duration)))
    }

    fn is_cancelled(&self, party: usize) -> bool {
        self.gctx.borrow().cancellation.at(party)
    }
}

/// A [`Clock`] reading a party's virtual time.
struct SimulatedClock {
    view: PartyContext,
}

impl Clock for SimulatedClock {
    fn read(&self) -> Duration {
        self.view.elapsed_time()
    }
}

fn create_network(
    id: usize,
    n: usize,
    gctx: &SharedContext,
    transport: &Rc<RefCell<Transport>>,
) -> Network {
    let view = PartyContext {
        id,
        gctx: gctx.clone(),
    };
    let channels = (0..n)
        .map(|j| {
            Rc::new(SimulatedChannel::new(
                ChannelId::new(id, j),
                view.clone(),
                transport.clone(),
            )) as Rc<dyn crate::net::Channel>
        })
        .collect();
    Network::new(channels, id)
}

async fn run_protocol<M: Manager>(
    id: usize,
    manager: Rc<RefCell<M>>,
    protocol: Box<dyn Protocol>,
    env: Env,
    view: PartyContext,
) {
    // A protocol runs for as long as its result names a successor, it
    // produces no error, and nobody cancels it. The events come out
    // roughly as:
    //
    //   START
    //   repeat per protocol in the chain:
    //     PROTOCOL_BEGIN
    //     SEND, RECV, CLOSE, HAS_DATA, SLEEP ...
    //     OUTPUT, if the step produced a value
    //     PROTOCOL_END
    //   STOP
    //
    // Self-cancellation surfaces as Err(Cancelled) out of whichever
    // operation recorded the triggering event and turns into a CANCELLED
    // event; any other error turns into KILLED with the error's message.
    let result = run_protocol_steps(id, &manager, protocol, env, &view).await;
    match result {
        Ok(()) => {}
        Err(Error::Cancelled) => {
            view.record_terminal(Event::cancelled(view.last_event_timestamp()));
        }
        Err(error) => {
            view.record_terminal(Event::killed(view.last_event_timestamp(), error.to_string()));
        }
    }
}

async fn run_protocol_steps<M: Manager>(
    id: usize,
    manager: &Rc<RefCell<M>>,
    protocol: Box<dyn Protocol>,
    env: Env,
    view: &PartyContext,
) -> Result<()> {
    view.record_event(Event::start())?;

    let mut next = Some(protocol);
    while let Some(protocol) = next {
        let name = protocol.name();
        view.record_event(Event::protocol_begin(view.last_event_timestamp(), &name))?;

        // book-keeping up to here must not count towards the party's
        // running time.
        view.start_clock();
        let result = protocol.run(env.clone()).await?;

        let elapsed = view.elapsed_time();
        if let Some(output) = result.output {
            manager.borrow_mut().handle_protocol_output(id, &output);
            view.record_event(Event::output(elapsed))?;
        }
        view.record_event(Event::protocol_end(elapsed, &name))?;

        next = result.next_protocol;
    }

    view.record_event(Event::stop(view.last_event_timestamp()))?;

    // suspending here lets another party run; important when the protocol
    // itself had no suspension point at all.
    suspend_until(|| true).await;
    Ok(())
}

/// Simulates one run of the manager's protocols.
///
/// Builds the global context, wires every party to every other through
/// simulated channels, runs all parties to completion (cancelled parties
/// excepted) and hands each trace to [`Manager::handle_simulator_output`].
pub fn simulate<M: Manager + 'static>(mut manager: M) {
    let protocols = manager.protocol();
    // nothing to do for an empty protocol vector.
    if protocols.is_empty() {
        return;
    }

    let n = protocols.len();
    log::debug!("simulating {n} parties");

    let hooks = manager.hooks();
    let gctx = GlobalContext::create(n, manager.network_configuration(), hooks);
    let runtime = Runtime::with_observer(Rc::new(SimObserver { gctx: gctx.clone() }));
    let transport = Rc::new(RefCell::new(Transport::new()));
    let manager = Rc::new(RefCell::new(manager));

    let mut tasks = Vec::with_capacity(n);
    for (id, protocol) in protocols.into_iter().enumerate() {
        let view = PartyContext {
            id,
            gctx: gctx.clone(),
        };
        let network = create_network(id, n, &gctx, &transport);
        let clock = Rc::new(SimulatedClock { view: view.clone() });
        let env = Env::with_clock(network, clock);

        let task = runtime.spawn_for_party(
            run_protocol(id, manager.clone(), protocol, env, view),
            Some(id),
        );
        tasks.push(task);
    }

    // drive until every non-cancelled party is done.
    runtime.run(async move {
        batch(tasks).await;
    });

    // parties cancelled from the outside never get to run again, so their
    // traces are closed here.
    {
        let mut gctx = gctx.borrow_mut();
        for id in 0..n {
            if !gctx.cancellation.at(id) {
                continue;
            }
            let trace = &mut gctx.traces[id];
            if !trace.last().map(Event::is_terminal).unwrap_or(false) {
                let last = trace.last().map(|e| e.timestamp).unwrap_or(Duration::ZERO);
                trace.push(Event::cancelled(last));
            }
        }
    }

    let gctx = gctx.borrow();
    for (id, trace) in gctx.traces.iter().enumerate() {
        manager.borrow_mut().handle_simulator_output(id, trace);
    }
}
