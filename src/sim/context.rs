//! The shared state of one simulation run and the per-party views on it.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::config::{NetworkConfig, NetworkType};
use super::event::{Event, SimulationTrace};
use super::hook::TriggerAndHook;
use super::ChannelId;
use crate::util::Bitmap;
use crate::{Error, Result};

/// Everything the parties of one simulation share.
pub(crate) struct GlobalContext {
    /// Number of parties.
    pub n: usize,
    /// Per-channel network characteristics.
    pub config: Box<dyn NetworkConfig>,
    /// One event trace per party.
    pub traces: Vec<SimulationTrace>,
    /// Per channel, the virtual times at which bytes were posted and not
    /// yet picked up, oldest first.
    pub sends: HashMap<ChannelId, VecDeque<Duration>>,
    /// Per party, the wall-clock instant its virtual clock last started.
    pub clocks: Vec<Instant>,
    /// Bit `j` of entry `i`: party `i` is inside a receive from `j`.
    pub recv_map: Vec<Bitmap>,
    /// Cancelled parties.
    pub cancellation: Bitmap,
    /// Hooks to run on recorded events.
    pub hooks: Vec<TriggerAndHook>,
}

pub(crate) type SharedContext = Rc<RefCell<GlobalContext>>;

impl GlobalContext {
    pub fn create(
        n: usize,
        config: Box<dyn NetworkConfig>,
        hooks: Vec<TriggerAndHook>,
    ) -> SharedContext {
        Rc::new(RefCell::new(Self {
            n,
            config,
            traces: vec![Vec::new(); n],
            sends: HashMap::new(),
            clocks: vec![Instant::now(); n],
            recv_map: vec![Bitmap::new(n); n],
            cancellation: Bitmap::new(n),
            hooks,
        }))
    }
}

/// One party's handle on the global context.
#[derive(Clone)]
pub(crate) struct PartyContext {
    pub id: usize,
    pub gctx: SharedContext,
}

impl PartyContext {
    /// The timestamp of the party's most recent event.
    pub fn last_event_timestamp(&self) -> Duration {
        self.gctx.borrow().traces[self.id]
            .last()
            .map(|event| event.timestamp)
            .unwrap_or(Duration::ZERO)
    }

    /// The party's current virtual time: its last event plus however much
    /// wall-clock time it has spent executing since.
    pub fn elapsed_time(&self) -> Duration {
        let running_for = {
            let gctx = self.gctx.borrow();
            Instant::now() - gctx.clocks[self.id]
        };
        self.last_event_timestamp() + running_for
    }

    /// Restarts the party's wall-clock reference point.
    ///
    /// The runtime calls this whenever the party is resumed, so that only
    /// the wall-clock time the party itself spends executing flows into
    /// its virtual clock.
    pub fn start_clock(&self) {
        let mut gctx = self.gctx.borrow_mut();
        let id = self.id;
        gctx.clocks[id] = Instant::now();
    }

    /// Appends `event` to the party's trace and dispatches hooks.
    ///
    /// Fails with [`Error::Cancelled`] when, afterwards, the party finds
    /// itself cancelled (a hook cancelled it from inside); terminal events
    /// are exempt so a cancelled party can still write its final trace
    /// entry.
    pub fn record_event(&self, event: Event) -> Result<()> {
        log::trace!("party {}: {}", self.id, event);
        let terminal = event.is_terminal();
        let event_type = event.event_type();

        let hooks: Vec<TriggerAndHook> = {
            let mut gctx = self.gctx.borrow_mut();
            let id = self.id;
            gctx.traces[id].push(event);
            gctx.hooks
                .iter()
                .filter(|(trigger, _)| trigger.map_or(true, |t| t == event_type))
                .cloned()
                .collect()
        };

        let ctx = self.simulation_context();
        for (_, hook) in hooks {
            hook.run(self.id, &ctx);
        }

        if !terminal && self.gctx.borrow().cancellation.at(self.id) {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Records an event while unwinding; cancellation is already decided,
    /// so nothing can fail.
    pub fn record_terminal(&self, event: Event) {
        // the Err is impossible for terminal events.
        let _ = self.record_event(event);
    }

    /// Notes that bytes were posted towards `receiver` at `timestamp`.
    pub fn push_send(&self, receiver: usize, timestamp: Duration) {
        let cid = ChannelId::new(self.id, receiver);
        self.gctx
            .borrow_mut()
            .sends
            .entry(cid)
            .or_default()
            .push_back(timestamp);
    }

    /// The arrival time of `nbytes` sent to this party by `sender`:
    /// the posting time plus the channel's delivery delay, but never
    /// before `timestamp` (the receiving party cannot read data before it
    /// asks for it).
    pub fn recv_arrival(&self, sender: usize, nbytes: usize, timestamp: Duration) -> Duration {
        // the channel the remote party writes to.
        let cid = ChannelId::new(sender, self.id);
        let mut gctx = self.gctx.borrow_mut();
        let send_time = gctx
            .sends
            .get_mut(&cid)
            .and_then(VecDeque::pop_front)
            .unwrap_or(timestamp);

        let config = gctx.config.get(cid);
        timestamp.max(adjust_send_time(&config, send_time, nbytes))
    }

    /// Marks this party as being inside a receive from `other`.
    pub fn recv_start(&self, other: usize) {
        let mut gctx = self.gctx.borrow_mut();
        let id = self.id;
        gctx.recv_map[id].set(other, true);
    }

    /// Clears the receive mark again.
    pub fn recv_done(&self, other: usize) {
        let mut gctx = self.gctx.borrow_mut();
        let id = self.id;
        gctx.recv_map[id].set(other, false);
    }

    /// The public, hook-facing view of this party's context.
    pub fn simulation_context(&self) -> SimulationContext {
        SimulationContext {
            id: self.id,
            gctx: self.gctx.clone(),
        }
    }
}

/// What a [`Hook`](super::Hook) gets to see and do.
///
/// The context can read every party's trace and current time, and cancel
/// parties, including the one whose event fired the hook.
pub struct SimulationContext {
    id: usize,
    gctx: SharedContext,
}

impl SimulationContext {
    /// The trace of `party_id`, as recorded so far.
    pub fn trace(&self, party_id: usize) -> SimulationTrace {
        self.gctx.borrow().traces[party_id].clone()
    }

    /// The timestamp of `party_id`'s latest event, zero if there is none.
    pub fn current_time_of(&self, party_id: usize) -> Duration {
        self.gctx.borrow().traces[party_id]
            .last()
            .map(|event| event.timestamp)
            .unwrap_or(Duration::ZERO)
    }

    /// Whether `party_id`'s trace has ended.
    pub fn dead(&self, party_id: usize) -> bool {
        self.gctx.borrow().traces[party_id]
            .last()
            .map(Event::is_terminal)
            .unwrap_or(false)
    }

    /// Number of parties in the simulation.
    pub fn number_of_parties(&self) -> usize {
        self.gctx.borrow().n
    }

    /// Whether `receiver` is currently blocked in a receive from
    /// `sender`.
    pub fn receiving(&self, receiver: usize, sender: usize) -> bool {
        self.gctx.borrow().recv_map[receiver].at(sender)
    }

    /// Cancels a party.
    ///
    /// Cancelling another party makes the scheduler skip it from now on.
    /// Cancelling the calling hook's own party unwinds that party's
    /// protocol with [`Error::Cancelled`] once the hook returns.
    pub fn cancel(&self, party_id: usize) {
        self.gctx.borrow_mut().cancellation.set(party_id, true);
    }

    /// Cancels every party.
    pub fn cancel_simulation(&self) {
        let mut gctx = self.gctx.borrow_mut();
        for i in 0..gctx.n {
            gctx.cancellation.set(i, true);
        }
    }
}

/// Bits on the wire for `nbytes` of payload: TCP/IP adds a 40-byte header
/// per segment.
fn size_with_headers_bits(nbytes: usize, mss: usize) -> f64 {
    const TCP_IP_HEADER: usize = 40;
    let num_packets = (nbytes + mss - 1) / mss;
    (8 * (nbytes + num_packets * TCP_IP_HEADER)) as f64
}

fn rtt_seconds(config: &super::ChannelConfig) -> f64 {
    config.rtt() as f64 / 1e3
}

/// Throughput of a lossless channel: the window-limited rate, capped by
/// the link bandwidth.
fn throughput_no_loss(config: &super::ChannelConfig) -> f64 {
    let max_throughput = 8.0 * config.window_size() as f64 / rtt_seconds(config);
    max_throughput.min(config.bandwidth() as f64)
}

/// Throughput under loss, by the Mathis model:
/// `sqrt(3 / (2 * loss)) * 8 * MSS / RTT`.
fn throughput_loss(config: &super::ChannelConfig) -> f64 {
    let loss_term = (3.0 / (2.0 * config.packet_loss())).sqrt();
    loss_term * 8.0 * config.mss() as f64 / rtt_seconds(config)
}

/// Time for `n` payload bytes to arrive on a TCP channel.
pub(crate) fn recv_time_tcp(config: &super::ChannelConfig, n: usize) -> Duration {
    let total_size_bits = size_with_headers_bits(n, config.mss());
    let mut throughput = throughput_no_loss(config);
    if config.packet_loss() > 0.0 {
        throughput = throughput.min(throughput_loss(config));
    }

    let t = total_size_bits / throughput + rtt_seconds(config);
    Duration::from_secs_f64(t)
}

/// The virtual time at which data posted at `send_time` is deliverable.
fn adjust_send_time(
    config: &super::ChannelConfig,
    send_time: Duration,
    n: usize,
) -> Duration {
    match config.network_type() {
        NetworkType::Tcp => send_time + recv_time_tcp(config, n),
        NetworkType::Instant => send_time,
    }
}

#[cfg(test)]
mod tests {
    use super::super::config::{ChannelConfig, SimpleNetworkConfig};
    use super::*;

    fn fresh() -> PartyContext {
        let gctx = GlobalContext::create(2, Box::new(SimpleNetworkConfig), Vec::new());
        PartyContext { id: 0, gctx }
    }

    #[test]
    fn timestamps_grow_with_execution() {
        let ctx = fresh();
        assert_eq!(ctx.last_event_timestamp(), Duration::ZERO);

        ctx.start_clock();
        std::thread::sleep(Duration::from_millis(2));
        let elapsed = ctx.elapsed_time();
        assert!(elapsed >= Duration::from_millis(2));

        ctx.record_event(Event::stop(elapsed)).unwrap();
        assert_eq!(ctx.last_event_timestamp(), elapsed);
    }

    #[test]
    fn recv_arrival_accounts_for_the_network() {
        let ctx = fresh();
        let other = PartyContext {
            id: 1,
            gctx: ctx.gctx.clone(),
        };

        // party 1 posted 100 bytes at t = 10ms.
        other.push_send(0, Duration::from_millis(10));

        let arrival = ctx.recv_arrival(1, 100, Duration::from_millis(1));
        // one segment: 8 * 140 bits at the window rate, plus one RTT.
        let expected = Duration::from_millis(10) + recv_time_tcp(&ChannelConfig::default_tcp(), 100);
        assert_eq!(arrival, expected);
        assert!(arrival >= Duration::from_millis(110));

        // a slow receiver is bounded by its own ask time instead.
        other.push_send(0, Duration::ZERO);
        let arrival = ctx.recv_arrival(1, 100, Duration::from_secs(10));
        assert_eq!(arrival, Duration::from_secs(10));
    }

    #[test]
    fn tcp_recv_time_follows_the_model() {
        let config = ChannelConfig::default_tcp();
        // 1460 bytes => one segment => 12000 bits. Window rate is
        // 8 * 65536 / 0.1 = 5.24 Mbit/s, capped by the 1 Mbit/s link.
        let t = recv_time_tcp(&config, 1460);
        let expected = 12000.0 / 1e6 + 0.1;
        assert!((t.as_secs_f64() - expected).abs() < 1e-9);

        // loss caps throughput via the Mathis term.
        let lossy = ChannelConfig::builder()
            .packet_loss(0.25)
            .build()
            .unwrap();
        let mathis = (3.0f64 / 0.5).sqrt() * 8.0 * 1460.0 / 0.1;
        assert!(mathis < 1e6);
        let t = recv_time_tcp(&lossy, 1460);
        let expected = 12000.0 / mathis + 0.1;
        assert!((t.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn recv_map_tracks_pending_receives() {
        let ctx = fresh();
        let sim = ctx.simulation_context();

        assert!(!sim.receiving(0, 1));
        ctx.recv_start(1);
        assert!(sim.receiving(0, 1));
        ctx.recv_done(1);
        assert!(!sim.receiving(0, 1));
    }

    #[test]
    fn simulation_context_reads_and_cancels() {
        let ctx = fresh();
        ctx.record_event(Event::start()).unwrap();

        let sim = ctx.simulation_context();
        assert_eq!(sim.number_of_parties(), 2);
        assert_eq!(sim.trace(0).len(), 1);
        assert!(!sim.dead(0));
        assert_eq!(sim.current_time_of(1), Duration::ZERO);

        sim.cancel(1);
        assert!(ctx.gctx.borrow().cancellation.at(1));
        assert!(!ctx.gctx.borrow().cancellation.at(0));

        sim.cancel_simulation();
        assert!(ctx.gctx.borrow().cancellation.at(0));
    }

    #[test]
    fn self_cancellation_surfaces_on_the_next_event() {
        let ctx = fresh();
        ctx.simulation_context().cancel(0);

        let err = ctx
            .record_event(Event::output(Duration::ZERO))
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);

        // terminal events still go through, so the trace can end.
        ctx.record_terminal(Event::cancelled(Duration::ZERO));
        assert!(ctx.simulation_context().dead(0));
    }
}
