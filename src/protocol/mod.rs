//! The protocol abstraction: a step of computation that yields a result
//! and, possibly, the next protocol to run.
//!
//! A protocol is an object whose [`Protocol::run`] consumes it and
//! returns a future producing a [`ProtocolResult`]: an optional successor
//! protocol and an optional output value. The evaluator keeps following
//! successors until none is left:
//!
//! ```text
//! while protocol != none:
//!     result = await protocol.run(env)
//!     if result.output: output_callback(result.output)
//!     protocol = result.next_protocol
//! ```
//!
//! The environment hands a protocol its view of the network and a clock;
//! under the simulator the clock reads virtual time.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::net::Network;
use crate::{Error, Result};

/// The name reported by protocols that do not bother naming themselves.
pub const DEFAULT_NAME: &str = "UNNAMED";

/// An output produced by a protocol. Type-erased; the manager or caller
/// downcasts it.
pub type ProtocolOutput = Box<dyn Any>;

/// The future returned by [`Protocol::run`].
pub type ProtocolFuture = Pin<Box<dyn Future<Output = Result<ProtocolResult>>>>;

/// One step of a multiparty protocol.
pub trait Protocol {
    /// Runs this step to completion.
    fn run(self: Box<Self>, env: Env) -> ProtocolFuture;

    /// A human-readable name, used in event traces.
    fn name(&self) -> String {
        DEFAULT_NAME.to_string()
    }
}

/// What a protocol step left behind.
pub struct ProtocolResult {
    /// The protocol to run next, if any.
    pub next_protocol: Option<Box<dyn Protocol>>,
    /// An output value, if the step produced one.
    pub output: Option<ProtocolOutput>,
}

impl ProtocolResult {
    /// Neither a successor nor an output: the party is done.
    pub fn stop() -> Self {
        Self {
            next_protocol: None,
            output: None,
        }
    }

    /// Terminal step with an output value.
    pub fn done<T: 'static>(output: T) -> Self {
        Self {
            next_protocol: None,
            output: Some(Box::new(output)),
        }
    }

    /// Continue with a successor protocol.
    pub fn next(protocol: impl Protocol + 'static) -> Self {
        Self {
            next_protocol: Some(Box::new(protocol)),
            output: None,
        }
    }

    /// Continue with a successor protocol and emit an output now.
    pub fn next_with_output<T: 'static>(protocol: impl Protocol + 'static, output: T) -> Self {
        Self {
            next_protocol: Some(Box::new(protocol)),
            output: Some(Box::new(output)),
        }
    }
}

impl fmt::Debug for ProtocolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolResult")
            .field("next_protocol", &self.next_protocol.as_ref().map(|p| p.name()))
            .field("has_output", &self.output.is_some())
            .finish()
    }
}

/// Reads the time a party has spent, in whatever notion of time the
/// execution environment has.
pub trait Clock {
    /// Time elapsed since the party started.
    fn read(&self) -> Duration;
}

/// A [`Clock`] over the machine's monotonic wall clock.
pub struct RealClock {
    start: Instant,
}

impl RealClock {
    /// A clock starting now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for RealClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RealClock {
    fn read(&self) -> Duration {
        self.start.elapsed()
    }
}

/// The environment a protocol runs in.
#[derive(Clone)]
pub struct Env {
    /// This party's view of the network.
    pub network: Network,
    /// This party's clock.
    pub clock: Rc<dyn Clock>,
}

impl Env {
    /// An environment over a network, with real time.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            clock: Rc::new(RealClock::new()),
        }
    }

    pub(crate) fn with_clock(network: Network, clock: Rc<dyn Clock>) -> Self {
        Self { network, clock }
    }
}

/// Evaluates a protocol chain, feeding every output to `output_callback`.
pub async fn evaluate(
    protocol: Box<dyn Protocol>,
    env: Env,
    mut output_callback: impl FnMut(ProtocolOutput),
) -> Result<()> {
    let mut next = Some(protocol);
    while let Some(protocol) = next {
        let result = protocol.run(env.clone()).await?;
        if let Some(output) = result.output {
            output_callback(output);
        }
        next = result.next_protocol;
    }
    Ok(())
}

/// Evaluates a protocol chain and returns its final output, downcast to
/// `R`.
///
/// Fails with [`Error::InvalidInput`] when the chain finishes without an
/// output or with an output of a different type.
pub async fn evaluate_result<R: 'static>(protocol: Box<dyn Protocol>, env: Env) -> Result<R> {
    let mut last = None;
    let mut next = Some(protocol);
    while let Some(protocol) = next {
        let result = protocol.run(env.clone()).await?;
        if let Some(output) = result.output {
            last = Some(output);
        }
        next = result.next_protocol;
    }
    last.ok_or(Error::InvalidInput("protocol did not produce any result"))?
        .downcast::<R>()
        .map(|b| *b)
        .map_err(|_| Error::InvalidInput("protocol output has a different type"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use crate::wire::Packet;

    /// Sends a number to the peer, receives theirs, outputs the sum.
    struct ExchangeAndAdd {
        me: usize,
        value: u32,
    }

    impl Protocol for ExchangeAndAdd {
        fn run(self: Box<Self>, env: Env) -> ProtocolFuture {
            Box::pin(async move {
                let peer = 1 - self.me;
                let mut packet = Packet::new();
                packet.write(&self.value);
                env.network.party(peer).send(packet).await?;

                let mut reply = env.network.party(peer).recv().await?;
                let theirs = reply.read::<u32>()?;
                Ok(ProtocolResult::done(self.value + theirs))
            })
        }

        fn name(&self) -> String {
            "exchange_and_add".to_string()
        }
    }

    /// Counts down through successor protocols, emitting each value.
    struct Countdown(u32);

    impl Protocol for Countdown {
        fn run(self: Box<Self>, _env: Env) -> ProtocolFuture {
            Box::pin(async move {
                if self.0 == 0 {
                    Ok(ProtocolResult::stop())
                } else {
                    Ok(ProtocolResult::next_with_output(Countdown(self.0 - 1), self.0))
                }
            })
        }
    }

    #[test]
    fn two_party_exchange() {
        let rt = Runtime::new();
        let mut nets = Network::in_memory(2);
        let env1 = Env::new(nets.pop().unwrap());
        let env0 = Env::new(nets.pop().unwrap());

        let t0 = rt.spawn(evaluate_result::<u32>(
            Box::new(ExchangeAndAdd { me: 0, value: 30 }),
            env0,
        ));
        let t1 = rt.spawn(evaluate_result::<u32>(
            Box::new(ExchangeAndAdd { me: 1, value: 12 }),
            env1,
        ));

        let (a, b) = rt.run(async move { (t0.await, t1.await) });
        assert_eq!(a.unwrap(), 42);
        assert_eq!(b.unwrap(), 42);
    }

    #[test]
    fn chained_protocols_emit_outputs_in_order() {
        let rt = Runtime::new();
        let mut nets = Network::in_memory(1);
        let env = Env::new(nets.pop().unwrap());

        let outputs = rt.run(async move {
            let mut seen = Vec::new();
            evaluate(Box::new(Countdown(3)), env, |out| {
                seen.push(*out.downcast::<u32>().unwrap());
            })
            .await
            .unwrap();
            seen
        });
        assert_eq!(outputs, vec![3, 2, 1]);
    }

    #[test]
    fn missing_output_is_an_error() {
        let rt = Runtime::new();
        let mut nets = Network::in_memory(1);
        let env = Env::new(nets.pop().unwrap());
        let out = rt.run(evaluate_result::<u32>(Box::new(Countdown(0)), env));
        assert!(out.is_err());
    }

    #[test]
    fn default_name() {
        assert_eq!(Countdown(1).name(), DEFAULT_NAME);
    }
}
