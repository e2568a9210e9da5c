//! Packet-oriented channels and the per-party view of a network.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::wire::Packet;
use crate::Result;

mod loopback;

pub use loopback::LoopbackChannel;

/// The future returned by the asynchronous channel operations.
///
/// Channel implementations capture what they need, so the future does not
/// borrow the channel.
pub type ChannelTask<T> = Pin<Box<dyn Future<Output = Result<T>>>>;

/// A bidirectional, packet-oriented connection to one peer.
///
/// Sends never block the party; receives suspend the calling coroutine
/// until a packet is available. Packets on one channel arrive in the
/// order they were sent.
pub trait Channel {
    /// Closes the channel.
    fn close(&self) -> Result<()>;

    /// Sends a packet to the peer.
    fn send(&self, packet: Packet) -> ChannelTask<()>;

    /// Sends a packet that is also going to other receivers.
    ///
    /// Implementations may share the underlying bytes between receivers;
    /// the default simply clones the packet.
    fn send_shared(&self, packet: &Packet) -> ChannelTask<()> {
        self.send(packet.clone())
    }

    /// Receives the next packet from the peer, suspending until one is
    /// there.
    fn recv(&self) -> ChannelTask<Packet>;

    /// Whether a packet is ready to be received right now.
    fn has_data(&self) -> ChannelTask<bool>;
}

/// One party's view of the network: a channel to every party, itself
/// included.
#[derive(Clone)]
pub struct Network {
    channels: Vec<Rc<dyn Channel>>,
    id: usize,
}

impl Network {
    /// A network from one channel per party. `id` is the owning party.
    pub fn new(channels: Vec<Rc<dyn Channel>>, id: usize) -> Self {
        Self { channels, id }
    }

    /// The channel to party `i`.
    pub fn party(&self, i: usize) -> &Rc<dyn Channel> {
        &self.channels[i]
    }

    /// Number of parties, this one included.
    pub fn size(&self) -> usize {
        self.channels.len()
    }

    /// The id of the party owning this view.
    pub fn my_id(&self) -> usize {
        self.id
    }

    /// Closes every channel, in party order.
    pub fn close(&self) -> Result<()> {
        for channel in &self.channels {
            channel.close()?;
        }
        Ok(())
    }

    /// Fully connected in-memory networks for `n` parties, one view per
    /// party. Useful for exercising protocols without a simulator.
    pub fn in_memory(n: usize) -> Vec<Network> {
        let mut grids: Vec<Vec<Option<Rc<dyn Channel>>>> = (0..n)
            .map(|_| (0..n).map(|_| None).collect())
            .collect();

        for i in 0..n {
            grids[i][i] = Some(LoopbackChannel::looped_back());
            for j in i + 1..n {
                let (ij, ji) = LoopbackChannel::paired();
                grids[i][j] = Some(ij);
                grids[j][i] = Some(ji);
            }
        }

        grids
            .into_iter()
            .enumerate()
            .map(|(id, row)| {
                Network::new(
                    row.into_iter()
                        .map(|c| c.expect("every pair is wired above"))
                        .collect(),
                    id,
                )
            })
            .collect()
    }
}
