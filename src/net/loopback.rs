//! In-memory channels.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{Channel, ChannelTask};
use crate::runtime::suspend_until;
use crate::wire::Packet;
use crate::Result;

type Buffer = Rc<RefCell<VecDeque<Packet>>>;

/// A channel backed by in-process queues instead of a network.
///
/// Two constructors: [`LoopbackChannel::looped_back`] wires the channel to
/// itself (sends come back on the same channel), and
/// [`LoopbackChannel::paired`] produces the two endpoints of a
/// bidirectional link.
pub struct LoopbackChannel {
    reads_from: Buffer,
    writes_to: Buffer,
}

impl LoopbackChannel {
    /// A channel that receives its own sends.
    pub fn looped_back() -> Rc<Self> {
        let buf: Buffer = Rc::default();
        Rc::new(Self {
            reads_from: buf.clone(),
            writes_to: buf,
        })
    }

    /// The two ends of a link: what one sends, the other receives.
    pub fn paired() -> (Rc<Self>, Rc<Self>) {
        let ab: Buffer = Rc::default();
        let ba: Buffer = Rc::default();
        let a = Rc::new(Self {
            reads_from: ba.clone(),
            writes_to: ab.clone(),
        });
        let b = Rc::new(Self {
            reads_from: ab,
            writes_to: ba,
        });
        (a, b)
    }
}

impl Channel for LoopbackChannel {
    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn send(&self, packet: Packet) -> ChannelTask<()> {
        let writes_to = self.writes_to.clone();
        Box::pin(async move {
            writes_to.borrow_mut().push_back(packet);
            Ok(())
        })
    }

    fn recv(&self) -> ChannelTask<Packet> {
        let reads_from = self.reads_from.clone();
        Box::pin(async move {
            {
                let reads_from = reads_from.clone();
                suspend_until(move || !reads_from.borrow().is_empty()).await;
            }
            let packet = reads_from
                .borrow_mut()
                .pop_front()
                .expect("scheduler resumed on a non-empty buffer");
            Ok(packet)
        })
    }

    fn has_data(&self) -> ChannelTask<bool> {
        let reads_from = self.reads_from.clone();
        Box::pin(async move { Ok(!reads_from.borrow().is_empty()) })
    }
}
