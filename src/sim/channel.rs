//! The simulated rendering of [`Channel`].

use std::cell::RefCell;
use std::rc::Rc;

use super::context::PartyContext;
use super::event::Event;
use super::transport::Transport;
use super::ChannelId;
use crate::net::{Channel, ChannelTask};
use crate::runtime::suspend_until;
use crate::wire::{Packet, SIZE_PREFIX_BYTES};
use crate::Result;

/// A channel whose operations cost virtual time instead of I/O.
///
/// Sends never suspend: they record a SEND event, note the posting time
/// and hand the packet to the transport. Receives suspend until the
/// transport holds a packet, then compute the arrival time from the
/// channel's network configuration and restart the party's clock there.
pub(crate) struct SimulatedChannel {
    cid: ChannelId,
    ctx: PartyContext,
    transport: Rc<RefCell<Transport>>,
}

impl SimulatedChannel {
    pub fn new(cid: ChannelId, ctx: PartyContext, transport: Rc<RefCell<Transport>>) -> Self {
        Self {
            cid,
            ctx,
            transport,
        }
    }

    /// Bytes a packet occupies on the wire: its length prefix plus the
    /// payload.
    fn wire_size(packet: &Packet) -> usize {
        SIZE_PREFIX_BYTES + packet.size() as usize
    }

    fn send_inner(&self, packet: Packet, shared: bool) -> Result<()> {
        let amount = Self::wire_size(&packet);
        let timestamp = self.ctx.elapsed_time();
        self.ctx
            .record_event(Event::send_data(timestamp, self.cid, amount))?;
        self.ctx.push_send(self.cid.remote, timestamp);

        let mut transport = self.transport.borrow_mut();
        if shared {
            transport.send_shared(self.cid, &packet);
        } else {
            transport.send(self.cid, packet);
        }
        Ok(())
    }
}

impl Channel for SimulatedChannel {
    fn close(&self) -> Result<()> {
        let timestamp = self.ctx.elapsed_time();
        self.ctx
            .record_event(Event::close_channel(timestamp, self.cid))
    }

    fn send(&self, packet: Packet) -> ChannelTask<()> {
        let this = self.clone();
        Box::pin(async move { this.send_inner(packet, false) })
    }

    fn send_shared(&self, packet: &Packet) -> ChannelTask<()> {
        let this = self.clone();
        let packet = packet.clone();
        Box::pin(async move { this.send_inner(packet, true) })
    }

    fn recv(&self) -> ChannelTask<Packet> {
        let this = self.clone();
        Box::pin(async move {
            let sender = this.cid.remote;
            this.ctx.recv_start(sender);

            {
                let transport = this.transport.clone();
                let cid = this.cid;
                suspend_until(move || transport.borrow().has_data(cid)).await;
            }

            let packet = this
                .transport
                .borrow_mut()
                .recv(this.cid)
                .expect("scheduler resumed on a non-empty channel");

            let amount = Self::wire_size(&packet);
            let arrival = this
                .ctx
                .recv_arrival(sender, amount, this.ctx.elapsed_time());
            this.ctx
                .record_event(Event::recv_data(arrival, this.cid, amount))?;
            // the party continues from the arrival time.
            this.ctx.start_clock();

            this.ctx.recv_done(sender);
            Ok(packet)
        })
    }

    fn has_data(&self) -> ChannelTask<bool> {
        let this = self.clone();
        Box::pin(async move {
            let timestamp = this.ctx.elapsed_time();
            this.ctx
                .record_event(Event::has_data(timestamp, this.cid))?;
            Ok(this.transport.borrow().has_data(this.cid))
        })
    }
}

impl Clone for SimulatedChannel {
    fn clone(&self) -> Self {
        Self {
            cid: self.cid,
            ctx: self.ctx.clone(),
            transport: self.transport.clone(),
        }
    }
}
