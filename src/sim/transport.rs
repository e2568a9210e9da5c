//! The central in-memory packet store of a simulation.

use std::collections::{HashMap, VecDeque};

use super::ChannelId;
use crate::wire::Packet;

/// Either a packet moved into the store, or an index into the shared pool
/// for packets sent by reference to several receivers.
enum PktOrIdx {
    Packet(Packet),
    Index(usize),
}

struct PoolEntry {
    packet: Packet,
    /// Receivers still waiting to pick the packet up.
    count: usize,
}

/// The simulation's transport: every in-flight packet lives here.
///
/// Moved packets go straight into the receiving channel's queue. Packets
/// sent by reference are pooled once and reference-counted, so that a
/// broadcast of one large packet is stored a single time.
#[derive(Default)]
pub(crate) struct Transport {
    channels: HashMap<ChannelId, VecDeque<PktOrIdx>>,
    pool: Vec<Option<PoolEntry>>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `packet` for the receiving end of `cid`.
    pub fn send(&mut self, cid: ChannelId, packet: Packet) {
        self.channels
            .entry(cid.flip())
            .or_default()
            .push_back(PktOrIdx::Packet(packet));
    }

    /// Queues a shared `packet` for the receiving end of `cid`.
    ///
    /// If an identical packet is already pooled its reference count goes
    /// up; otherwise the packet enters the pool with a count of one.
    pub fn send_shared(&mut self, cid: ChannelId, packet: &Packet) {
        let index = match self.find_pooled(packet) {
            Some(index) => {
                let entry = self.pool[index]
                    .as_mut()
                    .expect("find_pooled only returns live entries");
                entry.count += 1;
                index
            }
            None => self.insert_pooled(packet.clone()),
        };
        self.channels
            .entry(cid.flip())
            .or_default()
            .push_back(PktOrIdx::Index(index));
    }

    /// Whether the receiving end of `cid` has a packet waiting.
    pub fn has_data(&self, cid: ChannelId) -> bool {
        self.channels
            .get(&cid)
            .map(|queue| !queue.is_empty())
            .unwrap_or(false)
    }

    /// Pops the next packet for the receiving end of `cid`.
    ///
    /// Returns `None` when nothing is queued.
    pub fn recv(&mut self, cid: ChannelId) -> Option<Packet> {
        let entry = self.channels.get_mut(&cid)?.pop_front()?;
        Some(match entry {
            PktOrIdx::Packet(packet) => packet,
            PktOrIdx::Index(index) => {
                let slot = self.pool[index]
                    .as_mut()
                    .expect("queued index points at a live entry");
                slot.count -= 1;
                if slot.count == 0 {
                    let entry = self.pool[index]
                        .take()
                        .expect("checked as live just above");
                    entry.packet
                } else {
                    slot.packet.clone()
                }
            }
        })
    }

    fn find_pooled(&self, packet: &Packet) -> Option<usize> {
        self.pool.iter().position(|entry| {
            entry
                .as_ref()
                .map(|e| &e.packet == packet)
                .unwrap_or(false)
        })
    }

    fn insert_pooled(&mut self, packet: Packet) -> usize {
        let entry = PoolEntry { packet, count: 1 };
        match self.pool.iter().position(Option::is_none) {
            Some(free) => {
                self.pool[free] = Some(entry);
                free
            }
            None => {
                self.pool.push(Some(entry));
                self.pool.len() - 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(tag: u32) -> Packet {
        let mut p = Packet::new();
        p.write(&tag);
        p
    }

    #[test]
    fn moved_packets_travel_to_the_flipped_channel() {
        let mut transport = Transport::new();
        let cid = ChannelId::new(0, 1);

        transport.send(cid, packet(7));
        assert!(transport.has_data(cid.flip()));
        assert!(!transport.has_data(cid));

        let mut got = transport.recv(cid.flip()).unwrap();
        assert_eq!(got.read::<u32>().unwrap(), 7);
        assert!(!transport.has_data(cid.flip()));
        assert!(transport.recv(cid.flip()).is_none());
    }

    #[test]
    fn fifo_order_per_channel() {
        let mut transport = Transport::new();
        let cid = ChannelId::new(0, 1);
        transport.send(cid, packet(1));
        transport.send(cid, packet(2));

        let rx = cid.flip();
        assert_eq!(transport.recv(rx).unwrap().read::<u32>().unwrap(), 1);
        assert_eq!(transport.recv(rx).unwrap().read::<u32>().unwrap(), 2);
    }

    #[test]
    fn shared_packets_are_pooled_once() {
        let mut transport = Transport::new();
        let p = packet(42);

        transport.send_shared(ChannelId::new(0, 1), &p);
        transport.send_shared(ChannelId::new(0, 2), &p);
        assert_eq!(transport.pool.iter().flatten().count(), 1);
        assert_eq!(transport.pool[0].as_ref().unwrap().count, 2);

        let mut got = transport.recv(ChannelId::new(1, 0)).unwrap();
        assert_eq!(got.read::<u32>().unwrap(), 42);
        assert_eq!(transport.pool[0].as_ref().unwrap().count, 1);

        let mut got = transport.recv(ChannelId::new(2, 0)).unwrap();
        assert_eq!(got.read::<u32>().unwrap(), 42);
        // fully received packets leave the pool, and the slot is reused.
        assert!(transport.pool[0].is_none());
        transport.send_shared(ChannelId::new(0, 1), &packet(9));
        assert!(transport.pool[0].is_some());
    }
}
