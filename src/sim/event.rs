//! Events and event traces.
//!
//! Everything observable a party does during a simulation is recorded as
//! an [`Event`] with a virtual timestamp. The full, ordered list of one
//! party's events is its [`SimulationTrace`]: the canonical record of what
//! happened.

use std::fmt::{self, Display};
use std::io::{self, Write};
use std::time::Duration;

use serde_json::json;

/// Identifies one direction of a party-to-party connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId {
    /// The party holding this end of the channel.
    pub local: usize,
    /// The party on the other end.
    pub remote: usize,
}

impl ChannelId {
    /// A channel id.
    pub fn new(local: usize, remote: usize) -> Self {
        Self { local, remote }
    }

    /// The same connection, seen from the other end.
    pub fn flip(self) -> Self {
        Self {
            local: self.remote,
            remote: self.local,
        }
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{local={}, remote={}}}", self.local, self.remote)
    }
}

/// The kind of an event, without its payload. Used to pick which events
/// trigger a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// The party began executing.
    Start,
    /// The party finished normally.
    Stop,
    /// The party died from an error.
    Killed,
    /// The party cancelled itself.
    Cancelled,
    /// A channel was closed.
    Close,
    /// Data was handed to a channel.
    Send,
    /// Data was taken out of a channel.
    Recv,
    /// A channel was polled for pending data.
    HasData,
    /// The party slept.
    Sleep,
    /// A protocol produced output.
    Output,
    /// A protocol step began.
    ProtocolBegin,
    /// A protocol step ended.
    ProtocolEnd,
}

impl Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Killed => "KILLED",
            Self::Cancelled => "CANCELLED",
            Self::Close => "CLOSE",
            Self::Send => "SEND",
            Self::Recv => "RECV",
            Self::HasData => "HAS_DATA",
            Self::Sleep => "SLEEP",
            Self::Output => "OUTPUT",
            Self::ProtocolBegin => "PROTOCOL_BEGIN",
            Self::ProtocolEnd => "PROTOCOL_END",
        };
        write!(f, "{name}")
    }
}

/// An event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// See [`EventType::Start`].
    Start,
    /// See [`EventType::Stop`].
    Stop,
    /// See [`EventType::Killed`]; carries the error message.
    Killed {
        /// Why the party died.
        reason: String,
    },
    /// See [`EventType::Cancelled`].
    Cancelled,
    /// See [`EventType::Close`].
    Close {
        /// The channel that was closed.
        channel_id: ChannelId,
    },
    /// See [`EventType::Send`].
    Send {
        /// The channel written to.
        channel_id: ChannelId,
        /// Bytes handed over, including framing.
        amount: usize,
    },
    /// See [`EventType::Recv`].
    Recv {
        /// The channel read from.
        channel_id: ChannelId,
        /// Bytes taken out, including framing.
        amount: usize,
    },
    /// See [`EventType::HasData`].
    HasData {
        /// The channel polled.
        channel_id: ChannelId,
    },
    /// See [`EventType::Sleep`].
    Sleep {
        /// How long the party slept.
        duration: Duration,
    },
    /// See [`EventType::Output`].
    Output,
    /// See [`EventType::ProtocolBegin`].
    ProtocolBegin {
        /// Name of the protocol step.
        name: String,
    },
    /// See [`EventType::ProtocolEnd`].
    ProtocolEnd {
        /// Name of the protocol step.
        name: String,
    },
}

/// A timestamped event in a party's trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// When it happened, on the party's virtual clock.
    pub timestamp: Duration,
}

impl Event {
    /// The START event; always at time zero.
    pub fn start() -> Self {
        Self {
            kind: EventKind::Start,
            timestamp: Duration::ZERO,
        }
    }

    /// A STOP event.
    pub fn stop(timestamp: Duration) -> Self {
        Self {
            kind: EventKind::Stop,
            timestamp,
        }
    }

    /// A KILLED event with the fatal error's message.
    pub fn killed(timestamp: Duration, reason: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Killed {
                reason: reason.into(),
            },
            timestamp,
        }
    }

    /// A CANCELLED event.
    pub fn cancelled(timestamp: Duration) -> Self {
        Self {
            kind: EventKind::Cancelled,
            timestamp,
        }
    }

    /// A CLOSE event for a channel.
    pub fn close_channel(timestamp: Duration, channel_id: ChannelId) -> Self {
        Self {
            kind: EventKind::Close { channel_id },
            timestamp,
        }
    }

    /// A SEND event for `amount` bytes on a channel.
    pub fn send_data(timestamp: Duration, channel_id: ChannelId, amount: usize) -> Self {
        Self {
            kind: EventKind::Send { channel_id, amount },
            timestamp,
        }
    }

    /// A RECV event for `amount` bytes on a channel.
    pub fn recv_data(timestamp: Duration, channel_id: ChannelId, amount: usize) -> Self {
        Self {
            kind: EventKind::Recv { channel_id, amount },
            timestamp,
        }
    }

    /// A HAS_DATA event for a channel.
    pub fn has_data(timestamp: Duration, channel_id: ChannelId) -> Self {
        Self {
            kind: EventKind::HasData { channel_id },
            timestamp,
        }
    }

    /// A SLEEP event. The timestamp records when the sleep *ends*:
    /// `timestamp + duration`.
    pub fn sleep(timestamp: Duration, duration: Duration) -> Self {
        Self {
            kind: EventKind::Sleep { duration },
            timestamp: timestamp + duration,
        }
    }

    /// An OUTPUT event.
    pub fn output(timestamp: Duration) -> Self {
        Self {
            kind: EventKind::Output,
            timestamp,
        }
    }

    /// A PROTOCOL_BEGIN event.
    pub fn protocol_begin(timestamp: Duration, name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::ProtocolBegin { name: name.into() },
            timestamp,
        }
    }

    /// A PROTOCOL_END event.
    pub fn protocol_end(timestamp: Duration, name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::ProtocolEnd { name: name.into() },
            timestamp,
        }
    }

    /// The kind of the event, payload stripped.
    pub fn event_type(&self) -> EventType {
        match &self.kind {
            EventKind::Start => EventType::Start,
            EventKind::Stop => EventType::Stop,
            EventKind::Killed { .. } => EventType::Killed,
            EventKind::Cancelled => EventType::Cancelled,
            EventKind::Close { .. } => EventType::Close,
            EventKind::Send { .. } => EventType::Send,
            EventKind::Recv { .. } => EventType::Recv,
            EventKind::HasData { .. } => EventType::HasData,
            EventKind::Sleep { .. } => EventType::Sleep,
            EventKind::Output => EventType::Output,
            EventKind::ProtocolBegin { .. } => EventType::ProtocolBegin,
            EventKind::ProtocolEnd { .. } => EventType::ProtocolEnd,
        }
    }

    /// Whether this event ends a trace.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.event_type(),
            EventType::Stop | EventType::Killed | EventType::Cancelled
        )
    }

    fn to_json(&self) -> serde_json::Value {
        let metadata = match &self.kind {
            EventKind::Killed { reason } => json!({ "reason": reason }),
            EventKind::Close { channel_id } | EventKind::HasData { channel_id } => {
                json!({ "channel_id": channel_id_json(channel_id) })
            }
            EventKind::Send { channel_id, amount } | EventKind::Recv { channel_id, amount } => {
                json!({ "channel_id": channel_id_json(channel_id), "amount": amount })
            }
            EventKind::Sleep { duration } => json!({ "duration": to_millis(*duration) }),
            EventKind::ProtocolBegin { name } | EventKind::ProtocolEnd { name } => {
                json!({ "name": name })
            }
            _ => json!({}),
        };

        json!({
            "timestamp": to_millis(self.timestamp),
            "type": self.event_type().to_string(),
            "metadata": metadata,
        })
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

fn channel_id_json(cid: &ChannelId) -> serde_json::Value {
    json!({ "local": cid.local, "remote": cid.remote })
}

/// A duration in milliseconds, fractional part kept.
pub fn to_millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1e3
}

/// The ordered list of events one party produced during a simulation run.
pub type SimulationTrace = Vec<Event>;

/// Writes a trace as a JSON array, one object per event, shaped
/// `{"timestamp": <ms>, "type": "<NAME>", "metadata": {...}}`.
pub fn write_trace(stream: &mut impl Write, trace: &SimulationTrace) -> io::Result<()> {
    let entries: Vec<serde_json::Value> = trace.iter().map(Event::to_json).collect();
    write!(stream, "{}", serde_json::Value::Array(entries))
}
