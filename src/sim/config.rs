//! Per-channel network characteristics.

use std::fmt::{self, Display};

use super::ChannelId;
use crate::{Error, Result};

/// Whether a channel models a TCP link or delivers instantly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    /// Delivery time follows the TCP throughput model.
    Tcp,
    /// Delivery is immediate; used for a party talking to itself.
    Instant,
}

/// The network characteristics of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    bandwidth: usize,
    rtt: usize,
    mss: usize,
    packet_loss: f64,
    window_size: usize,
    network_type: NetworkType,
}

impl ChannelConfig {
    /// Default bandwidth, in bits per second.
    pub const DEFAULT_BANDWIDTH: usize = 1_000_000;
    /// Default round-trip time, in milliseconds.
    pub const DEFAULT_RTT: usize = 100;
    /// Default maximum segment size, in bytes.
    pub const DEFAULT_MSS: usize = 1460;
    /// Default packet loss, as a fraction in `[0, 1)`.
    pub const DEFAULT_PACKET_LOSS: f64 = 0.0;
    /// Default TCP window size, in bytes.
    pub const DEFAULT_WINDOW_SIZE: usize = 65_536;

    /// A TCP channel with every knob at its default.
    pub fn default_tcp() -> Self {
        Self::builder().build().expect("defaults are valid")
    }

    /// An instant channel, as used between a party and itself.
    pub fn loopback() -> Self {
        Self {
            bandwidth: Self::DEFAULT_BANDWIDTH,
            rtt: 0,
            mss: Self::DEFAULT_MSS,
            packet_loss: 0.0,
            window_size: Self::DEFAULT_WINDOW_SIZE,
            network_type: NetworkType::Instant,
        }
    }

    /// A builder starting from the defaults.
    pub fn builder() -> ChannelConfigBuilder {
        ChannelConfigBuilder::default()
    }

    /// Link bandwidth in bits per second.
    pub fn bandwidth(&self) -> usize {
        self.bandwidth
    }

    /// Round-trip time in milliseconds.
    pub fn rtt(&self) -> usize {
        self.rtt
    }

    /// Maximum segment size in bytes.
    pub fn mss(&self) -> usize {
        self.mss
    }

    /// Packet loss as a fraction in `[0, 1)`.
    pub fn packet_loss(&self) -> f64 {
        self.packet_loss
    }

    /// TCP window size in bytes.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// The channel type.
    pub fn network_type(&self) -> NetworkType {
        self.network_type
    }
}

impl Display for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SimulationConfig{{bandwidth={}, rtt={}, mss={}, packet_loss={}, window_size={}}}",
            self.bandwidth, self.rtt, self.mss, self.packet_loss, self.window_size
        )
    }
}

/// Builder for [`ChannelConfig`]; unset knobs fall back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct ChannelConfigBuilder {
    bandwidth: Option<usize>,
    rtt: Option<usize>,
    mss: Option<usize>,
    packet_loss: Option<f64>,
    window_size: Option<usize>,
    network_type: Option<NetworkType>,
}

impl ChannelConfigBuilder {
    /// Sets the bandwidth in bits per second.
    pub fn bandwidth(mut self, bandwidth: usize) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    /// Sets the round-trip time in milliseconds.
    pub fn rtt(mut self, rtt: usize) -> Self {
        self.rtt = Some(rtt);
        self
    }

    /// Sets the maximum segment size in bytes.
    pub fn mss(mut self, mss: usize) -> Self {
        self.mss = Some(mss);
        self
    }

    /// Sets the packet loss fraction.
    pub fn packet_loss(mut self, packet_loss: f64) -> Self {
        self.packet_loss = Some(packet_loss);
        self
    }

    /// Sets the TCP window size in bytes.
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = Some(window_size);
        self
    }

    /// Sets the channel type.
    pub fn network_type(mut self, network_type: NetworkType) -> Self {
        self.network_type = Some(network_type);
        self
    }

    /// Validates and builds the config.
    pub fn build(self) -> Result<ChannelConfig> {
        let packet_loss = self.packet_loss.unwrap_or(ChannelConfig::DEFAULT_PACKET_LOSS);
        if !(0.0..1.0).contains(&packet_loss) {
            return Err(Error::InvalidInput("packet loss must be in [0, 1)"));
        }
        let mss = self.mss.unwrap_or(ChannelConfig::DEFAULT_MSS);
        if mss == 0 {
            return Err(Error::InvalidInput("mss cannot be 0"));
        }

        Ok(ChannelConfig {
            bandwidth: self.bandwidth.unwrap_or(ChannelConfig::DEFAULT_BANDWIDTH),
            rtt: self.rtt.unwrap_or(ChannelConfig::DEFAULT_RTT),
            mss,
            packet_loss,
            window_size: self.window_size.unwrap_or(ChannelConfig::DEFAULT_WINDOW_SIZE),
            network_type: self.network_type.unwrap_or(NetworkType::Tcp),
        })
    }
}

/// Maps channel ids to channel configurations.
pub trait NetworkConfig {
    /// The configuration of the channel `cid`.
    fn get(&self, cid: ChannelId) -> ChannelConfig;
}

/// The simplest useful configuration: default TCP between distinct
/// parties, instant delivery from a party to itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleNetworkConfig;

impl NetworkConfig for SimpleNetworkConfig {
    fn get(&self, cid: ChannelId) -> ChannelConfig {
        if cid.local == cid.remote {
            ChannelConfig::loopback()
        } else {
            ChannelConfig::default_tcp()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ChannelConfig::default_tcp();
        assert_eq!(cfg.bandwidth(), 1_000_000);
        assert_eq!(cfg.rtt(), 100);
        assert_eq!(cfg.mss(), 1460);
        assert_eq!(cfg.packet_loss(), 0.0);
        assert_eq!(cfg.window_size(), 65_536);
        assert_eq!(cfg.network_type(), NetworkType::Tcp);
    }

    #[test]
    fn builder_overrides() {
        let cfg = ChannelConfig::builder()
            .bandwidth(5_000_000)
            .rtt(20)
            .packet_loss(0.01)
            .build()
            .unwrap();
        assert_eq!(cfg.bandwidth(), 5_000_000);
        assert_eq!(cfg.rtt(), 20);
        assert_eq!(cfg.packet_loss(), 0.01);
        assert_eq!(cfg.mss(), 1460);
    }

    #[test]
    fn builder_rejects_nonsense() {
        assert!(ChannelConfig::builder().packet_loss(1.0).build().is_err());
        assert!(ChannelConfig::builder().packet_loss(-0.1).build().is_err());
        assert!(ChannelConfig::builder().mss(0).build().is_err());
    }

    #[test]
    fn simple_network_config() {
        let cfg = SimpleNetworkConfig;
        assert_eq!(
            cfg.get(ChannelId::new(0, 0)).network_type(),
            NetworkType::Instant
        );
        assert_eq!(
            cfg.get(ChannelId::new(0, 1)).network_type(),
            NetworkType::Tcp
        );
    }
}
