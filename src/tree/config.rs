use crate::spin_lock::SpinPolicy;
use std::num::NonZeroUsize;
use std::thread;

/// Configuration of [`Tree::build_concurrent`](super::Tree::build_concurrent).
///
/// Device agents are threads whose insertions carry [`Origin::Device`](super::Origin::Device);
/// they exercise the mixed-origin tagging without any device runtime.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BuildConfig {
    /// Number of host agents.
    pub host_agents: usize,
    /// Number of device agents.
    pub device_agents: usize,
    /// How agents wait on a contended node lock.
    pub spin: SpinPolicy,
}

impl BuildConfig {
    /// Creates a [`BuildConfig`] with `host_agents` host agents and no device agent.
    #[inline]
    pub const fn with_host_agents(host_agents: usize) -> Self {
        Self {
            host_agents,
            device_agents: 0,
            spin: SpinPolicy::Spin,
        }
    }

    /// Sets the number of device agents.
    #[inline]
    #[must_use]
    pub const fn device_agents(mut self, device_agents: usize) -> Self {
        self.device_agents = device_agents;
        self
    }

    /// Sets the [`SpinPolicy`].
    #[inline]
    #[must_use]
    pub const fn spin(mut self, spin: SpinPolicy) -> Self {
        self.spin = spin;
        self
    }

    /// Returns the total number of agents.
    #[inline]
    pub const fn agents(&self) -> usize {
        self.host_agents + self.device_agents
    }
}

impl Default for BuildConfig {
    /// One host agent per available hardware thread.
    fn default() -> Self {
        Self::with_host_agents(thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }
}
