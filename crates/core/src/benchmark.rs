// Read-latency benchmark
//
// Two phases, four scenarios each:
//
//   direct (bypass list applied)      proxy (no bypass)
//   ├─ plain       / eventual         ├─ plain       / eventual
//   ├─ plain       / strong           ├─ plain       / strong
//   ├─ keep-alive  / eventual         ├─ keep-alive  / eventual
//   └─ keep-alive  / strong           └─ keep-alive  / strong
//
// Each phase connects its own pair of clients and drops them before the next
// phase starts, so the bypass list never outlives the phase that set it.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::item::{GetItemRequest, ReadConsistency};
use crate::timing::{measure, Measurement};
use crate::traits::{ItemReader, StoreConnector};
use crate::transport::{ClientProfile, ProxyBypassList};

/// Proxy routing for one pass over the scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyPhase {
    /// Bypass list applied; listed hosts are reached directly
    Direct,
    /// No bypass; everything goes through the proxy when one is configured
    Proxied,
}

impl ProxyPhase {
    pub const ALL: [ProxyPhase; 2] = [ProxyPhase::Direct, ProxyPhase::Proxied];

    /// Bypass list in effect during this phase
    pub fn bypass(self, configured: &ProxyBypassList) -> ProxyBypassList {
        match self {
            ProxyPhase::Direct => configured.clone(),
            ProxyPhase::Proxied => ProxyBypassList::default(),
        }
    }
}

impl fmt::Display for ProxyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyPhase::Direct => write!(f, "direct"),
            ProxyPhase::Proxied => write!(f, "proxy"),
        }
    }
}

/// One timed loop: which client, which consistency, which phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scenario {
    pub phase: ProxyPhase,
    pub profile: ClientProfile,
    pub consistency: ReadConsistency,
}

impl Scenario {
    /// Scenarios of a phase in execution order
    pub fn for_phase(phase: ProxyPhase) -> [Scenario; 4] {
        let scenario = |profile, consistency| Scenario {
            phase,
            profile,
            consistency,
        };
        [
            scenario(ClientProfile::Plain, ReadConsistency::Eventual),
            scenario(ClientProfile::Plain, ReadConsistency::Strong),
            scenario(ClientProfile::KeepAlive, ReadConsistency::Eventual),
            scenario(ClientProfile::KeepAlive, ReadConsistency::Strong),
        ]
    }

    /// All eight scenarios in execution order
    pub fn all() -> Vec<Scenario> {
        ProxyPhase::ALL
            .into_iter()
            .flat_map(Scenario::for_phase)
            .collect()
    }

    /// Log label, e.g. "direct (keep-alive) get item with consistent reads"
    pub fn label(&self) -> String {
        let mut label = self.phase.to_string();
        if self.profile == ClientProfile::KeepAlive {
            label.push_str(" (keep-alive)");
        }
        label.push_str(" get item");
        if self.consistency == ReadConsistency::Strong {
            label.push_str(" with consistent reads");
        }
        label
    }
}

/// Timing of one scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub measurement: Measurement,
}

/// Raw timings of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchmarkReport {
    pub repetitions: u32,
    pub results: Vec<ScenarioResult>,
}

impl BenchmarkReport {
    /// Number of reads issued across all scenarios
    pub fn total_reads(&self) -> u64 {
        self.results
            .iter()
            .map(|r| u64::from(r.measurement.repetitions))
            .sum()
    }
}

/// Runs the read-latency scenarios against a store
pub struct BenchmarkRunner {
    connector: Arc<dyn StoreConnector>,
    table_name: String,
    bypass: ProxyBypassList,
}

impl BenchmarkRunner {
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        table_name: impl Into<String>,
        bypass: ProxyBypassList,
    ) -> Self {
        Self {
            connector,
            table_name: table_name.into(),
            bypass,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Run every scenario `times` times.
    ///
    /// A store error aborts the run. Clients of the current phase are dropped
    /// on the way out either way.
    pub async fn run(&self, times: u32) -> Result<BenchmarkReport> {
        tracing::info!(table = %self.table_name, "performing {} times", times);

        let mut report = BenchmarkReport {
            repetitions: times,
            results: Vec::with_capacity(8),
        };

        for phase in ProxyPhase::ALL {
            let bypass = phase.bypass(&self.bypass);
            tracing::info!(phase = %phase, "Proxy bypass is '{}'", bypass);

            let plain = self.connector.connect(ClientProfile::Plain, &bypass)?;
            let keep_alive = self.connector.connect(ClientProfile::KeepAlive, &bypass)?;

            for scenario in Scenario::for_phase(phase) {
                let client = match scenario.profile {
                    ClientProfile::Plain => &plain,
                    ClientProfile::KeepAlive => &keep_alive,
                };
                let measurement = self.measure_scenario(scenario, client, times).await?;
                report.results.push(ScenarioResult {
                    scenario,
                    measurement,
                });
            }
        }

        Ok(report)
    }

    async fn measure_scenario(
        &self,
        scenario: Scenario,
        client: &Arc<dyn ItemReader>,
        times: u32,
    ) -> Result<Measurement> {
        measure(&scenario.label(), times, || {
            let client = Arc::clone(client);
            let request = GetItemRequest::random(self.table_name.as_str(), scenario.consistency);
            async move { client.get_item(request).await }
        })
        .await
    }
}
