//! The doctrine enforcer.
//!
//! Runs the gate battery in order: truth → provenance → volatility →
//! business-policy → disclosure. Corrections apply as they are produced, so
//! each later gate sees the text as corrected so far. The disclosure gate
//! relies on this to notice disclaimers an earlier gate already added.

use tracing::{debug, warn};

use truthgate_contracts::{
    config::DoctrineConfig,
    doctrine::{EnforcementOutcome, GateResult, GateVerdict, OperatingMode, ResponseMetadata, Violation},
};

use crate::gates::{standard_gates, DoctrineGate};

pub struct DoctrineEnforcer {
    gates: Vec<Box<dyn DoctrineGate>>,
}

impl DoctrineEnforcer {
    /// The standard five-gate battery.
    pub fn new(config: &DoctrineConfig) -> Self {
        Self {
            gates: standard_gates(config),
        }
    }

    /// A custom battery, run in the given order.
    pub fn with_gates(gates: Vec<Box<dyn DoctrineGate>>) -> Self {
        Self { gates }
    }

    /// Run every gate over `response`.
    ///
    /// `corrected_response` is set only when some gate changed the text.
    pub fn enforce_all(
        &self,
        response: &str,
        metadata: &ResponseMetadata,
        mode: &OperatingMode,
    ) -> EnforcementOutcome {
        let mut text = response.to_string();
        let mut corrected = false;
        let mut gate_results = Vec::with_capacity(self.gates.len());
        let mut violations = Vec::new();

        for gate in &self.gates {
            let name = gate.name();
            let verdict = gate.check(&text, metadata, mode);
            gate_results.push((name, GateResult::from(&verdict)));

            let GateVerdict::Violation {
                message,
                correction,
                blocking,
            } = verdict
            else {
                debug!(gate = %name, "gate passed");
                continue;
            };

            warn!(
                gate = %name,
                blocking,
                correctable = correction.is_some(),
                message = %message,
                "doctrine violation"
            );
            if let Some(correction) = correction {
                text = correction.apply(&text);
                corrected = true;
            }
            violations.push(Violation {
                gate: name,
                message,
                blocking,
            });
        }

        let enforcement_passed = !violations.iter().any(|v| v.blocking);
        debug!(
            enforcement_passed,
            violations = violations.len(),
            corrected,
            mode = %mode.as_str(),
            "doctrine enforcement complete"
        );

        EnforcementOutcome {
            gate_results,
            violations,
            corrected_response: corrected.then_some(text),
            enforcement_passed,
        }
    }
}

impl Default for DoctrineEnforcer {
    fn default() -> Self {
        Self::new(&DoctrineConfig::default())
    }
}

impl std::fmt::Debug for DoctrineEnforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.gates.iter().map(|g| g.name()).collect();
        f.debug_struct("DoctrineEnforcer").field("gates", &names).finish()
    }
}
