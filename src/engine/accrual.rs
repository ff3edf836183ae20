use crate::engine::Engine;
use crate::engine::model::{AdvanceReport, Timestamp};

impl Engine {
    /// Reconciles every accruing resource with the time elapsed up to `now`.
    ///
    /// Only whole periods are consumed: `last_updated` moves forward by
    /// `periods * rate`, so the unconsumed remainder counts toward the next
    /// call. Composite gains are computed from the source counts as they
    /// stood when the call began.
    pub fn advance(&mut self, now: Timestamp) -> AdvanceReport {
        let counts: Vec<(String, u64)> = self
            .resources
            .iter()
            .map(|r| (r.name.clone(), r.count))
            .collect();
        let count_of = |name: &str| {
            counts
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, c)| *c)
                .unwrap_or(0)
        };

        let mut report = AdvanceReport::default();

        for resource in self.resources.iter_mut() {
            let Some(production) = self
                .catalog
                .get(&resource.name)
                .and_then(|blueprint| blueprint.production.as_ref())
            else {
                continue;
            };

            let rate = resource.rate_millis();
            if rate == 0 {
                tracing::warn!(
                    resource = %resource.name,
                    "Rate is zero, not accruing"
                );
                report.stalled.push(resource.name.clone());
                continue;
            }

            let periods = now.millis_since(resource.last_updated) / rate;
            if periods == 0 {
                continue;
            }

            let gain = production.gain_per_period(count_of).saturating_mul(periods);
            resource.count = resource.count.saturating_add(gain);
            resource.last_updated = resource
                .last_updated
                .add_millis(periods.saturating_mul(rate));

            tracing::debug!(
                resource = %resource.name,
                periods,
                gain,
                count = resource.count,
                "Accrued"
            );
            if gain > 0 {
                report.gained.push((resource.name.clone(), gain));
            }
        }

        report.unlocked = self.refresh_unlocks();
        report
    }
}
