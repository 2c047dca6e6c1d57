//! National-comparison gate.
//!
//! National averages are a paid feature: only `foundation` and above see
//! them. Every place that fills a national field asks this gate first.

use crate::analytics::metrics::MetricSnapshot;
use crate::domain::models::SubscriptionTier;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::store::TierSource;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct BenchmarkGate {
    tiers: Arc<dyn TierSource>,
    tier_override: Option<SubscriptionTier>,
    lookup_timeout: Duration,
}

impl BenchmarkGate {
    pub fn new(tiers: Arc<dyn TierSource>, tier_override: Option<SubscriptionTier>) -> Self {
        Self {
            tiers,
            tier_override,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Users without a subscription record are on the free tier.
    pub async fn effective_tier(&self, user_id: Uuid) -> AnalyticsResult<SubscriptionTier> {
        if let Some(tier) = self.tier_override {
            return Ok(tier);
        }
        match tokio::time::timeout(self.lookup_timeout, self.tiers.current_tier(user_id)).await {
            Ok(Ok(tier)) => Ok(tier.unwrap_or(SubscriptionTier::Free)),
            Ok(Err(e)) => Err(AnalyticsError::EntitlementCheckFailed(e.to_string())),
            Err(_) => Err(AnalyticsError::EntitlementCheckFailed(format!(
                "tier lookup timed out after {:?}",
                self.lookup_timeout
            ))),
        }
    }

    /// Fails closed: a failed tier lookup means no national comparison.
    pub async fn has_national_access(&self, user_id: Uuid) -> bool {
        self.resolve(user_id).await.1
    }

    /// Tier as shown to the user plus the access decision; lookup failures
    /// report `free` without access.
    pub async fn resolve(&self, user_id: Uuid) -> (SubscriptionTier, bool) {
        match self.effective_tier(user_id).await {
            Ok(tier) => (tier, tier.grants_national_comparison()),
            Err(e) => {
                tracing::warn!("Tier lookup failed for {}, withholding national data: {}", user_id, e);
                (SubscriptionTier::Free, false)
            }
        }
    }
}

pub fn withhold_national(snapshot: &mut MetricSnapshot) {
    snapshot.national_recommendation_average = None;
    snapshot.national_leaving_distribution = None;
    for question in &mut snapshot.per_question_distributions {
        question.national_responses = None;
    }
}
