//! Subscription tiers and quota gating
//!
//! Clipsift offers a free and a premium tier. This module tracks the
//! per-day processing quota, answers which models and export formats the
//! current tier may use, and simulates the billing round-trips for
//! purchase, cancellation, and entitlement restore. The gate is consulted
//! by the calling layer *before* an item is created or a provider is
//! called, so a denial is a pre-flight rejection, never a failed item.

use crate::history::export::ExportFormat;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

/// Static entitlement bundle for a tier
#[derive(Debug, Clone, Copy)]
pub struct TierLimits {
    /// Analyses per calendar day; None means unbounded
    pub max_daily_processing: Option<u32>,
    /// Model identifiers this tier may invoke
    pub allowed_models: &'static [&'static str],
    /// Export formats this tier may produce
    pub download_formats: &'static [ExportFormat],
    /// Whether exports carry the free-version watermark
    pub watermark: bool,
    /// Whether requests get priority handling
    pub priority: bool,
}

const FREE_LIMITS: TierLimits = TierLimits {
    max_daily_processing: Some(5),
    allowed_models: &["mock", "gemini-pro"],
    download_formats: &[ExportFormat::Txt],
    watermark: true,
    priority: false,
};

const PREMIUM_LIMITS: TierLimits = TierLimits {
    max_daily_processing: None,
    allowed_models: &[
        "mock",
        "gemini-pro",
        "gemini-ultra",
        "gpt-3.5-turbo",
        "gpt-4",
    ],
    download_formats: &[ExportFormat::Txt, ExportFormat::Json, ExportFormat::Csv],
    watermark: false,
    priority: true,
};

impl Tier {
    /// Entitlements for this tier
    pub fn limits(&self) -> &'static TierLimits {
        match self {
            Tier::Free => &FREE_LIMITS,
            Tier::Premium => &PREMIUM_LIMITS,
        }
    }
}

/// Daily processing counter, reset lazily on date rollover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingCount {
    /// Analyses counted so far today
    pub today: u32,
    /// The calendar day the counter belongs to
    pub date: NaiveDate,
}

/// Persisted subscription state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub tier: Tier,
    /// Expiry of the current premium period, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Opaque token from the last billing transaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_token: Option<String>,
    pub processing_count: ProcessingCount,
}

impl Default for SubscriptionState {
    fn default() -> Self {
        Self {
            tier: Tier::Free,
            expires_at: None,
            processing_count: ProcessingCount {
                today: 0,
                date: Local::now().date_naive(),
            },
            purchase_token: None,
        }
    }
}

/// Errors reported by pre-flight gate checks
#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("Daily processing limit of {limit} reached on the {tier} tier. Upgrade to premium for unlimited processing.")]
    QuotaExceeded { tier: Tier, limit: u32 },

    #[error("The {format} export format is not available on the {tier} tier")]
    FormatNotAllowed { format: ExportFormat, tier: Tier },

    #[error("Model '{model}' is not available on the {tier} tier")]
    ModelNotAllowed { model: String, tier: Tier },
}

/// Persistence capability for subscription state.
///
/// Implementations handle their own failures: loading is tolerant
/// (corrupt or missing state yields None) and saving logs rather than
/// propagates, so a disk hiccup never blocks a billing operation.
pub trait SubscriptionStore: Send + Sync {
    fn load(&self) -> Option<SubscriptionState>;
    fn save(&self, state: &SubscriptionState);
}

/// TOML-file-backed subscription store
pub struct TomlStateStore {
    path: PathBuf,
}

impl TomlStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SubscriptionStore for TomlStateStore {
    fn load(&self) -> Option<SubscriptionState> {
        if !self.path.exists() {
            tracing::debug!("No subscription state at {:?}", self.path);
            return None;
        }

        match std::fs::read_to_string(&self.path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!("Failed to parse subscription state: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read subscription state: {}", e);
                None
            }
        }
    }

    fn save(&self, state: &SubscriptionState) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create state directory: {}", e);
                return;
            }
        }

        match toml::to_string_pretty(state) {
            Ok(contents) => {
                if let Err(e) = std::fs::write(&self.path, contents) {
                    tracing::warn!("Failed to write subscription state: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize subscription state: {}", e),
        }
    }
}

/// In-memory subscription store
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<SubscriptionState>>,
}

impl SubscriptionStore for MemoryStateStore {
    fn load(&self) -> Option<SubscriptionState> {
        self.state.lock().unwrap().clone()
    }

    fn save(&self, state: &SubscriptionState) {
        *self.state.lock().unwrap() = Some(state.clone());
    }
}

/// Simulated billing backend parameters.
///
/// A real integration replaces the delays with store round-trips and the
/// restore probability with an actual entitlement check.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub purchase_delay: Duration,
    pub cancel_delay: Duration,
    pub restore_delay: Duration,
    /// Probability that a restore finds an entitlement (0.0 - 1.0)
    pub restore_success_rate: f64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            purchase_delay: Duration::from_millis(1500),
            cancel_delay: Duration::from_millis(1000),
            restore_delay: Duration::from_millis(1500),
            restore_success_rate: 0.5,
        }
    }
}

impl BillingConfig {
    /// Zero-latency billing, restores always succeed
    pub fn instant() -> Self {
        Self {
            purchase_delay: Duration::ZERO,
            cancel_delay: Duration::ZERO,
            restore_delay: Duration::ZERO,
            restore_success_rate: 1.0,
        }
    }
}

/// Quota and entitlement gate, constructed once at startup
pub struct SubscriptionGate {
    state: Mutex<SubscriptionState>,
    store: Box<dyn SubscriptionStore>,
    billing: BillingConfig,
}

impl SubscriptionGate {
    /// Create a gate, loading persisted state through the injected store
    pub fn new(store: Box<dyn SubscriptionStore>, billing: BillingConfig) -> Self {
        let state = store.load().unwrap_or_default();
        Self {
            state: Mutex::new(state),
            store,
            billing,
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// The currently active tier
    pub fn current_tier(&self) -> Tier {
        self.state.lock().unwrap().tier
    }

    /// Entitlements of the currently active tier
    pub fn limits(&self) -> &'static TierLimits {
        self.current_tier().limits()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SubscriptionState {
        self.state.lock().unwrap().clone()
    }

    /// Whether another analysis may run today.
    ///
    /// Lazily resets the counter (and reports true) when the stored date
    /// differs from the current date; there is no background timer.
    pub fn can_process_more(&self) -> bool {
        self.can_process_more_on(Self::today())
    }

    /// Date-explicit variant of [`can_process_more`](Self::can_process_more)
    pub fn can_process_more_on(&self, today: NaiveDate) -> bool {
        let mut state = self.state.lock().unwrap();

        if state.processing_count.date != today {
            state.processing_count = ProcessingCount { today: 0, date: today };
            self.store.save(&state);
            return true;
        }

        match state.tier.limits().max_daily_processing {
            Some(max) => state.processing_count.today < max,
            None => true,
        }
    }

    /// Count one processing attempt against today's quota.
    ///
    /// Called once per attempt the caller chooses to count; attempts are
    /// counted whether or not the provider call succeeded.
    pub fn increment_processing_count(&self) {
        self.increment_processing_count_on(Self::today());
    }

    /// Date-explicit variant of
    /// [`increment_processing_count`](Self::increment_processing_count)
    pub fn increment_processing_count_on(&self, today: NaiveDate) {
        let mut state = self.state.lock().unwrap();

        if state.processing_count.date != today {
            state.processing_count = ProcessingCount { today: 1, date: today };
        } else {
            state.processing_count.today += 1;
        }

        self.store.save(&state);
    }

    /// Analyses left today; None means unbounded
    pub fn remaining_today(&self) -> Option<u32> {
        self.remaining_today_on(Self::today())
    }

    /// Date-explicit variant of [`remaining_today`](Self::remaining_today)
    pub fn remaining_today_on(&self, today: NaiveDate) -> Option<u32> {
        let state = self.state.lock().unwrap();
        let max = state.tier.limits().max_daily_processing?;

        if state.processing_count.date != today {
            return Some(max);
        }

        Some(max.saturating_sub(state.processing_count.today))
    }

    /// Whether the current tier may invoke the given model
    pub fn is_model_allowed(&self, model: &str) -> bool {
        self.limits().allowed_models.contains(&model)
    }

    /// Whether the current tier may export in the given format
    pub fn is_format_allowed(&self, format: ExportFormat) -> bool {
        self.limits().download_formats.contains(&format)
    }

    /// Pre-flight check: fail with a typed denial when the quota is spent
    pub fn require_processing(&self) -> Result<(), SubscriptionError> {
        if self.can_process_more() {
            Ok(())
        } else {
            let tier = self.current_tier();
            Err(SubscriptionError::QuotaExceeded {
                tier,
                limit: tier.limits().max_daily_processing.unwrap_or(0),
            })
        }
    }

    /// Pre-flight check for a model identifier
    pub fn require_model(&self, model: &str) -> Result<(), SubscriptionError> {
        if self.is_model_allowed(model) {
            Ok(())
        } else {
            Err(SubscriptionError::ModelNotAllowed {
                model: model.to_string(),
                tier: self.current_tier(),
            })
        }
    }

    /// Pre-flight check for an export format
    pub fn require_format(&self, format: ExportFormat) -> Result<(), SubscriptionError> {
        if self.is_format_allowed(format) {
            Ok(())
        } else {
            Err(SubscriptionError::FormatNotAllowed {
                format,
                tier: self.current_tier(),
            })
        }
    }

    /// Simulate purchasing a premium subscription. Returns true on success.
    pub fn purchase_subscription(&self) -> bool {
        if !self.billing.purchase_delay.is_zero() {
            std::thread::sleep(self.billing.purchase_delay);
        }

        let mut state = self.state.lock().unwrap();
        state.tier = Tier::Premium;
        state.expires_at = Some(Utc::now() + ChronoDuration::days(30));
        state.purchase_token = Some(format!("purchase-{}", Uuid::new_v4()));
        self.store.save(&state);

        tracing::info!("Subscription upgraded to premium");
        true
    }

    /// Simulate cancelling the subscription. Returns true on success.
    pub fn cancel_subscription(&self) -> bool {
        if !self.billing.cancel_delay.is_zero() {
            std::thread::sleep(self.billing.cancel_delay);
        }

        let mut state = self.state.lock().unwrap();
        state.tier = Tier::Free;
        state.expires_at = None;
        state.purchase_token = None;
        self.store.save(&state);

        tracing::info!("Subscription cancelled, back to free tier");
        true
    }

    /// Simulate restoring purchases from the billing backend.
    ///
    /// Succeeds with the configured probability; a real implementation
    /// replaces this with an entitlement lookup.
    pub fn restore_purchases(&self) -> bool {
        if !self.billing.restore_delay.is_zero() {
            std::thread::sleep(self.billing.restore_delay);
        }

        if rand::random::<f64>() >= self.billing.restore_success_rate {
            tracing::info!("No subscription found to restore");
            return false;
        }

        let mut state = self.state.lock().unwrap();
        state.tier = Tier::Premium;
        state.expires_at = Some(Utc::now() + ChronoDuration::days(30));
        state.purchase_token = Some(format!("restored-{}", Uuid::new_v4()));
        self.store.save(&state);

        tracing::info!("Subscription restored to premium");
        true
    }
}
