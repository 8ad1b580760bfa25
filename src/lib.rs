//! Clipsift: AI-powered clipboard capture and analysis
//!
//! This library provides the core functionality for:
//! - Capturing text into a persistent clipboard history
//! - Analyzing it with a configurable provider (OpenAI, Gemini, or a
//!   local heuristic mock) into a structured record: topic, entities,
//!   intent, categories, action items
//! - Normalizing whatever a provider returns, JSON or prose, into that
//!   fixed shape without ever surfacing a parse error
//! - Gating processing quota and export formats by subscription tier
//! - Exporting the history as txt, json, or csv
//!
//! # Pipeline
//!
//! ```text
//!  capture ──▶ SubscriptionGate.can_process_more()
//!                     │ ok
//!                     ▼
//!        HistoryStore.add_item()          item: pending
//!                     │
//!                     ▼
//!        HistoryStore.process_item()      item: processing
//!                     │
//!                     ▼
//!        analyze::process_text()
//!          ├─ OpenAiAnalyzer ─┐
//!          ├─ GeminiAnalyzer ─┼──▶ normalize::normalize()
//!          └─ MockAnalyzer ───┘        (JSON ▶ labeled text ▶ fallback)
//!                     │
//!                     ▼
//!        item: processed | failed (retry available)
//!                     │
//!                     ▼
//!        SubscriptionGate.increment_processing_count()
//! ```

pub mod analyze;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod subscription;

pub use analyze::{process_text, ProcessedData, Provider};
pub use config::{load_config, Settings};
pub use error::{ClipsiftError, ProviderError, Result};
pub use history::store::HistoryStore;
pub use history::{ClipboardItem, ItemId, ItemStatus};
pub use subscription::{SubscriptionGate, Tier};
