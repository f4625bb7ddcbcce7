// Analyzer module: per-run offer statistics and ranking.

mod price_analysis;

pub use price_analysis::{Analyzer, AnalyzerImpl, dedup_offers};
