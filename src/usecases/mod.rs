//! Application use cases. Orchestrate domain logic via ports.

pub mod network_analyzer;
pub mod report_service;
pub mod score_calculator;

pub use network_analyzer::NetworkAnalyzer;
pub use report_service::ReportService;
pub use score_calculator::ThreeEsCalculator;
