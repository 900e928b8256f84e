pub mod competition;
pub mod ids;
pub mod metrics;

pub use competition::CompetitionLevel;
pub use ids::{CustomerId, LanguageId, LocationId};
pub use metrics::{KeywordMetrics, MetricsMap};
