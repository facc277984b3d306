mod aggregate;
mod combined;
mod enrichment;
mod heatmap;

pub use aggregate::aggregate;
pub use combined::CombinedDataService;
pub use enrichment::{EnrichmentService, FetchPolicy};
pub use heatmap::HeatmapService;
