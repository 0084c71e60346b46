mod enricher;

pub use enricher::{Enricher, Enrichment};
