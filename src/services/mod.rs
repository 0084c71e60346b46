mod annotations;
mod fixture;
mod html_scraper;
mod simulated;

pub use annotations::{annotation_source, AnnotationSource};
pub use fixture::FixtureSource;
pub use html_scraper::{extract_annotations, HtmlScraper};
pub use simulated::SimulatedSource;
