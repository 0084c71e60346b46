mod annotation;
mod item;
mod summary;

pub use annotation::{Annotation, NewAnnotation};
pub use item::{Item, NewItem, StoredItem};
pub use summary::{Summary, SUMMARY_BULLETS};
