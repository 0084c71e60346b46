mod snapshot;

pub use snapshot::{read_snapshot, SnapshotComment, SnapshotExporter, SnapshotItem};
