//! Remote housekeeping: thumbnail cache clearing and imports

mod cache;
mod import;

pub use cache::{clear_cache, CacheClearReport};
pub use import::{import_files, ImportFailure, ImportReport};
