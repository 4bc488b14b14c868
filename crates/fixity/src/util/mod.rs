pub mod format;
pub mod paths;
pub mod progress;

pub use format::{format_bytes, format_timestamp};
pub use paths::normalize_path;
pub use progress::{create_progress_bar, create_spinner};
