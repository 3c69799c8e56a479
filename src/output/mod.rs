//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars
//! - Statistics counters and reporting

pub mod console;
pub mod progress;
pub mod stats;

pub use self::console::{print_banner, print_config_summary, print_error, print_info, print_warning};
pub use progress::{create_blog_bar, create_multi_progress};
pub use stats::{print_summary, Stats};
