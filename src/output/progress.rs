//! Progress bar utilities.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Create the container that renders one bar per blog.
pub fn create_multi_progress(visible: bool) -> MultiProgress {
    if visible {
        MultiProgress::new()
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }
}

/// Create a blog's progress bar.
///
/// Its length grows as downloads are discovered; the message shows the page
/// being crawled.
pub fn create_blog_bar(multi: &MultiProgress, blog: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(0));
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:>20.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar.set_prefix(blog.to_string());
    bar
}
