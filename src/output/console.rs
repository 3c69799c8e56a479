//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Tumblr Downloader                                 ║
║     Photos and videos from Tumblr blogs               ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(blogs: &[String], update_mode: bool, download_dir: &str) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Blogs: {}", blogs.join(", "));
    println!(
        "  Mode: {}",
        if update_mode { "update" } else { "full" }
    );
    println!("  Directory: {}", download_dir);
    println!();
}
