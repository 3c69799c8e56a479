//! Configuration validation logic.

use regex::Regex;

use crate::config::loader::{BlogConfig, Config};
use crate::error::{Error, Result};

/// Maximum blog name length.
const MAX_BLOG_NAME_LENGTH: usize = 32;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_blogs(&config.blogs)?;
    validate_options(config)?;
    validate_endpoint("api.blog_url", &config.api.blog_url, "{blog}")?;
    validate_endpoint("api.gfycat_url", &config.api.gfycat_url, "{slug}")?;

    Ok(())
}

/// Validate the blogs to crawl.
pub fn validate_blogs(blogs: &[BlogConfig]) -> Result<()> {
    if blogs.is_empty() {
        return Err(Error::MissingConfig(
            "blogs (at least one blog name required)".to_string(),
        ));
    }

    // Blog names: 1-32 chars, alphanumeric and hyphens
    let name_pattern = Regex::new(r"^[a-zA-Z0-9-]{1,32}$").unwrap();

    for blog in blogs {
        if blog.name.len() > MAX_BLOG_NAME_LENGTH {
            return Err(Error::ConfigValidation {
                field: "blogs".to_string(),
                message: format!(
                    "Blog name '{}' is too long (maximum {} characters)",
                    blog.name, MAX_BLOG_NAME_LENGTH
                ),
            });
        }

        if !name_pattern.is_match(&blog.name) {
            return Err(Error::ConfigValidation {
                field: "blogs".to_string(),
                message: format!(
                    "Blog name '{}' is invalid. Only alphanumeric characters and hyphens allowed.",
                    blog.name
                ),
            });
        }

        if let Some(tag) = &blog.tag {
            if tag.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    field: "blogs".to_string(),
                    message: format!("Blog '{}' has an empty tag filter", blog.name),
                });
            }
        }
    }

    Ok(())
}

fn validate_options(config: &Config) -> Result<()> {
    let options = &config.options;

    let positive = [
        ("options.request_rate", options.request_rate as usize),
        ("options.download_workers", options.download_workers),
        ("options.queue_capacity", options.queue_capacity),
    ];

    for (field, value) in positive {
        if value == 0 {
            return Err(Error::ConfigValidation {
                field: field.to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }
    }

    if options.ignore_photos && options.ignore_videos {
        return Err(Error::ConfigValidation {
            field: "options".to_string(),
            message: "Ignoring both photos and videos leaves nothing to download".to_string(),
        });
    }

    Ok(())
}

fn validate_endpoint(field: &str, template: &str, placeholder: &str) -> Result<()> {
    if !template.contains(placeholder) {
        return Err(Error::ConfigValidation {
            field: field.to_string(),
            message: format!("Endpoint must contain the {} placeholder", placeholder),
        });
    }

    url::Url::parse(&template.replace(placeholder, "probe"))?;
    Ok(())
}
