//! Resource listings shared by the admin commands.

use serde::Serialize;

/// Name and ARN of a listed resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSummary {
    pub name: String,
    pub arn: String,
}

impl ResourceSummary {
    pub fn new(name: impl Into<String>, arn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arn: arn.into(),
        }
    }
}

/// Print a listing as a bulleted block, or as JSON.
pub fn print_summaries(title: &str, items: &[ResourceSummary], json: bool) {
    if json {
        match serde_json::to_string_pretty(items) {
            Ok(text) => println!("{}", text),
            Err(e) => tracing::error!(error = %e, "Failed to render listing"),
        }
        return;
    }

    println!("\n{}:", title);
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        println!("- Name: {}, ARN: {}", item.name, item.arn);
    }
}

/// Print any serializable document as indented JSON.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!(error = %e, "Failed to render document"),
    }
}

/// Keep the entries whose name starts with `prefix`.
pub fn with_prefix<'a>(
    items: &'a [ResourceSummary],
    prefix: &'a str,
) -> impl Iterator<Item = &'a ResourceSummary> + 'a {
    items.iter().filter(move |item| item.name.starts_with(prefix))
}
