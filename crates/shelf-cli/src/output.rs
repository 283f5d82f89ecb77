//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use shelf_core::Item;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Item as listed: the image is reduced to a flag
#[derive(Serialize)]
struct ItemRow<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
    year: &'a str,
    rating: i64,
    image: bool,
}

impl<'a> From<&'a Item> for ItemRow<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            id: &item.id,
            kind: &item.kind,
            name: &item.name,
            year: &item.year,
            rating: item.display_rating(),
            image: item.has_image(),
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single item
    pub fn print_item(&self, item: &Item) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", item.id);
                println!("Name:    {}", item.name);
                println!("Type:    {}", item.kind);
                if !item.year.is_empty() {
                    println!("Year:    {}", item.year);
                }
                println!("Rating:  {}", rating_label(item));
                if let Some(ref image) = item.image {
                    println!("Image:   {}", describe_image(image));
                }
            }
            OutputFormat::Json => {
                println!("{}", to_json_pretty(item));
            }
            OutputFormat::Quiet => {
                println!("{}", item.id);
            }
        }
    }

    /// Print a list of items
    pub fn print_items(&self, kind: &str, sorted: bool, items: &[&Item]) {
        match self.format {
            OutputFormat::Human => {
                let order = if sorted { "by rating" } else { "manual order" };
                println!("── {} ({}) ──", kind, order);
                if items.is_empty() {
                    println!("No items found.");
                    return;
                }
                for (pos, item) in items.iter().enumerate() {
                    let year = if item.year.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", item.year)
                    };
                    let image = if item.has_image() { " 🖼" } else { "" };
                    println!(
                        "{:>3}. {} | {}{} | {}{}",
                        pos + 1,
                        short_id(&item.id),
                        truncate(&item.name, 40),
                        year,
                        rating_label(item),
                        image
                    );
                }
                println!("\n{} item(s)", items.len());
            }
            OutputFormat::Json => {
                let rows: Vec<ItemRow> = items.iter().map(|i| ItemRow::from(*i)).collect();
                println!("{}", to_json_pretty(&rows));
            }
            OutputFormat::Quiet => {
                for item in items {
                    println!("{}", item.id);
                }
            }
        }
    }

    /// Print categories with counts, marking the active one
    pub fn print_categories(&self, categories: &[(String, usize)], active: &str) {
        match self.format {
            OutputFormat::Human => {
                for (name, count) in categories {
                    let marker = if name == active { "*" } else { " " };
                    println!("{} {} ({})", marker, name, count);
                }
            }
            OutputFormat::Json => {
                let json: Vec<_> = categories
                    .iter()
                    .map(|(name, count)| {
                        serde_json::json!({"name": name, "count": count, "active": name == active})
                    })
                    .collect();
                println!("{}", to_json_pretty(&json));
            }
            OutputFormat::Quiet => {
                for (name, _) in categories {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// "Want: 7/10" style rating label
pub fn rating_label(item: &Item) -> String {
    format!("Want: {}/10", item.display_rating())
}

/// First eight characters of an id
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Media type and size of an embedded image
fn describe_image(image: &str) -> String {
    let media = image
        .strip_prefix("data:")
        .and_then(|rest| rest.split([';', ',']).next())
        .filter(|m| !m.is_empty())
        .unwrap_or("embedded");
    format!("{} ({})", media, human_bytes(image.len() as u64))
}

/// Format a byte count as B/KB/MB
pub fn human_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
