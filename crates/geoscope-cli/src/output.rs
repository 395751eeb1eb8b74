use console::style;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }

    pub fn success(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {}", style("✓").green().bold(), message);
            }
            OutputFormat::Json => {
                println!("{}", pretty(&status_message("success", message)));
            }
        }
    }

    pub fn info(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {}", style("ℹ").blue().bold(), message);
            }
            OutputFormat::Json => {
                println!("{}", pretty(&status_message("info", message)));
            }
        }
    }

    /// Report a failure, with optional server-side details
    pub fn error(&self, message: impl Display, details: Option<&str>) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", style("✗").red().bold(), style(&message).red().bold());
                if let Some(details) = details {
                    eprintln!("  {}", details);
                }
            }
            OutputFormat::Json => {
                let mut output = status_message("error", message);
                if let (Some(details), Value::Object(map)) = (details, &mut output) {
                    map.insert("details".to_string(), Value::from(details));
                }
                eprintln!("{}", pretty(&output));
            }
        }
    }

    /// Render rows as a table; JSON callers use `result` instead
    pub fn table<T: Tabled>(&self, rows: Vec<T>) {
        if self.format == OutputFormat::Json {
            return;
        }
        if rows.is_empty() {
            println!("{}", style("(no data)").dim());
        } else {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "status": "success",
                    "data": data,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if self.format == OutputFormat::Human {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if self.format == OutputFormat::Human {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

fn status_message(status: &str, message: impl Display) -> Value {
    serde_json::json!({
        "status": status,
        "message": message.to_string(),
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Coloured task status for human output
pub fn status_label(status: geoscope_core::models::TaskStatus) -> String {
    use geoscope_core::models::TaskStatus;

    let label = style(status.as_str());
    match status {
        TaskStatus::Pending => label.yellow(),
        TaskStatus::Processing => label.cyan(),
        TaskStatus::Completed => label.green().bold(),
        TaskStatus::Failed => label.red().bold(),
        TaskStatus::Cancelled => label.dim(),
    }
    .to_string()
}

/// Shorten `text` to at most `max` characters
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}
