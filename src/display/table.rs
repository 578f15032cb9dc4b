use crate::api::models::{RemoteResource, ResourceKind};
use crate::error::AppError;
use crate::utils::text::truncate_text_unicode;
use chrono::{DateTime, NaiveDate};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets};
use crossterm::terminal;

/// Formatter for resource lists and settings
pub struct TableDisplay {
    max_width: Option<usize>,
    use_colors: bool,
}

impl Default for TableDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TableDisplay {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: true,
        }
    }

    /// Terminal width clamped to 40..=200, 80 when unknown
    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _rows)) => Some((cols as usize).clamp(40, 200)),
            Err(_) => Some(80),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            table.set_width(width as u16);
        }
        table
    }

    fn header(&self, names: &[&str]) -> Vec<Cell> {
        names
            .iter()
            .map(|name| {
                let cell = Cell::new(name);
                if self.use_colors {
                    cell.add_attribute(Attribute::Bold).fg(Color::Cyan)
                } else {
                    cell
                }
            })
            .collect()
    }

    fn name_width(&self) -> usize {
        match self.max_width {
            Some(w) if w >= 120 => 40,
            Some(w) if w >= 80 => 28,
            _ => 20,
        }
    }

    /// Render chatbots or ticket forms, optionally capped at `limit` rows
    pub fn render_resources(
        &self,
        kind: ResourceKind,
        resources: &[RemoteResource],
        limit: Option<usize>,
    ) -> Result<String, AppError> {
        let mut table = self.new_table();

        let mut columns = vec!["ID", "Name", "Status", "Created"];
        if kind == ResourceKind::TicketForms {
            columns.push("Fields");
        }
        columns.push("Shortcode");
        table.set_header(self.header(&columns));

        let shown = limit.map_or(resources.len(), |l| l.min(resources.len()));
        let name_width = self.name_width();

        for resource in &resources[..shown] {
            let id = Cell::new(&resource.id);
            let status = Cell::new(resource.status_or_default());
            let mut row = vec![
                if self.use_colors { id.fg(Color::Cyan) } else { id },
                Cell::new(truncate_text_unicode(&resource.name, name_width)),
                if self.use_colors && resource.status_or_default() == "active" {
                    status.fg(Color::Green)
                } else {
                    status
                },
                Cell::new(format_date(resource.created_at.as_deref())),
            ];
            if kind == ResourceKind::TicketForms {
                row.push(Cell::new(
                    resource
                        .fields_count
                        .map_or_else(|| "-".to_string(), |n| n.to_string()),
                ));
            }
            row.push(Cell::new(resource.shortcode(kind)));
            table.add_row(row);
        }

        let mut output = table.to_string();
        if resources.len() > shown {
            output.push_str(&format!(
                "\n... and {} more {} (use a larger --limit to see all)",
                resources.len() - shown,
                kind.label()
            ));
        }
        Ok(output)
    }

    /// Two-column key/value table
    pub fn render_settings(&self, rows: &[(&str, String)]) -> Result<String, AppError> {
        let mut table = self.new_table();
        table.set_header(self.header(&["Setting", "Value"]));
        for (key, value) in rows {
            table.add_row(vec![Cell::new(key), Cell::new(value)]);
        }
        Ok(table.to_string())
    }
}

/// `YYYY-MM-DD` for RFC 3339 or plain dates, the raw value otherwise
pub fn format_date(value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return "-".to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(id: &str, name: &str) -> RemoteResource {
        RemoteResource {
            id: id.to_string(),
            name: name.to_string(),
            status: None,
            description: None,
            created_at: Some("2025-03-14T09:26:53Z".to_string()),
            fields_count: Some(4),
        }
    }

    fn display() -> TableDisplay {
        TableDisplay::new().with_max_width(160).with_colors(false)
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2025-03-14T09:26:53.123+02:00")), "2025-03-14");
        assert_eq!(format_date(Some("2025-03-14")), "2025-03-14");
        assert_eq!(format_date(Some("last tuesday")), "last tuesday");
        assert_eq!(format_date(Some("  ")), "-");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_render_chatbots() {
        let output = display()
            .render_resources(ResourceKind::Chatbots, &[resource("bot-1", "Support Bot")], None)
            .unwrap();

        assert!(output.contains("Support Bot"));
        assert!(output.contains("active"));
        assert!(output.contains("2025-03-14"));
        assert!(output.contains("[modstack-chatbot id=\"bot-1\"]"));
        assert!(!output.contains("Fields"));
    }

    #[test]
    fn test_render_forms_with_limit() {
        let forms = vec![resource("f1", "Billing"), resource("f2", "Bugs"), resource("f3", "Other")];
        let output = display()
            .render_resources(ResourceKind::TicketForms, &forms, Some(2))
            .unwrap();

        assert!(output.contains("Fields"));
        assert!(output.contains("Billing"));
        assert!(!output.contains("Other"));
        assert!(output.contains("... and 1 more ticket forms"));
    }

    #[test]
    fn test_render_settings() {
        let output = display()
            .render_settings(&[("api_url", "https://api.modstack.ai".to_string())])
            .unwrap();
        assert!(output.contains("Setting"));
        assert!(output.contains("https://api.modstack.ai"));
    }
}
