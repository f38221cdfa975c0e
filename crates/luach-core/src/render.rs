use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::annotate::RANGE_SEPARATOR;
use crate::availability::{Availability, classify, legend};
use crate::calendar::CalendarData;
use crate::config::Config;
use crate::datetime::{format_long, format_long_with_year, format_short};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, data))]
    pub fn print_calendar(&mut self, data: &CalendarData) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_calendar(&mut out, data)
    }

    /// Header, Sunday-first week grid, notes and legend.
    pub fn write_calendar<W: Write>(&self, mut out: W, data: &CalendarData) -> anyhow::Result<()> {
        writeln!(out, "{}", data.title)?;
        writeln!(
            out,
            "{}{}{}",
            format_long(data.start_date),
            RANGE_SEPARATOR,
            format_long_with_year(data.end_date)
        )?;
        if let Some(label) = &data.secondary_range_label {
            writeln!(out, "{label}")?;
        }
        writeln!(out)?;

        let headers = WEEKDAYS.iter().map(|day| day.to_string()).collect();
        let days: Vec<_> = data.days.iter().collect();
        let mut rows = Vec::new();
        for week in days.chunks(7) {
            let mut dates = Vec::with_capacity(7);
            let mut labels = Vec::with_capacity(7);
            for (key, day) in week {
                let category = classify(day);
                dates.push(self.paint(
                    &format!("{} {}", format_short(**key), glyph(category)),
                    color_code(category),
                ));
                labels.push(day.secondary_label.clone().unwrap_or_default());
            }
            dates.resize(7, String::new());
            labels.resize(7, String::new());
            rows.push(dates);
            rows.push(labels);
        }
        write_table(&mut out, headers, rows)?;

        let noted: Vec<_> = data
            .days
            .iter()
            .filter_map(|(key, day)| day.notes.as_ref().map(|notes| (key, day, notes)))
            .collect();
        if !noted.is_empty() {
            writeln!(out)?;
            writeln!(out, "Notes")?;
            for (key, day, notes) in noted {
                let category = classify(day);
                writeln!(
                    out,
                    "  {:<7} {} {}",
                    format_short(*key),
                    self.paint(&glyph(category).to_string(), color_code(category)),
                    notes
                )?;
            }
        }

        let entries: Vec<String> = legend(&data.days)
            .into_iter()
            .map(|category| {
                format!(
                    "{} {}",
                    self.paint(&glyph(category).to_string(), color_code(category)),
                    category.label()
                )
            })
            .collect();
        if !entries.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", entries.join("   "))?;
        }

        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn glyph(category: Availability) -> char {
    match category {
        Availability::Available => '+',
        Availability::Partial => '~',
        Availability::Unavailable => 'x',
        Availability::NoData => '.',
    }
}

fn color_code(category: Availability) -> &'static str {
    match category {
        Availability::Available => "32",
        Availability::Partial => "33",
        Availability::Unavailable => "31",
        Availability::NoData => "2",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let mut line = String::new();
    for (header, width) in headers.iter().zip(&widths) {
        line.push_str(&format!("{header:width$} ", width = *width));
    }
    writeln!(writer, "{}", line.trim_end())?;

    line.clear();
    for width in &widths {
        line.push_str(&format!("{:-<width$} ", "", width = *width));
    }
    writeln!(writer, "{}", line.trim_end())?;

    for row in rows {
        line.clear();
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            line.push_str(cell);
            line.push_str(&" ".repeat(padding + 1));
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{Renderer, strip_ansi};
    use crate::annotate::annotate;
    use crate::calendar::OverrideDoc;
    use crate::hebrew::HebrewCalendar;
    use crate::literal::parse_assignment;
    use crate::merge::merge;
    use crate::range::generate;

    fn render(overrides: &OverrideDoc) -> String {
        let range = generate("2026-02-01", "2026-02-14").expect("generate");
        let annotated = annotate(&range, &HebrewCalendar).expect("annotate");
        let data = merge(&annotated, overrides);

        let mut out = Vec::new();
        Renderer::plain()
            .write_calendar(&mut out, &data)
            .expect("render");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn renders_header_grid_and_legend() {
        let value = parse_assignment(
            r#"{ title: "Spring", days: {
                "2026-02-02": { status: "available" },
                "2026-02-06": { status: "available", notes: "until noon" },
            } }"#,
        )
        .expect("literal")
        .value;
        let overrides: OverrideDoc = serde_json::from_value(value).expect("doc");
        let text = render(&overrides);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Spring");
        assert_eq!(lines[1], "February 1 \u{2013} February 14, 2026");
        assert_eq!(lines[2], "14 Sh'vat 5786 \u{2013} 27 Sh'vat 5786");
        assert!(lines[4].starts_with("Sun"));
        assert!(lines[4].ends_with("Sat"));
        assert!(lines[6].starts_with("Feb 1 ."));
        assert!(lines[6].contains("Feb 2 +"));
        assert!(lines[6].contains("Feb 6 ~"));
        assert!(lines[6].ends_with("Feb 7 x"));
        assert!(lines[7].starts_with("14 Sh'vat 5786"));
        assert!(text.contains("Notes\n  Feb 6   ~ until noon\n"));
        assert!(text.ends_with(
            "+ Available   ~ Partially available   x Unavailable   . No data\n"
        ));
    }

    #[test]
    fn omits_notes_section_without_notes() {
        let text = render(&OverrideDoc::default());
        assert!(!text.contains("Notes"));
        assert!(text.ends_with("x Unavailable   . No data\n"));
    }

    #[test]
    fn strips_color_codes() {
        assert_eq!(strip_ansi("\x1b[32mFeb 1 +\x1b[0m"), "Feb 1 +");
    }
}
