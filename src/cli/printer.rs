//! Tabular and record output
//!
//! Commands register columns, then hand over rows keyed by column key. The
//! strategy picked on the command line decides the layout:
//! - `Table`: banner header, column titles, aligned rows
//! - `Verbose`: banner header, one `Label: value` block per item
//! - `Grep`: no header, one tab-separated line per item

use std::collections::BTreeMap;

use chrono::DateTime;
use colored::Colorize;
use itertools::Itertools;

/// A rendered item: column key → display value.
pub type Row = BTreeMap<String, String>;

const BANNER_WIDTH: usize = 72;
const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Table,
    Verbose,
    Grep,
}

impl Strategy {
    pub fn from_flags(verbose: bool, grep: bool) -> Self {
        match (verbose, grep) {
            (_, true) => Self::Grep,
            (true, false) => Self::Verbose,
            (false, false) => Self::Table,
        }
    }
}

/// In which strategies a column appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Show {
    Always,
    /// Only in the verbose record layout
    Verbose,
    /// Only in table and grep layouts
    Compact,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub show: Show,
}

#[derive(Debug, Default)]
pub struct Printer {
    strategy: Strategy,
    header: Option<String>,
    columns: Vec<Column>,
}

impl Printer {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Force a layout unless grep output was asked for.
    pub fn prefer(&mut self, strategy: Strategy) {
        if self.strategy != Strategy::Grep {
            self.strategy = strategy;
        }
    }

    pub fn set_header(&mut self, header: impl Into<String>) {
        self.header = Some(header.into());
    }

    /// Column shown everywhere, labelled from its key.
    pub fn add_column(&mut self, key: &str) -> &mut Self {
        self.add(key, &default_label(key), Show::Always)
    }

    pub fn add_labeled(&mut self, key: &str, label: &str) -> &mut Self {
        self.add(key, label, Show::Always)
    }

    pub fn add(&mut self, key: &str, label: &str, show: Show) -> &mut Self {
        self.columns.push(Column {
            key: key.to_string(),
            label: label.to_string(),
            show,
        });
        self
    }

    pub fn print_items(&self, items: &[Row]) {
        print!("{}", self.render_items(items));
    }

    pub fn print_item(&self, item: &Row) {
        print!("{}", self.render_item(item));
    }

    pub fn render_items(&self, items: &[Row]) -> String {
        match self.strategy {
            Strategy::Table => self.render_table(items),
            Strategy::Verbose => self.render_records(items),
            Strategy::Grep => self.render_grep(items),
        }
    }

    /// A single item is shown as a record unless grep output was asked for.
    pub fn render_item(&self, item: &Row) -> String {
        match self.strategy {
            Strategy::Grep => self.render_grep(std::slice::from_ref(item)),
            Strategy::Table | Strategy::Verbose => {
                self.render_records(std::slice::from_ref(item))
            }
        }
    }

    fn visible(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| match c.show {
                Show::Always => true,
                Show::Verbose => self.strategy == Strategy::Verbose,
                Show::Compact => self.strategy != Strategy::Verbose,
            })
            .collect()
    }

    fn banner(&self) -> String {
        let Some(header) = &self.header else {
            return String::new();
        };
        let rule = "-".repeat(BANNER_WIDTH);
        let pad = BANNER_WIDTH.saturating_sub(header.chars().count()) / 2;
        format!(
            "{}\n{}{}\n{}\n\n",
            rule,
            " ".repeat(pad),
            header.as_str().bold(),
            rule
        )
    }

    fn render_table(&self, items: &[Row]) -> String {
        let columns = self.visible();
        let widths: Vec<usize> = columns
            .iter()
            .map(|c| {
                items
                    .iter()
                    .map(|item| single_line(value(item, &c.key)).chars().count())
                    .chain(std::iter::once(c.label.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = self.banner();
        let titles = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c.label, w = *w))
            .join("  ");
        out.push_str(titles.trim_end());
        out.push('\n');
        out.push_str(&"-".repeat(titles.trim_end().chars().count()));
        out.push('\n');
        for item in items {
            let line = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<w$}", single_line(value(item, &c.key)), w = *w))
                .join("  ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    fn render_records(&self, items: &[Row]) -> String {
        let columns = self.visible();
        let width = columns
            .iter()
            .map(|c| c.label.chars().count() + 1)
            .max()
            .unwrap_or(0);

        let mut out = self.banner();
        for item in items {
            for c in &columns {
                let label = format!("{}:", c.label);
                let text = value(item, &c.key);
                let mut lines = text.lines();
                let first = lines.next().unwrap_or("");
                out.push_str(format!("{:<width$} {}", label, first, width = width).trim_end());
                out.push('\n');
                for line in lines {
                    out.push_str(&format!("{:<width$} {}\n", "", line, width = width));
                }
            }
            out.push('\n');
        }
        out
    }

    fn render_grep(&self, items: &[Row]) -> String {
        let columns = self.visible();
        items
            .iter()
            .map(|item| {
                columns
                    .iter()
                    .map(|c| single_line(value(item, &c.key)))
                    .join("\t")
            })
            .map(|line| line + "\n")
            .collect()
    }
}

fn value<'a>(item: &'a Row, key: &str) -> &'a str {
    item.get(key).map(String::as_str).unwrap_or("")
}

fn single_line(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// `ipv4_address` → `Ipv4 Address`
pub fn default_label(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .join(" ")
}

/// Server timestamp in `YYYY/MM/DD HH:MM:SS`; unparsable input is shown as-is.
pub fn format_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format(DATE_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// `[ a, b ]`
pub fn bracket_list<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: std::fmt::Display,
{
    format!("[ {} ]", values.into_iter().join(", "))
}

/// Build a row from key/value pairs.
pub fn row<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
