//! Output formatting for price reports (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::report::{PriceQuote, Report};
use crate::storefront::RegionTarget;

/// Formats reports for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a report.
    pub fn format_report(&self, report: &Report) -> String {
        match self.format {
            OutputFormat::Json => self.json_report(report),
            OutputFormat::Table => self.table_report(report),
            OutputFormat::Markdown => self.markdown_report(report),
            OutputFormat::Csv => self.csv_report(report),
        }
    }

    /// Formats a region list.
    pub fn format_regions(&self, regions: &[RegionTarget]) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(regions).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Csv => {
                let mut lines = vec!["Country,Currency".to_string()];
                lines.extend(regions.iter().map(|r| format!("{},{}", r.region_code, r.currency_code)));
                lines.join("\n")
            }
            OutputFormat::Markdown => {
                let mut lines = vec!["| Country | Currency |".to_string(), "|---|---|".to_string()];
                lines.extend(
                    regions
                        .iter()
                        .map(|r| format!("| {} {} | {} |", r.flag(), r.region_code, r.currency_code)),
                );
                lines.join("\n")
            }
            OutputFormat::Table => {
                let mut lines: Vec<String> = regions
                    .iter()
                    .map(|r| format!("{} {:<4} {}", r.flag(), r.region_code, r.currency_code))
                    .collect();
                lines.push(String::new());
                lines.push(format!("Total: {} regions", regions.len()));
                lines.join("\n")
            }
        }
    }

    // JSON formatting

    fn json_report(&self, report: &Report) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    // Table formatting

    fn table_report(&self, report: &Report) -> String {
        let mut lines = Vec::new();

        lines.push(format!("App: {}", Self::app_label(report)));
        lines.push(String::new());

        if report.is_empty() {
            lines.push("No prices found.".to_string());
        } else {
            let region_width = 7;
            let currency_width = 8;
            let price_width = 10;
            let text_width = 40;

            let reference_header = report
                .reference_currency
                .as_ref()
                .map(|c| format!("  {:>price_width$}", format!("Max {}", c)))
                .unwrap_or_default();

            lines.push(format!(
                "{:<region_width$}  {:<currency_width$}  {:>price_width$}  {:>price_width$}{}  {}",
                "Region", "Currency", "Min USD", "Max USD", reference_header, "Original"
            ));
            lines.push(format!(
                "{:-<region_width$}  {:-<currency_width$}  {:-<price_width$}  {:-<price_width$}{}  {:-<text_width$}",
                "",
                "",
                "",
                "",
                if reference_header.is_empty() { String::new() } else { format!("  {:-<price_width$}", "") },
                ""
            ));

            for quote in &report.quotes {
                let reference = if report.reference_currency.is_some() {
                    format!("  {:>price_width$}", Self::reference_str(quote))
                } else {
                    String::new()
                };

                lines.push(format!(
                    "{:<region_width$}  {:<currency_width$}  {:>price_width$}  {:>price_width$}{}  {}",
                    format!("{} {}", flag_of(quote), quote.region_code),
                    quote.currency_code,
                    quote.min_usd,
                    quote.max_usd,
                    reference,
                    truncate(&quote.raw_text, text_width)
                ));
            }

            lines.push(String::new());
            lines.push(format!("Total: {} regions", report.len()));

            if let (Some(cheap), Some(savings), Some(percent)) =
                (report.cheapest(), report.max_savings(), report.max_savings_percent())
            {
                lines.push(format!(
                    "Cheapest: {} (${}), saves ${} ({}%) over the most expensive region",
                    cheap.region_code, cheap.min_usd, savings, percent
                ));
            }
        }

        if !report.excluded.is_empty() {
            let excluded: Vec<String> = report
                .excluded
                .iter()
                .map(|e| format!("{} ({})", e.region_code, e.reason))
                .collect();
            lines.push(format!("Excluded: {}", excluded.join(", ")));
        }

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_report(&self, report: &Report) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", Self::app_label(report)));
        lines.push(String::new());

        if report.is_empty() {
            lines.push("*No prices found.*".to_string());
        } else {
            match &report.reference_currency {
                Some(code) => {
                    lines.push(format!("| Region | Currency | Min USD | Max USD | Max {} | Original |", code));
                    lines.push("|--------|----------|---------|---------|-------|----------|".to_string());
                }
                None => {
                    lines.push("| Region | Currency | Min USD | Max USD | Original |".to_string());
                    lines.push("|--------|----------|---------|---------|----------|".to_string());
                }
            }

            for quote in &report.quotes {
                let reference = if report.reference_currency.is_some() {
                    format!(" {} |", Self::reference_str(quote))
                } else {
                    String::new()
                };

                lines.push(format!(
                    "| {} {} | {} | {} | {} |{} {} |",
                    flag_of(quote),
                    quote.region_code,
                    quote.currency_code,
                    quote.min_usd,
                    quote.max_usd,
                    reference,
                    quote.raw_text.replace('|', "\\|")
                ));
            }

            lines.push(String::new());
            lines.push(format!("*{} regions priced*", report.len()));
        }

        if !report.excluded.is_empty() {
            lines.push(String::new());
            lines.push("**Excluded:**".to_string());
            for excluded in &report.excluded {
                lines.push(format!("- {}: {}", excluded.region_code, excluded.reason));
            }
        }

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self, report: &Report) -> String {
        match &report.reference_currency {
            Some(code) => format!(
                "Min Price (USD),Max Price (USD),Max Price ({}),Country,Currency,Original Price",
                code
            ),
            None => "Min Price (USD),Max Price (USD),Country,Currency,Original Price".to_string(),
        }
    }

    fn csv_report(&self, report: &Report) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header(report));

        for quote in &report.quotes {
            let reference = if report.reference_currency.is_some() {
                format!("{},", Self::reference_str(quote))
            } else {
                String::new()
            };

            lines.push(format!(
                "{},{},{}{},{},{}",
                quote.min_usd,
                quote.max_usd,
                reference,
                quote.region_code,
                quote.currency_code,
                Self::csv_escape(&quote.raw_text)
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }

    fn app_label(report: &Report) -> String {
        match &report.app_title {
            Some(title) => format!("{} ({})", title, report.app_id),
            None => report.app_id.clone(),
        }
    }

    fn reference_str(quote: &PriceQuote) -> String {
        quote.max_reference.map(|r| r.to_string()).unwrap_or_default()
    }
}

fn flag_of(quote: &PriceQuote) -> String {
    RegionTarget::with_currency(&quote.region_code, &quote.currency_code).flag()
}

/// Shortens `s` to `width` characters, marking the cut with "...".
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ExcludedRegion, ExclusionReason};
    use rust_decimal::Decimal;

    fn make_quote(region: &str, currency: &str, raw: &str, min: i64, max: i64) -> PriceQuote {
        PriceQuote {
            region_code: region.to_string(),
            currency_code: currency.to_string(),
            raw_text: raw.to_string(),
            min_usd: Decimal::new(min, 2),
            max_usd: Decimal::new(max, 2),
            offer_name: None,
            offer_duration: None,
            max_reference: None,
        }
    }

    fn make_report() -> Report {
        let mut report = Report::new("com.example.game");
        report.app_title = Some("Example Game".to_string());
        report.quotes = vec![
            make_quote("ID", "IDR", "Rp 15.000 - Rp 1.500.000 per item", 93, 9288),
            make_quote("JP", "JPY", "¥160 - ¥12,000 per item", 103, 7700),
            make_quote("US", "USD", "$0.99 - $99.99 per item", 99, 9999),
        ];
        report.quotes.sort_by(|a, b| a.min_usd.cmp(&b.min_usd));
        report.excluded = vec![ExcludedRegion {
            region_code: "FR".to_string(),
            currency_code: "USD".to_string(),
            reason: ExclusionReason::NotFound,
        }];
        report
    }

    fn make_reference_report() -> Report {
        let mut report = make_report();
        report.reference_currency = Some("RUB".to_string());
        for quote in &mut report.quotes {
            quote.max_reference = Some(quote.max_usd * Decimal::from(90));
        }
        report
    }

    #[test]
    fn test_json_report() {
        let formatter = Formatter::new(OutputFormat::Json);
        let output = formatter.format_report(&make_report());

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["app_id"], "com.example.game");
        assert_eq!(parsed["quotes"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["quotes"][0]["region_code"], "ID");
        assert_eq!(parsed["excluded"][0]["reason"], "not_found");
    }

    #[test]
    fn test_table_report() {
        let formatter = Formatter::new(OutputFormat::Table);
        let output = formatter.format_report(&make_report());

        assert!(output.starts_with("App: Example Game (com.example.game)"));
        assert!(output.contains("Region"));
        assert!(output.contains("Min USD"));
        assert!(output.contains("🇮🇩 ID"));
        assert!(output.contains("92.88"));
        assert!(output.contains("Total: 3 regions"));
        assert!(output.contains("Cheapest: ID ($0.93)"));
        assert!(output.contains("Excluded: FR (not found)"));
        assert!(!output.contains("Max RUB"));

        // Cheapest row comes first
        let id_pos = output.find("🇮🇩 ID").unwrap();
        let us_pos = output.find("🇺🇸 US").unwrap();
        assert!(id_pos < us_pos);
    }

    #[test]
    fn test_table_reference_column() {
        let formatter = Formatter::new(OutputFormat::Table);
        let output = formatter.format_report(&make_reference_report());
        assert!(output.contains("Max RUB"));
        assert!(output.contains("8359.20"));
    }

    #[test]
    fn test_table_empty() {
        let formatter = Formatter::new(OutputFormat::Table);
        let output = formatter.format_report(&Report::new("com.example.game"));
        assert!(output.contains("No prices found."));
        assert!(!output.contains("Excluded"));
    }

    #[test]
    fn test_table_long_text_truncation() {
        let mut report = Report::new("app");
        report.quotes = vec![make_quote("RU", "RUB", &"₽".repeat(60), 100, 100)];

        let output = Formatter::new(OutputFormat::Table).format_report(&report);
        assert!(output.contains(&format!("{}...", "₽".repeat(37))));
        assert!(!output.contains(&"₽".repeat(38)));
    }

    #[test]
    fn test_markdown_report() {
        let formatter = Formatter::new(OutputFormat::Markdown);
        let output = formatter.format_report(&make_report());

        assert!(output.contains("## Example Game (com.example.game)"));
        assert!(output.contains("| Region | Currency | Min USD | Max USD | Original |"));
        assert!(output.contains("| 🇮🇩 ID | IDR | 0.93 | 92.88 | Rp 15.000 - Rp 1.500.000 per item |"));
        assert!(output.contains("*3 regions priced*"));
        assert!(output.contains("- FR: not found"));
    }

    #[test]
    fn test_markdown_reference_column() {
        let formatter = Formatter::new(OutputFormat::Markdown);
        let output = formatter.format_report(&make_reference_report());
        assert!(output.contains("| Max RUB |"));
        assert!(output.contains("| 0.93 | 92.88 | 8359.20 | Rp"));
    }

    #[test]
    fn test_markdown_empty() {
        let output = Formatter::new(OutputFormat::Markdown).format_report(&Report::new("app"));
        assert!(output.contains("*No prices found.*"));
    }

    #[test]
    fn test_csv_report() {
        let formatter = Formatter::new(OutputFormat::Csv);
        let output = formatter.format_report(&make_report());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Min Price (USD),Max Price (USD),Country,Currency,Original Price");
        assert_eq!(lines[1], "0.93,92.88,ID,IDR,Rp 15.000 - Rp 1.500.000 per item");
        assert_eq!(lines[2], "0.99,99.99,US,USD,$0.99 - $99.99 per item");
        assert_eq!(lines[3], "1.03,77.00,JP,JPY,\"¥160 - ¥12,000 per item\"");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_csv_reference_column() {
        let output = Formatter::new(OutputFormat::Csv).format_report(&make_reference_report());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[0],
            "Min Price (USD),Max Price (USD),Max Price (RUB),Country,Currency,Original Price"
        );
        assert_eq!(lines[1], "0.93,92.88,8359.20,ID,IDR,Rp 15.000 - Rp 1.500.000 per item");
    }

    #[test]
    fn test_csv_empty() {
        let output = Formatter::new(OutputFormat::Csv).format_report(&Report::new("app"));
        assert_eq!(output, "Min Price (USD),Max Price (USD),Country,Currency,Original Price");
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(Formatter::csv_escape("simple"), "simple");
        assert_eq!(Formatter::csv_escape("with,comma"), "\"with,comma\"");
        assert_eq!(Formatter::csv_escape("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_format_regions() {
        let regions = vec![RegionTarget::new("JP"), RegionTarget::new("US")];

        let table = Formatter::new(OutputFormat::Table).format_regions(&regions);
        assert!(table.contains("🇯🇵 JP   JPY"));
        assert!(table.contains("Total: 2 regions"));

        let csv = Formatter::new(OutputFormat::Csv).format_regions(&regions);
        assert_eq!(csv, "Country,Currency\nJP,JPY\nUS,USD");

        let json = Formatter::new(OutputFormat::Json).format_regions(&regions);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["currency_code"], "JPY");

        let md = Formatter::new(OutputFormat::Markdown).format_regions(&regions);
        assert!(md.contains("| 🇺🇸 US | USD |"));
    }
}
