//! Date formatting and export serialization.
//!
//! Pure functions converting between ISO and `DD/MM/YYYY` date text, plus
//! the semicolon-delimited spreadsheet export and the dated default file
//! names used by the CLI.

use chrono::NaiveDate;
use regex::Regex;

use crate::record::ShipmentRecord;

/// Byte-order mark prefixed to exported spreadsheets so consuming tools
/// detect UTF-8.
pub const UTF8_BOM: &str = "\u{feff}";

/// Strict pattern for display-formatted dates.
const DISPLAY_DATE_PATTERN: &str = r"^(\d{2})/(\d{2})/(\d{4})$";

/// Column headers of the spreadsheet export, in order.
pub const CSV_HEADERS: [&str; 6] = [
    "NUMERO_CONHECIMENTO",
    "NOME_PACIENTE",
    "DATA_ENVIO",
    "DESTINO",
    "DATA_RECEBIMENTO",
    "OBSERVACOES",
];

/// Field separator of the spreadsheet export. Semicolons keep the files
/// readable by spreadsheet tools configured for pt-BR locales.
const CSV_SEPARATOR: &str = ";";

/// Render a date as `DD/MM/YYYY`; `None` renders as the empty string.
#[must_use]
pub fn display_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => String::new(),
    }
}

/// Parse a `DD/MM/YYYY` string back into a date.
///
/// The match is strict: exactly two digits for day and month, four for the
/// year, no surrounding text. Anything else (including ISO-formatted input
/// and single-digit days) yields `None`, as does a calendar-invalid date.
#[must_use]
pub fn parse_display_date(input: &str) -> Option<NaiveDate> {
    let re = Regex::new(DISPLAY_DATE_PATTERN).ok()?;
    let captures = re.captures(input)?;
    let day: u32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let year: i32 = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The searchable text forms of a date: `DD/MM/YYYY MM/YYYY YYYY`.
///
/// Lets a free-text search match a full date, a month, or a year.
#[must_use]
pub fn search_date_text(date: NaiveDate) -> String {
    date.format("%d/%m/%Y %m/%Y %Y").to_string()
}

/// Wrap a field in double quotes, doubling any internal quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Serialize records to the semicolon-delimited spreadsheet format.
///
/// The payload starts with a UTF-8 BOM, then an unquoted header row, then
/// one row per record in input order with every field quoted. Dates are
/// rendered as `DD/MM/YYYY`; a pending receive date and a missing note both
/// serialize as empty fields.
#[must_use]
pub fn to_csv(records: &[ShipmentRecord]) -> String {
    let mut lines = vec![CSV_HEADERS.join(CSV_SEPARATOR)];
    for record in records {
        let fields = [
            quote(&record.tracking_number),
            quote(&record.patient_name),
            quote(&display_date(Some(record.ship_date))),
            quote(&record.destination),
            quote(&display_date(record.receive_date)),
            quote(record.note.as_deref().unwrap_or("")),
        ];
        lines.push(fields.join(CSV_SEPARATOR));
    }
    format!("{}{}", UTF8_BOM, lines.join("\n"))
}

/// Default file name for a spreadsheet export on the given day.
#[must_use]
pub fn default_export_filename(today: NaiveDate) -> String {
    format!("relatorio-remessas-{}.csv", today.format("%Y-%m-%d"))
}

/// Default file name for a backup export on the given day.
#[must_use]
pub fn default_backup_filename(today: NaiveDate) -> String {
    format!("backup-remessa-{}.json", today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date(Some(date(2024, 3, 1))), "01/03/2024");
        assert_eq!(display_date(None), "");
    }

    #[test]
    fn test_parse_display_date_valid() {
        assert_eq!(parse_display_date("01/03/2024"), Some(date(2024, 3, 1)));
        assert_eq!(parse_display_date("31/12/1999"), Some(date(1999, 12, 31)));
    }

    #[test]
    fn test_parse_display_date_rejects_non_matching() {
        assert_eq!(parse_display_date("2024-01-01"), None);
        assert_eq!(parse_display_date("1/1/2024"), None);
        assert_eq!(parse_display_date("01/03/24"), None);
        assert_eq!(parse_display_date(" 01/03/2024"), None);
        assert_eq!(parse_display_date("01/03/2024 extra"), None);
        assert_eq!(parse_display_date(""), None);
    }

    #[test]
    fn test_parse_display_date_rejects_invalid_calendar_dates() {
        assert_eq!(parse_display_date("31/02/2024"), None);
        assert_eq!(parse_display_date("00/01/2024"), None);
        assert_eq!(parse_display_date("01/13/2024"), None);
    }

    #[test]
    fn test_display_parse_round_trip() {
        for input in ["01/03/2024", "29/02/2024", "31/12/2030"] {
            let parsed = parse_display_date(input).unwrap();
            assert_eq!(display_date(Some(parsed)), input);
        }
    }

    #[test]
    fn test_search_date_text() {
        assert_eq!(search_date_text(date(2024, 3, 1)), "01/03/2024 03/2024 2024");
    }

    #[test]
    fn test_quote_doubles_internal_quotes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote(""), "\"\"");
    }

    #[test]
    fn test_to_csv_starts_with_bom_and_header() {
        let csv = to_csv(&[]);
        assert!(csv.starts_with(UTF8_BOM));
        assert_eq!(
            csv.trim_start_matches(UTF8_BOM),
            "NUMERO_CONHECIMENTO;NOME_PACIENTE;DATA_ENVIO;DESTINO;DATA_RECEBIMENTO;OBSERVACOES"
        );
    }

    #[test]
    fn test_to_csv_renders_pending_receive_date_empty() {
        let record = ShipmentRecord::new(
            "AWB123".to_string(),
            "joão".to_string(),
            date(2024, 3, 1),
            "sp".to_string(),
            None,
            None,
        )
        .normalized();

        let csv = to_csv(&[record]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "\"AWB123\";\"JOÃO\";\"01/03/2024\";\"SP\";\"\";\"\"");
    }

    #[test]
    fn test_to_csv_escapes_quotes_in_note() {
        let mut record = ShipmentRecord::new(
            "AWB1".to_string(),
            "ANA".to_string(),
            date(2024, 1, 2),
            "BA".to_string(),
            Some(date(2024, 1, 9)),
            Some("amostra \"congelada\"".to_string()),
        );
        record.id = "fixedid01".to_string();

        let csv = to_csv(&[record]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "\"AWB1\";\"ANA\";\"02/01/2024\";\"BA\";\"09/01/2024\";\"amostra \"\"congelada\"\"\""
        );
    }

    #[test]
    fn test_to_csv_preserves_input_order() {
        let first = ShipmentRecord::new(
            "B".to_string(),
            "B".to_string(),
            date(2024, 1, 1),
            "B".to_string(),
            None,
            None,
        );
        let second = ShipmentRecord::new(
            "A".to_string(),
            "A".to_string(),
            date(2024, 1, 1),
            "A".to_string(),
            None,
            None,
        );

        let csv = to_csv(&[first, second]);
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert!(rows[0].starts_with("\"B\""));
        assert!(rows[1].starts_with("\"A\""));
    }

    #[test]
    fn test_default_filenames() {
        let today = date(2024, 3, 1);
        assert_eq!(
            default_export_filename(today),
            "relatorio-remessas-2024-03-01.csv"
        );
        assert_eq!(
            default_backup_filename(today),
            "backup-remessa-2024-03-01.json"
        );
    }
}
