//! CSV header parsing and normalization.

/// Lower-cases and trims a header cell.
pub fn normalize_header(value: &str) -> String {
    value.trim().trim_matches('\u{feff}').to_lowercase()
}

/// Parses a CSV line into fields, handling quoted values.
///
/// Fields are returned verbatim (trimmed only), so they can be used to
/// address the columns Polars reads from the same file.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes => {
                in_quotes = true;
            }
            '"' if in_quotes => {
                // Check for escaped quote ("")
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_line_simple() {
        assert_eq!(parse_csv_line("A,B,C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_parse_csv_line_quoted() {
        assert_eq!(
            parse_csv_line(r#""DUPERSID","CCSR1X",PERWT18F"#),
            vec!["DUPERSID", "CCSR1X", "PERWT18F"]
        );
    }

    #[test]
    fn test_parse_csv_line_escaped_quote() {
        assert_eq!(parse_csv_line(r#""a ""b""",c"#), vec![r#"a "b""#, "c"]);
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" PERWT18F "), "perwt18f");
        assert_eq!(normalize_header("\u{feff}DUPERSID"), "dupersid");
    }
}
