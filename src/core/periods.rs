use chrono::NaiveDate;

/// Maps an upstream period label to the first day of that period.
///
/// Accepted forms: `2024-03-15`, `2024-03`, `2024M03`, `2024-Q1`, `2024Q1`,
/// `2024-Q01`, `2024-S2`, `2024S2`, `2024`.
pub fn parse_period(label: &str) -> Option<NaiveDate> {
    let label = label.trim();

    if let Ok(date) = NaiveDate::parse_from_str(label, "%Y-%m-%d") {
        return Some(date);
    }

    let (year, rest) = split_year(label)?;
    if rest.is_empty() {
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    let rest = rest.strip_prefix('-').unwrap_or(rest);
    let month = match rest.chars().next()? {
        'Q' | 'q' => {
            let quarter: u32 = rest[1..].parse().ok()?;
            if !(1..=4).contains(&quarter) {
                return None;
            }
            (quarter - 1) * 3 + 1
        }
        'S' | 's' | 'H' | 'h' => {
            let half: u32 = rest[1..].parse().ok()?;
            if !(1..=2).contains(&half) {
                return None;
            }
            (half - 1) * 6 + 1
        }
        'M' | 'm' => rest[1..].parse().ok()?,
        c if c.is_ascii_digit() && rest.len() <= 2 => rest.parse().ok()?,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, 1)
}

fn split_year(label: &str) -> Option<(i32, &str)> {
    if label.len() < 4 || !label.is_char_boundary(4) {
        return None;
    }
    let (year, rest) = label.split_at(4);
    if !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((year.parse().ok()?, rest))
}

/// Column header format used by the recent-periods table, e.g. `Mar 2024`.
pub fn format_period(date: &NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_monthly_labels() {
        assert_eq!(parse_period("2024-03"), Some(d(2024, 3, 1)));
        assert_eq!(parse_period("2024M03"), Some(d(2024, 3, 1)));
        assert_eq!(parse_period(" 2024-11 "), Some(d(2024, 11, 1)));
    }

    #[test]
    fn test_quarter_half_and_year_labels() {
        assert_eq!(parse_period("2023-Q2"), Some(d(2023, 4, 1)));
        assert_eq!(parse_period("2023Q4"), Some(d(2023, 10, 1)));
        assert_eq!(parse_period("2023-Q03"), Some(d(2023, 7, 1)));
        assert_eq!(parse_period("2023-S2"), Some(d(2023, 7, 1)));
        assert_eq!(parse_period("2023"), Some(d(2023, 1, 1)));
    }

    #[test]
    fn test_full_dates_kept() {
        assert_eq!(parse_period("2024-02-29"), Some(d(2024, 2, 29)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(parse_period(""), None);
        assert_eq!(parse_period("abc"), None);
        assert_eq!(parse_period("2024-13"), None);
        assert_eq!(parse_period("2024-Q5"), None);
        assert_eq!(parse_period("24-01"), None);
    }

    #[test]
    fn test_format_period() {
        assert_eq!(format_period(&d(2024, 3, 1)), "Mar 2024");
    }
}
