use thiserror::Error;

/// Money is held as integer minor units (paise, cents) so that splits and
/// advance offsets stay exact. Rs. 12.50 = 1250.
pub type Cents = i64;

/// Format cents as a plain decimal string.
/// Example: 125000 -> "1250.00", -40 -> "-0.40"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Format cents prefixed with a currency label, e.g. "Rs. 1250.00".
pub fn format_money(label: &str, cents: Cents) -> String {
    if label.is_empty() {
        format_cents(cents)
    } else {
        format!("{} {}", label, format_cents(cents))
    }
}

/// Parse a decimal string into cents.
/// Accepts "3000", "12.5", "12.50" and ".75"; rejects more than two decimals.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseCentsError::Empty);
    }

    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, fraction_str) = match digits.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (digits, ""),
    };

    if fraction_str.contains('.') {
        return Err(ParseCentsError::InvalidFormat(input.to_string()));
    }
    if fraction_str.len() > 2 {
        return Err(ParseCentsError::TooPrecise(input.to_string()));
    }
    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat(input.to_string()));
    }

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !is_digits(units_str) || !is_digits(fraction_str) {
        return Err(ParseCentsError::InvalidFormat(input.to_string()));
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat(input.to_string()))?
    };
    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        // "12.5" means fifty cents
        1 => fraction_str.parse::<i64>().unwrap_or(0) * 10,
        _ => fraction_str.parse().unwrap_or(0),
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(|| ParseCentsError::InvalidFormat(input.to_string()))?;

    Ok(if negative { -cents } else { cents })
}

/// Split `amount` into `parts` whole-cent shares that sum exactly to `amount`.
/// The leftover cents go one each to the first shares.
pub fn split_evenly(amount: Cents, parts: usize) -> Vec<Cents> {
    if parts == 0 {
        return Vec::new();
    }
    let n = parts as i64;
    let base = amount / n;
    let remainder = (amount % n) as usize;
    (0..parts)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCentsError {
    #[error("empty amount")]
    Empty,

    #[error("invalid money format: '{0}'")]
    InvalidFormat(String),

    #[error("amount '{0}' has more than two decimal places")]
    TooPrecise(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(125000), "1250.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-40), "-0.40");
    }

    #[test]
    fn test_format_money_with_label() {
        assert_eq!(format_money("Rs.", 300000), "Rs. 3000.00");
        assert_eq!(format_money("", 300000), "3000.00");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("3000"), Ok(300000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents("12.05"), Ok(1205));
        assert_eq!(parse_cents(".75"), Ok(75));
        assert_eq!(parse_cents(" 400 "), Ok(40000));
        assert_eq!(parse_cents("-5"), Ok(-500));
    }

    #[test]
    fn test_parse_cents_rejects_garbage() {
        assert_eq!(parse_cents(""), Err(ParseCentsError::Empty));
        assert!(matches!(
            parse_cents("12.3.4"),
            Err(ParseCentsError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_cents("abc"),
            Err(ParseCentsError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_cents("."),
            Err(ParseCentsError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_cents("1.999"),
            Err(ParseCentsError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_split_evenly_exact() {
        assert_eq!(split_evenly(1_000_000, 8), vec![125_000; 8]);
    }

    #[test]
    fn test_split_evenly_distributes_remainder_first() {
        let shares = split_evenly(100, 3);
        assert_eq!(shares, vec![34, 33, 33]);
        assert_eq!(shares.iter().sum::<Cents>(), 100);
    }

    #[test]
    fn test_split_evenly_zero_parts() {
        assert!(split_evenly(100, 0).is_empty());
    }
}
