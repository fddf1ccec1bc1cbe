/// Format a float as its shortest round-trip text, always keeping a
/// fractional part so whole numbers stay recognisably decimal.
///
/// # Examples
///
/// ```
/// use telecom_core::formatting::format_decimal;
///
/// assert_eq!(format_decimal(30.0), "30.0");
/// assert_eq!(format_decimal(15.5), "15.5");
/// assert_eq!(format_decimal(0.1 + 0.2), "0.30000000000000004");
/// assert_eq!(format_decimal(-2.0), "-2.0");
/// ```
pub fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Format a monetary amount with exactly two fraction digits.
///
/// # Examples
///
/// ```
/// use telecom_core::formatting::format_amount;
///
/// assert_eq!(format_amount(1234.5), "1234.50");
/// assert_eq!(format_amount(0.0), "0.00");
/// assert_eq!(format_amount(12.349), "12.35");
/// ```
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}
