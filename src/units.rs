//! Unit labels and imperial conversions for `wmoUnit:*` tokens used by the grid service.

/// Short display label for a unit token. Unknown tokens are shown as-is.
pub fn display_unit(unit: &str) -> &str {
    match unit {
        "wmoUnit:degC" => "C",
        "wmoUnit:km_h-1" => "kph",
        "wmoUnit:percent" => "%",
        "wmoUnit:mm" => "mm",
        "wmoUnit:m" => "m",
        "wmoUnit:degree_(angle)" => "deg",
        "wmoUnit:Pa" => "Pa",
        _ => unit,
    }
}

/// Convert a value to imperial units, returning the converted value and its display label.
///
/// Units without an imperial counterpart are returned unchanged with their usual label.
pub fn to_imperial(value: f64, unit: &str) -> (f64, &str) {
    match unit {
        "wmoUnit:degC" => (value * 9.0 / 5.0 + 32.0, "F"),
        "wmoUnit:km_h-1" => (value * 0.621371, "mph"),
        "wmoUnit:mm" => (value * 0.0393701, "in"),
        "wmoUnit:m" => (value * 3.28084, "ft"),
        _ => (value, display_unit(unit)),
    }
}

/// Format a number with at most `digits` significant digits, trimming trailing zeros.
/// `format_significant(12.3456, 5) == "12.346"`, `format_significant(20.0, 5) == "20"`.
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        // also covers -0.0
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i64 + 1;
    let decimals = (digits as i64 - magnitude).max(0) as usize;
    let s = format!("{value:.decimals$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Format a value + unit pair for a table cell, e.g. `21.5 C` or `70.7 F` in imperial mode.
pub fn format_value(value: f64, unit: &str, imperial: bool) -> String {
    let (value, label) = if imperial {
        to_imperial(value, unit)
    } else {
        (value, display_unit(unit))
    };
    format!("{} {}", format_significant(value, 5), label)
}
