//! Number formatting shared by the CLI, TUI and spliced LLM answers.

/// `1234567.891` → `$1,234,567.89`
pub fn currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u64;
    format!("{}${}.{:02}", sign, thousands(cents / 100), cents % 100)
}

/// `1234567.891` → `$1,234,568`
pub fn currency_whole(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}", sign, thousands(value.abs().round() as u64))
}

/// `1234567` → `1,234,567`
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
