pub const CURRENCY: &str = "\u{20b9}";

/// Group the integer part the Indian way: last three digits, then pairs.
/// 1234567.5 -> "12,34,567.50"
pub fn grouped(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::new();
    let head_len = digits.len().saturating_sub(3);
    for (i, c) in digits[..head_len].iter().enumerate() {
        if i > 0 && (head_len - i) % 2 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    if head_len > 0 {
        out.push(',');
    }
    out.extend(&digits[head_len..]);

    if negative {
        format!("-{out}.{dec_part}")
    } else {
        format!("{out}.{dec_part}")
    }
}

/// Currency amount with symbol: ₹12,34,567.50
pub fn money(val: f64) -> String {
    let g = grouped(val);
    match g.strip_prefix('-') {
        Some(rest) => format!("-{CURRENCY}{rest}"),
        None => format!("{CURRENCY}{g}"),
    }
}

/// Plain two-decimal amount for machine-readable output.
pub fn plain(val: f64) -> String {
    format!("{val:.2}")
}

pub fn number(n: usize) -> String {
    let s = n.to_string();
    let mut out = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Compact axis label: ₹50k, ₹1.2L, ₹3Cr.
pub fn compact(val: f64) -> String {
    let (scaled, suffix) = if val >= 10_000_000.0 {
        (val / 10_000_000.0, "Cr")
    } else if val >= 100_000.0 {
        (val / 100_000.0, "L")
    } else if val >= 1000.0 {
        (val / 1000.0, "k")
    } else {
        return format!("{CURRENCY}{}", val as u64);
    };
    if scaled == scaled.floor() {
        format!("{CURRENCY}{}{suffix}", scaled as u64)
    } else {
        format!("{CURRENCY}{scaled:.1}{suffix}")
    }
}

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

pub fn month_name(month: u32) -> &'static str {
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown")
}

/// "2024-03" -> "Mar"
pub fn short_month(key: &str) -> String {
    key.split_once('-')
        .and_then(|(_, m)| m.parse::<u32>().ok())
        .map(|m| month_name(m).chars().take(3).collect())
        .unwrap_or_else(|| key.to_string())
}
