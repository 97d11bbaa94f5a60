fn group_thousands(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

fn signed_dollars(val: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, val.abs());
    let (int_part, dec_part) = match fixed.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (fixed.as_str(), None),
    };
    let body = match dec_part {
        Some(d) => format!("{}.{d}", group_thousands(int_part)),
        None => group_thousands(int_part),
    };
    // -0.004 rounds to $0.00, not -$0.00
    let negative = val < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    if negative {
        format!("-${body}")
    } else {
        format!("${body}")
    }
}

/// Dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    signed_dollars(val, 2)
}

/// Whole dollars for prose: $1,234,567
pub fn dollars(val: f64) -> String {
    signed_dollars(val, 0)
}

/// Ratio as a percentage with one decimal: 0.6428 -> 64.3%
pub fn pct(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Runway months, one decimal; unlimited runway prints as `inf`.
pub fn months(val: f64) -> String {
    if val.is_finite() {
        format!("{val:.1}")
    } else {
        "inf".to_string()
    }
}
