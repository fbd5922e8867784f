//! Tick placement and label formatting.

/// Step for about `desired` intervals over `span`, rounded up to 1, 2 or 5 x 10^k.
pub fn nice_step(span: f64, desired: usize) -> f64 {
    let raw = span.abs() / desired.max(1) as f64;
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let base = 10f64.powi(raw.log10().floor() as i32);
    let mant = raw / base;
    let nice = if mant <= 1.0 {
        1.0
    } else if mant <= 2.0 {
        2.0
    } else if mant <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * base
}

/// Multiples of a nice step within `[min, max]`, at most `desired * 4 + 2`
/// of them. Non-finite bounds give no ticks.
pub fn ticks(min: f64, max: f64, desired: usize) -> (Vec<f64>, f64) {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let step = nice_step(hi - lo, desired);
    let mut out: Vec<f64> = Vec::new();
    if !lo.is_finite() || !hi.is_finite() {
        return (out, step);
    }
    let cap = desired.max(1) * 4 + 2;
    let mut k = (lo / step).ceil();
    // Guard against float drift on the upper bound.
    while out.len() < cap && k * step <= hi + step * 1e-9 {
        let v = k * step;
        // At large magnitudes `k + 1` can round back to `k`.
        if out.last().is_some_and(|&last| v <= last) {
            break;
        }
        out.push(v);
        k += 1.0;
    }
    (out, step)
}

/// Genomic position label; the unit is chosen from the tick step and the
/// decimals are the fewest that keep adjacent ticks distinct.
pub fn format_position(bp: f64, step: f64) -> String {
    let (scale, unit) = if step >= 1e5 {
        (1e6, "Mb")
    } else if step >= 500.0 {
        (1e3, "kb")
    } else {
        (1.0, "bp")
    };
    let decimals = if scale == 1.0 {
        0
    } else {
        let scaled_step = step / scale;
        let mut d = 0usize;
        while d < 6 && (scaled_step * 10f64.powi(d as i32)).fract().abs() > 1e-6 {
            d += 1;
        }
        d
    };
    if unit == "bp" {
        format!("{} bp", group_thousands(bp.round() as i64))
    } else {
        format!("{:.*} {}", decimals, bp / scale, unit)
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

/// Compact numeric label, like `%g`.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if v == 0.0 {
        return "0".to_string();
    }
    let abs = v.abs();
    if !(1e-3..1e5).contains(&abs) {
        let s = format!("{:.2e}", v);
        // 1.50e6 -> 1.5e6
        return match s.split_once('e') {
            Some((m, e)) => {
                let m = if m.contains('.') { m.trim_end_matches('0').trim_end_matches('.') } else { m };
                format!("{}e{}", m, e)
            }
            None => s,
        };
    }
    let digits = (3 - abs.log10().floor() as i32 - 1).clamp(0, 6) as usize;
    let s = format!("{:.*}", digits, v);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
