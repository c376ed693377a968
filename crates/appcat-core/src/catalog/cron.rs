//! Cron schedule syntax check for jobs.
//!
//! Accepts standard five-field expressions (minute, hour, day of month,
//! month, day of week), the `@yearly`-style descriptors and `@every <duration>`.

const DESCRIPTORS: &[&str] = &[
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
];

const MONTHS: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const DAYS: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    question_mark: bool,
}

const FIELDS: [FieldSpec; 5] = [
    FieldSpec { name: "minute", min: 0, max: 59, names: &[], question_mark: false },
    FieldSpec { name: "hour", min: 0, max: 23, names: &[], question_mark: false },
    FieldSpec { name: "day of month", min: 1, max: 31, names: &[], question_mark: true },
    FieldSpec { name: "month", min: 1, max: 12, names: MONTHS, question_mark: false },
    FieldSpec { name: "day of week", min: 0, max: 6, names: DAYS, question_mark: true },
];

/// Check a cron schedule, returning a description of the first problem.
pub fn validate_cron(expr: &str) -> Result<(), String> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err("empty schedule".to_string());
    }

    if let Some(rest) = expr.strip_prefix("@every") {
        return validate_every(rest.trim());
    }
    if expr.starts_with('@') {
        return if DESCRIPTORS.contains(&expr) {
            Ok(())
        } else {
            Err(format!("unknown descriptor «{expr}»"))
        };
    }

    let parts: Vec<&str> = expr.split_whitespace().collect();
    if parts.len() != FIELDS.len() {
        return Err(format!(
            "expected {} fields, found {}",
            FIELDS.len(),
            parts.len()
        ));
    }
    for (part, spec) in parts.iter().zip(FIELDS.iter()) {
        validate_field(part, spec)?;
    }
    Ok(())
}

fn validate_field(field: &str, spec: &FieldSpec) -> Result<(), String> {
    if spec.question_mark && field == "?" {
        return Ok(());
    }
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };
        if let Some(step) = step {
            match step.parse::<u32>() {
                Ok(s) if s > 0 => {}
                _ => return Err(format!("{}: bad step «{step}»", spec.name)),
            }
        }
        if range == "*" {
            continue;
        }
        let (lo, hi) = match range.split_once('-') {
            Some((lo, hi)) => (value(lo, spec)?, value(hi, spec)?),
            None => {
                let v = value(range, spec)?;
                (v, v)
            }
        };
        if lo > hi {
            return Err(format!("{}: empty range «{range}»", spec.name));
        }
    }
    Ok(())
}

fn value(s: &str, spec: &FieldSpec) -> Result<u32, String> {
    let upper = s.to_ascii_uppercase();
    if let Some(pos) = spec.names.iter().position(|n| *n == upper) {
        // month names are 1-based
        return Ok(pos as u32 + spec.min);
    }
    let v: u32 = s
        .parse()
        .map_err(|_| format!("{}: bad value «{s}»", spec.name))?;
    if v < spec.min || v > spec.max {
        return Err(format!(
            "{}: value {v} outside {}..={}",
            spec.name, spec.min, spec.max
        ));
    }
    Ok(v)
}

fn validate_every(duration: &str) -> Result<(), String> {
    if duration.is_empty() {
        return Err("@every requires a duration".to_string());
    }
    let mut digits = String::new();
    let mut total: u64 = 0;
    let mut units = 0;
    for c in duration.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let factor = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            _ => return Err(format!("bad duration «{duration}»")),
        };
        let n: u64 = digits
            .parse()
            .map_err(|_| format!("bad duration «{duration}»"))?;
        total = total.saturating_add(n.saturating_mul(factor));
        digits.clear();
        units += 1;
    }
    if !digits.is_empty() || units == 0 {
        return Err(format!("bad duration «{duration}»"));
    }
    if total == 0 {
        return Err(format!("zero duration «{duration}»"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_schedules() {
        for expr in [
            "* * * * *",
            "0 0 * * *",
            "*/5 * * * *",
            "0 9-17 * * MON-FRI",
            "30 2 1,15 * ?",
            "0 0 1 jan *",
            "@daily",
            "@every 1h30m",
            "@every 45s",
        ] {
            assert!(validate_cron(expr).is_ok(), "{expr}");
        }
    }

    #[test]
    fn test_invalid_schedules() {
        for expr in [
            "",
            "* * * *",
            "60 * * * *",
            "* 24 * * *",
            "* * 0 * *",
            "* * * 13 *",
            "*/0 * * * *",
            "5-1 * * * *",
            "? * * * *",
            "@sometimes",
            "@every",
            "@every 10",
            "@every 0s",
            "@every 1d",
        ] {
            assert!(validate_cron(expr).is_err(), "{expr}");
        }
    }
}
