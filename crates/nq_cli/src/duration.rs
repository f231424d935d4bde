use std::str::FromStr;
use std::time::Duration;

/// A duration written like `90s`, `30m`, `1d` or `1h 15m 30s`; a trailing bare number is seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanDuration(pub Duration);

fn unit_seconds(unit: char) -> Option<u64> {
    match unit {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(3_600),
        'd' => Some(86_400),
        _ => None,
    }
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err("Duration must include a number".to_string());
        }

        let mut total: u64 = 0;
        while !rest.is_empty() {
            let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            let (digits, tail) = rest.split_at(digits_end);
            if digits.is_empty() {
                return Err(format!("Expected a number in duration {:?}", s));
            }
            let value: u64 = digits
                .parse()
                .map_err(|_| format!("Number too large in duration {:?}", s))?;

            let mut units = tail.chars();
            let multiplier = match units.next() {
                None => 1,
                Some(unit) => unit_seconds(unit).ok_or_else(|| format!("Invalid duration unit: {}", unit))?,
            };
            rest = units.as_str().trim_start();

            total = value
                .checked_mul(multiplier)
                .and_then(|seconds| total.checked_add(seconds))
                .ok_or_else(|| format!("Duration {:?} is too long", s))?;
        }

        if total == 0 {
            return Err("Duration must be longer than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total)))
    }
}
