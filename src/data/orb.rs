use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rarity::Rarity;

/// Placeholder used when a result orb arrives without a usable type or set.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orb {
    #[serde(rename = "type")]
    pub orb_type: String,
    pub set: String,
    pub rarity: Rarity,
    pub value: f64,
    pub level: u32,
}

impl Orb {
    /// Builds an orb with value floored at 0 and level clipped to the rarity cap.
    pub fn new(
        orb_type: impl Into<String>,
        set: impl Into<String>,
        rarity: Rarity,
        value: f64,
        level: u32,
    ) -> Self {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        Self {
            orb_type: orb_type.into(),
            set: set.into(),
            rarity,
            value,
            level: level.min(rarity.level_cap()),
        }
    }

    /// Re-applies the value/level invariants to an orb that came from outside.
    pub fn normalized(self) -> Self {
        Self::new(self.orb_type, self.set, self.rarity, self.value, self.level)
    }
}

/// Parses an orb value: numbers pass through, strings may carry a trailing `%`.
/// Anything unparseable or non-finite is 0.
pub fn parse_value(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.strip_suffix('%').unwrap_or(s).trim().parse::<f64>().ok()
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Parses a level from a number or numeric string; fractions are floored, negatives become 0.
pub fn parse_level(raw: Option<&Value>) -> u32 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(level) if level.is_finite() && level > 0.0 => level.floor() as u32,
        _ => 0,
    }
}

/// Returns a finite JSON number, or `None` for anything else.
pub fn finite_number(raw: Option<&Value>) -> Option<f64> {
    raw.and_then(Value::as_f64).filter(|v| v.is_finite())
}

/// Trimmed string content, `None` when missing, non-string, or blank.
pub fn trimmed_text(raw: Option<&Value>) -> Option<String> {
    raw.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Coerces an orb from a solver response. Fields are passed through as given; only missing or
/// malformed fields are replaced (type/set -> "Unknown", rarity -> Rare, value/level -> 0).
pub fn coerce_result_orb(raw: &Value) -> Orb {
    let orb_type = trimmed_text(raw.get("type")).unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    let set = trimmed_text(raw.get("set"))
        .or_else(|| trimmed_text(raw.get("set_name")))
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    let rarity = raw
        .get("rarity")
        .and_then(Value::as_str)
        .and_then(Rarity::parse_lenient)
        .unwrap_or(Rarity::Rare);
    let value = finite_number(raw.get("value")).unwrap_or(0.0);
    let level = finite_number(raw.get("level"))
        .filter(|level| *level > 0.0)
        .map_or(0, |level| level.floor() as u32);

    Orb {
        orb_type,
        set,
        rarity,
        value,
        level,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_clamps_value_and_level() {
        let orb = Orb::new("X", "Y", Rarity::Common, -5.0, 10);
        assert_eq!(orb.value, 0.0);
        assert_eq!(orb.level, 3);

        let orb = Orb::new("X", "Y", Rarity::Mythic, 12.5, 7);
        assert_eq!(orb.value, 12.5);
        assert_eq!(orb.level, 7);
    }

    #[test]
    fn parse_value_handles_percent_strings() {
        assert_eq!(parse_value(Some(&json!("12.5%"))), 12.5);
        assert_eq!(parse_value(Some(&json!(" 7 "))), 7.0);
        assert_eq!(parse_value(Some(&json!(3))), 3.0);
        assert_eq!(parse_value(Some(&json!("abc%"))), 0.0);
        assert_eq!(parse_value(Some(&json!(null))), 0.0);
        assert_eq!(parse_value(None), 0.0);
    }

    #[test]
    fn parse_level_floors_and_rejects_negatives() {
        assert_eq!(parse_level(Some(&json!(4.9))), 4);
        assert_eq!(parse_level(Some(&json!("6"))), 6);
        assert_eq!(parse_level(Some(&json!(-2))), 0);
        assert_eq!(parse_level(Some(&json!(true))), 0);
    }

    #[test]
    fn result_orb_passes_fields_through() {
        let raw = json!({"type":"Flame","set":"Lucifer","rarity":"Rare","value":0,"level":1});
        let orb = coerce_result_orb(&raw);
        assert_eq!(orb.orb_type, "Flame");
        assert_eq!(orb.set, "Lucifer");
        assert_eq!(orb.rarity, Rarity::Rare);
        assert_eq!(orb.value, 0.0);
        assert_eq!(orb.level, 1);
    }

    #[test]
    fn result_orb_fills_missing_fields() {
        let raw = json!({"type":"   ","value":"12","level":null,"rarity":42});
        let orb = coerce_result_orb(&raw);
        assert_eq!(orb.orb_type, UNKNOWN_LABEL);
        assert_eq!(orb.set, UNKNOWN_LABEL);
        assert_eq!(orb.rarity, Rarity::Rare);
        assert_eq!(orb.value, 0.0);
        assert_eq!(orb.level, 0);
    }

    #[test]
    fn result_orb_accepts_set_name_key() {
        let orb = coerce_result_orb(&json!({"type":"Steel","set_name":"Mammon","rarity":"Epic"}));
        assert_eq!(orb.set, "Mammon");
        assert_eq!(orb.rarity, Rarity::Epic);
    }
}
