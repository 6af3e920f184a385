//! Rarity tables: orb level caps and category slot counts.
//!
//! Orbs may carry any of the six rarities. Categories only use the four upper ranks, so they get
//! their own [CategoryRarity] type and every string crossing into a category goes through
//! [normalize_category_rarity].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Magic,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Self::Common,
        Self::Magic,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
        Self::Mythic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Magic => "Magic",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
            Self::Mythic => "Mythic",
        }
    }

    /// Highest upgrade level an orb of this rarity can reach.
    pub fn level_cap(&self) -> u32 {
        match self {
            Self::Common | Self::Magic => 3,
            Self::Rare | Self::Epic => 6,
            Self::Legendary | Self::Mythic => 9,
        }
    }

    /// Case-insensitive parse used on import boundaries. "Heroic" is the older name for Epic.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("heroic") {
            return Some(Self::Epic);
        }
        Self::ALL
            .into_iter()
            .find(|rarity| rarity.as_str().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rarity| rarity.as_str() == s)
            .ok_or_else(|| format!("unknown rarity '{s}'"))
    }
}

/// Rarity of an equipment category. Common and Magic have no slot meaning and cannot be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CategoryRarity {
    #[default]
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl CategoryRarity {
    pub const ALL: [CategoryRarity; 4] = [Self::Rare, Self::Epic, Self::Legendary, Self::Mythic];

    pub fn as_str(&self) -> &'static str {
        Rarity::from(*self).as_str()
    }

    pub fn slots(&self) -> u32 {
        match self {
            Self::Rare => 1,
            Self::Epic => 2,
            Self::Legendary => 3,
            Self::Mythic => 4,
        }
    }
}

impl From<CategoryRarity> for Rarity {
    fn from(value: CategoryRarity) -> Self {
        match value {
            CategoryRarity::Rare => Rarity::Rare,
            CategoryRarity::Epic => Rarity::Epic,
            CategoryRarity::Legendary => Rarity::Legendary,
            CategoryRarity::Mythic => Rarity::Mythic,
        }
    }
}

impl fmt::Display for CategoryRarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CategoryRarity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategoryRarity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(normalize_category_rarity(&raw))
    }
}

/// Slot count for a category rarity label. Total: unknown labels (including Common/Magic) are 0.
pub fn slots_for_rarity(rarity: &str) -> u32 {
    CategoryRarity::ALL
        .into_iter()
        .find(|candidate| candidate.as_str() == rarity)
        .map_or(0, |candidate| candidate.slots())
}

/// Maps a label onto the category ranks, falling back to Rare for anything else.
pub fn normalize_category_rarity(input: &str) -> CategoryRarity {
    CategoryRarity::ALL
        .into_iter()
        .find(|candidate| candidate.as_str() == input)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_for_rarity_is_total() {
        assert_eq!(slots_for_rarity("Rare"), 1);
        assert_eq!(slots_for_rarity("Epic"), 2);
        assert_eq!(slots_for_rarity("Legendary"), 3);
        assert_eq!(slots_for_rarity("Mythic"), 4);
        for other in ["Common", "Magic", "", "rare", "Heroic", "Mythic "] {
            assert_eq!(slots_for_rarity(other), 0, "{other:?} should have no slots");
        }
    }

    #[test]
    fn normalize_category_rarity_defaults_to_rare() {
        assert_eq!(normalize_category_rarity("Mythic"), CategoryRarity::Mythic);
        assert_eq!(normalize_category_rarity("Epic"), CategoryRarity::Epic);
        assert_eq!(normalize_category_rarity("Common"), CategoryRarity::Rare);
        assert_eq!(normalize_category_rarity("Magic"), CategoryRarity::Rare);
        assert_eq!(normalize_category_rarity("garbage"), CategoryRarity::Rare);
    }

    #[test]
    fn level_caps_follow_rarity_tiers() {
        assert_eq!(Rarity::Common.level_cap(), 3);
        assert_eq!(Rarity::Magic.level_cap(), 3);
        assert_eq!(Rarity::Rare.level_cap(), 6);
        assert_eq!(Rarity::Epic.level_cap(), 6);
        assert_eq!(Rarity::Legendary.level_cap(), 9);
        assert_eq!(Rarity::Mythic.level_cap(), 9);
    }

    #[test]
    fn lenient_parse_accepts_case_and_heroic_alias() {
        assert_eq!(Rarity::parse_lenient(" legendary "), Some(Rarity::Legendary));
        assert_eq!(Rarity::parse_lenient("Heroic"), Some(Rarity::Epic));
        assert_eq!(Rarity::parse_lenient("shiny"), None);
        assert!("rare".parse::<Rarity>().is_err());
    }

    #[test]
    fn category_rarity_deserializes_through_normalization() {
        let parsed: CategoryRarity = serde_json::from_str("\"Magic\"").expect("string parses");
        assert_eq!(parsed, CategoryRarity::Rare);
        let parsed: CategoryRarity = serde_json::from_str("\"Legendary\"").expect("string parses");
        assert_eq!(parsed, CategoryRarity::Legendary);
        assert_eq!(
            serde_json::to_string(&CategoryRarity::Mythic).expect("serializes"),
            "\"Mythic\""
        );
    }
}
