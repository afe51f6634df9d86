//! Archive paths read by the ingestion
//!
//! These must match the game's package layout exactly; a wrong path surfaces
//! as `NotFound`. Localization templates contain a `{language}` placeholder
//! that is replaced by the language's file stem (`english`, `schinese`, ...).

/// Hero definitions
pub const HEROES: &str = "scripts/npc/npc_heroes.txt";

/// Ability definitions
pub const ABILITIES: &str = "scripts/npc/npc_abilities.txt";

/// Item definitions (including neutral items)
pub const ITEMS: &str = "scripts/npc/items.txt";

/// Neutral item tiers
pub const NEUTRAL_ITEMS: &str = "scripts/npc/neutral_items.txt";

/// Creep and summon definitions
pub const UNITS: &str = "scripts/npc/npc_units.txt";

/// Patch-notes manifest
pub const PATCH_NOTES: &str = "scripts/patchnotes.txt";

/// Ability and item tooltips
pub const LOCALIZATION_ABILITIES: &str = "resource/localization/abilities_{language}.txt";

/// General UI strings, hero and unit names
pub const LOCALIZATION_DOTA: &str = "resource/localization/dota_{language}.txt";

/// Hero biographies
pub const LOCALIZATION_HERO_LORE: &str = "resource/localization/hero_lore_{language}.txt";

/// Patch-note lines
pub const LOCALIZATION_PATCH_NOTES: &str =
    "resource/localization/patchnotes/patchnotes_{language}.txt";

const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// Fill the `{language}` placeholder of a template
pub fn expand(template: &str, language_stem: &str) -> String {
    template.replace(LANGUAGE_PLACEHOLDER, language_stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand() {
        assert_eq!(
            expand(LOCALIZATION_ABILITIES, "english"),
            "resource/localization/abilities_english.txt"
        );
        assert_eq!(
            expand(LOCALIZATION_PATCH_NOTES, "schinese"),
            "resource/localization/patchnotes/patchnotes_schinese.txt"
        );
        assert_eq!(expand(HEROES, "english"), HEROES);
    }
}
