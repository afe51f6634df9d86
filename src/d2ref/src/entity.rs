//! Heroes, abilities, items and units
//!
//! Built from the npc scripts plus the localization table. The internal name
//! is the identity; the numeric id is kept as a secondary key.

use std::collections::{BTreeMap, HashMap, HashSet};

use d2kv::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::language::DEFAULT_LANGUAGE;
use crate::localisation::LocalisedValues;
use crate::Language;

const HERO_ID_FIELD: &str = "HeroID";
const ID_FIELD: &str = "ID";
const HERO_ALIASES_FIELD: &str = "NameAliases";
const ITEM_ALIASES_FIELD: &str = "ItemAliases";
const SUMMONED_FIELD: &str = "IsSummoned";
const FACETS_FIELD: &str = "Facets";
const ABILITY_SLOT_PREFIX: &str = "Ability";
const TEMPLATE_SUFFIX: &str = "_base";
const EMPTY_ABILITY_SLOT: &str = "generic_hidden";
const ALIAS_SEPARATOR: char = ';';

const ABILITY_NAME_PREFIX: &str = "DOTA_Tooltip_ability_";
const FACET_NAME_PREFIX: &str = "DOTA_Tooltip_Facet_";
const REAL_NAME_SUFFIX: &str = "_realname";

/// Kind of game entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Hero,
    Ability,
    Item,
    Creep,
    Summon,
}

/// Display labels, resolved where records are presented
pub const ENTITY_TYPE_LABELS: &[(EntityType, &str)] = &[
    (EntityType::Hero, "Hero"),
    (EntityType::Ability, "Ability"),
    (EntityType::Item, "Item"),
    (EntityType::Creep, "Creep"),
    (EntityType::Summon, "Summon"),
];

impl EntityType {
    pub fn label(self) -> &'static str {
        ENTITY_TYPE_LABELS
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, label)| *label)
            .unwrap_or("Unknown")
    }
}

/// A named game entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub internal_name: String,
    pub entity_id: i64,
    pub entity_type: EntityType,
    /// Display name per language that has one
    pub names: BTreeMap<Language, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
}

/// Localization key of an ability's or item's display name
pub fn ability_name_key(internal_name: &str) -> String {
    format!("{}{}", ABILITY_NAME_PREFIX, internal_name)
}

/// Localization key of a facet's display name
pub fn facet_name_key(internal_name: &str) -> String {
    format!("{}{}", FACET_NAME_PREFIX, internal_name)
}

/// Builds [`Entity`] records from npc script documents
pub struct EntityExtractor<'a> {
    values: &'a LocalisedValues,
}

impl<'a> EntityExtractor<'a> {
    pub fn new(values: &'a LocalisedValues) -> Self {
        Self { values }
    }

    /// Heroes from `npc_heroes.txt`
    pub fn heroes(&self, document: &Document) -> Vec<Entity> {
        self.extract(document, HERO_ID_FIELD, |node| {
            let mut entity = self.entity(node, EntityType::Hero, &node.name);
            entity.aliases = aliases(node, HERO_ALIASES_FIELD);
            entity.real_name = self
                .values
                .get(DEFAULT_LANGUAGE, &format!("{}{}", node.name, REAL_NAME_SUFFIX))
                .map(str::to_string);
            entity
        })
    }

    /// Abilities from `npc_abilities.txt`
    pub fn abilities(&self, document: &Document) -> Vec<Entity> {
        self.extract(document, ID_FIELD, |node| {
            self.entity(node, EntityType::Ability, &ability_name_key(&node.name))
        })
    }

    /// Items from `items.txt`
    pub fn items(&self, document: &Document) -> Vec<Entity> {
        self.extract(document, ID_FIELD, |node| {
            let mut entity = self.entity(node, EntityType::Item, &ability_name_key(&node.name));
            entity.aliases = aliases(node, ITEM_ALIASES_FIELD);
            entity
        })
    }

    /// Creeps and summons from `npc_units.txt`
    pub fn units(&self, document: &Document) -> Vec<Entity> {
        self.extract(document, ID_FIELD, |node| {
            let summoned = node.child(SUMMONED_FIELD).and_then(Node::parse_bool);
            let entity_type = if summoned == Some(true) {
                EntityType::Summon
            } else {
                EntityType::Creep
            };
            self.entity(node, entity_type, &node.name)
        })
    }

    fn extract<F>(&self, document: &Document, id_field: &str, build: F) -> Vec<Entity>
    where
        F: Fn(&Node) -> Entity,
    {
        let mut entities = Vec::new();

        for node in document.root_children() {
            if !node.is_branch() || is_template(&node.name) {
                continue;
            }

            let Some(id_node) = node.child(id_field) else {
                tracing::debug!(entry = %node.name, "entity without {} skipped", id_field);
                continue;
            };
            let Some(id) = id_node.parse_i64() else {
                tracing::warn!(
                    entry = %node.name,
                    value = ?id_node.as_text(),
                    "entity with non-numeric {} skipped",
                    id_field
                );
                continue;
            };

            let mut entity = build(node);
            entity.entity_id = id;
            entities.push(entity);
        }

        entities
    }

    fn entity(&self, node: &Node, entity_type: EntityType, name_key: &str) -> Entity {
        let names = self
            .values
            .languages()
            .into_iter()
            .filter_map(|language| {
                self.values
                    .get(language, name_key)
                    .map(|name| (language, name.to_string()))
            })
            .collect();

        Entity {
            internal_name: node.name.clone(),
            entity_id: 0,
            entity_type,
            names,
            aliases: Vec::new(),
            real_name: None,
        }
    }
}

fn is_template(name: &str) -> bool {
    name.ends_with(TEMPLATE_SUFFIX)
}

fn aliases(node: &Node, field: &str) -> Vec<String> {
    node.child_text(field)
        .map(|text| {
            text.split(ALIAS_SEPARATOR)
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Hero roster
// ============================================================================

/// Abilities and facets a hero declares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeroKit {
    pub abilities: HashSet<String>,
    pub facets: HashSet<String>,
}

/// Per-hero ability and facet identifiers, for resolving patch-note references
#[derive(Debug, Clone, Default)]
pub struct HeroRoster {
    heroes: HashMap<String, HeroKit>,
}

impl HeroRoster {
    /// Read `Ability<N>` slots and `Facets` from `npc_heroes.txt`
    pub fn from_document(document: &Document) -> Self {
        let mut roster = Self::default();

        for node in document.root_children() {
            if !node.is_branch() || is_template(&node.name) {
                continue;
            }

            let abilities = node
                .children()
                .iter()
                .filter(|c| is_ability_slot(&c.name))
                .filter_map(Node::as_text)
                .map(str::trim)
                .filter(|a| !a.is_empty() && *a != EMPTY_ABILITY_SLOT)
                .map(str::to_string)
                .collect();

            let facets = node
                .child(FACETS_FIELD)
                .map(Node::children)
                .unwrap_or(&[])
                .iter()
                .map(|f| f.name.clone())
                .collect();

            roster
                .heroes
                .insert(node.name.clone(), HeroKit { abilities, facets });
        }

        tracing::debug!(heroes = roster.heroes.len(), "built hero roster");
        roster
    }

    /// Add or replace a hero's kit
    pub fn with_hero<A, F>(mut self, hero: &str, abilities: A, facets: F) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        self.heroes.insert(
            hero.to_string(),
            HeroKit {
                abilities: abilities.into_iter().map(Into::into).collect(),
                facets: facets.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn kit(&self, hero: &str) -> Option<&HeroKit> {
        self.heroes.get(hero)
    }

    pub fn has_ability(&self, hero: &str, ability: &str) -> bool {
        self.kit(hero)
            .is_some_and(|kit| kit.abilities.contains(ability))
    }

    pub fn has_facet(&self, hero: &str, facet: &str) -> bool {
        self.kit(hero).is_some_and(|kit| kit.facets.contains(facet))
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}

/// `Ability1`, `Ability25`, ...
fn is_ability_slot(name: &str) -> bool {
    let split = ABILITY_SLOT_PREFIX.len();
    match (name.get(..split), name.get(split..)) {
        (Some(prefix), Some(digits)) => {
            prefix.eq_ignore_ascii_case(ABILITY_SLOT_PREFIX)
                && !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEROES: &str = r#"
    "DOTAHeroes"
    {
        "Version" "1"
        "npc_dota_hero_base" { "Ability1" "" }
        "npc_dota_hero_axe"
        {
            "HeroID" "2"
            "NameAliases" "mogul khan; axe"
            "Ability1" "axe_berserkers_call"
            "Ability2" "axe_battle_hunger"
            "Ability3" "generic_hidden"
            "Ability10" "special_bonus_unique_axe"
            "AbilityDraftDisabled" "1"
            "Facets"
            {
                "axe_one_man_army" { "Icon" "armor" }
            }
        }
        "npc_dota_hero_broken" { "HeroID" "two" }
        "npc_dota_hero_no_id" { "Ability1" "x" }
    }
    "#;

    fn parse(text: &str) -> Document {
        d2kv::parse(text, d2kv::ParseOptions::default()).unwrap()
    }

    fn values() -> LocalisedValues {
        LocalisedValues::from_entries([
            (Language::English, "npc_dota_hero_axe", "Axe"),
            (Language::Russian, "npc_dota_hero_axe", "Акс"),
            (Language::English, "npc_dota_hero_axe_realname", "Mogul Khan"),
            (Language::English, "DOTA_Tooltip_ability_item_blink", "Blink Dagger"),
            (Language::English, "DOTA_Tooltip_ability_axe_berserkers_call", "Berserker's Call"),
        ])
        .unwrap()
    }

    #[test]
    fn test_heroes() {
        let values = values();
        let heroes = EntityExtractor::new(&values).heroes(&parse(HEROES));

        assert_eq!(heroes.len(), 1);
        let axe = &heroes[0];
        assert_eq!(axe.internal_name, "npc_dota_hero_axe");
        assert_eq!(axe.entity_id, 2);
        assert_eq!(axe.entity_type, EntityType::Hero);
        assert_eq!(axe.names.get(&Language::Russian).map(String::as_str), Some("Акс"));
        assert_eq!(axe.aliases, vec!["mogul khan", "axe"]);
        assert_eq!(axe.real_name.as_deref(), Some("Mogul Khan"));
    }

    #[test]
    fn test_items_and_abilities() {
        let values = values();
        let extractor = EntityExtractor::new(&values);

        let items = extractor.items(&parse(
            r#""DOTAAbilities" {
                "Version" "1"
                "item_blink" { "ID" "1" "ItemAliases" "blink;dagger" }
            }"#,
        ));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].entity_type, EntityType::Item);
        assert_eq!(items[0].aliases, vec!["blink", "dagger"]);
        assert_eq!(
            items[0].names.get(&Language::English).map(String::as_str),
            Some("Blink Dagger")
        );

        let abilities = extractor.abilities(&parse(
            r#""DOTAAbilities" {
                "ability_base" { "ID" "0" }
                "axe_berserkers_call" { "ID" "5007" }
                "no_name" { "ID" "5008" }
            }"#,
        ));
        assert_eq!(abilities.len(), 2);
        assert_eq!(abilities[0].entity_id, 5007);
        assert!(abilities[1].names.is_empty());
        assert_eq!(abilities[1].real_name, None);
    }

    #[test]
    fn test_units_split_creeps_and_summons() {
        let values = values();
        let units = EntityExtractor::new(&values).units(&parse(
            r#""DOTAUnits" {
                "npc_dota_neutral_kobold" { "ID" "100" "IsNeutralUnitType" "1" }
                "npc_dota_lone_druid_bear1" { "ID" "101" "IsSummoned" "1" }
            }"#,
        ));
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].entity_type, EntityType::Creep);
        assert_eq!(units[1].entity_type, EntityType::Summon);
    }

    #[test]
    fn test_roster() {
        let roster = HeroRoster::from_document(&parse(HEROES));
        assert_eq!(roster.len(), 3);
        assert!(roster.has_ability("npc_dota_hero_axe", "axe_berserkers_call"));
        assert!(roster.has_ability("npc_dota_hero_axe", "special_bonus_unique_axe"));
        assert!(!roster.has_ability("npc_dota_hero_axe", "generic_hidden"));
        assert!(!roster.has_ability("npc_dota_hero_axe", "1"));
        assert!(roster.has_facet("npc_dota_hero_axe", "axe_one_man_army"));
        assert!(!roster.has_facet("npc_dota_hero_lina", "axe_one_man_army"));
    }

    #[test]
    fn test_ability_slot_names() {
        assert!(is_ability_slot("Ability1"));
        assert!(is_ability_slot("ability25"));
        assert!(!is_ability_slot("Ability"));
        assert!(!is_ability_slot("AbilityDraftDisabled"));
    }

    #[test]
    fn test_type_labels() {
        assert_eq!(EntityType::Summon.label(), "Summon");
        assert_eq!(ENTITY_TYPE_LABELS.len(), 5);
    }
}
