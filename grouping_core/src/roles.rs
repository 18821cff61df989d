//! Role enumeration and the pure role resolver.
//!
//! Resolution precedence, highest signal applied last:
//! 1. pets short-circuit to [`Role::Pet`],
//! 2. specialization mapping, else class default, else ranged,
//! 3. melee-healer class override (healer demoted to melee),
//! 4. assigned-role authority override (tank/healer only, config gated).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grouping_config::GroupingConfig;

/// The five mutually exclusive display roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Tank,
    Melee,
    Healer,
    Ranged,
    Pet,
}

pub const ROLE_COUNT: usize = 5;

pub const ALL_ROLES: [Role; ROLE_COUNT] = [
    Role::Tank,
    Role::Melee,
    Role::Healer,
    Role::Ranged,
    Role::Pet,
];

impl Role {
    pub fn index(self) -> usize {
        match self {
            Role::Tank => 0,
            Role::Melee => 1,
            Role::Healer => 2,
            Role::Ranged => 3,
            Role::Pet => 4,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Tank => "tank",
            Role::Melee => "melee",
            Role::Healer => "healer",
            Role::Ranged => "ranged",
            Role::Pet => "pet",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tank" => Ok(Role::Tank),
            "melee" => Ok(Role::Melee),
            "healer" => Ok(Role::Healer),
            "ranged" => Ok(Role::Ranged),
            "pet" => Ok(Role::Pet),
            _ => Err(()),
        }
    }
}

/// Playable classes. Immutable once observed for a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Class {
    Warrior,
    Paladin,
    Hunter,
    Rogue,
    Priest,
    DeathKnight,
    Shaman,
    Mage,
    Warlock,
    Monk,
    Druid,
    DemonHunter,
    Evoker,
}

impl FromStr for Class {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WARRIOR" => Ok(Class::Warrior),
            "PALADIN" => Ok(Class::Paladin),
            "HUNTER" => Ok(Class::Hunter),
            "ROGUE" => Ok(Class::Rogue),
            "PRIEST" => Ok(Class::Priest),
            "DEATHKNIGHT" => Ok(Class::DeathKnight),
            "SHAMAN" => Ok(Class::Shaman),
            "MAGE" => Ok(Class::Mage),
            "WARLOCK" => Ok(Class::Warlock),
            "MONK" => Ok(Class::Monk),
            "DRUID" => Ok(Class::Druid),
            "DEMONHUNTER" => Ok(Class::DemonHunter),
            "EVOKER" => Ok(Class::Evoker),
            _ => Err(()),
        }
    }
}

/// Specialization code as reported by the inspection provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecId(pub u16);

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse role assigned by the external authority (e.g. raid leader).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedRole {
    Tank,
    Healer,
    Damager,
    #[default]
    None,
}

/// Specialization → role. Unknown codes map to `None` and are treated as
/// absent by the resolver, never as errors.
pub fn spec_role(spec: SpecId) -> Option<Role> {
    let role = match spec.0 {
        // Tanks.
        73 | 66 | 104 | 250 | 268 | 581 => Role::Tank,
        // Healers.
        65 | 105 | 256 | 257 | 264 | 270 | 1468 => Role::Healer,
        // Melee damage.
        71 | 72 | 70 | 103 | 251 | 252 | 255 | 259 | 260 | 261 | 263 | 269 | 577 => Role::Melee,
        // Ranged damage.
        62 | 63 | 64 | 102 | 253 | 254 | 258 | 262 | 265 | 266 | 267 | 1467 | 1473 => Role::Ranged,
        _ => return None,
    };
    Some(role)
}

/// Class → provisional role used until specialization data arrives.
pub fn class_default_role(class: Class) -> Role {
    match class {
        Class::Warrior
        | Class::Paladin
        | Class::Rogue
        | Class::DeathKnight
        | Class::Monk
        | Class::DemonHunter => Role::Melee,
        Class::Priest => Role::Healer,
        Class::Hunter | Class::Shaman | Class::Mage | Class::Warlock | Class::Druid
        | Class::Evoker => Role::Ranged,
    }
}

/// Snapshot of the cached inputs the resolver consumes. Pure data; the
/// resolver never performs I/O.
#[derive(Clone, Copy, Debug)]
pub struct ResolveView {
    pub pet: bool,
    pub class: Option<Class>,
    pub spec: Option<SpecId>,
    pub assigned: AssignedRole,
}

/// Map cached member attributes to exactly one role.
pub fn resolve_role(view: &ResolveView, config: &GroupingConfig) -> Role {
    if view.pet {
        return Role::Pet;
    }

    let mut role = view
        .spec
        .and_then(spec_role)
        .or_else(|| view.class.map(class_default_role))
        .unwrap_or(Role::Ranged);

    if role == Role::Healer {
        if let Some(class) = view.class {
            if config.is_melee_healer(class) {
                role = Role::Melee;
            }
        }
    }

    // Authority override applies after the melee-healer adjustment and only
    // when explicitly enabled.
    if config.prefer_assigned_role {
        match view.assigned {
            AssignedRole::Tank => role = Role::Tank,
            AssignedRole::Healer => role = Role::Healer,
            AssignedRole::Damager | AssignedRole::None => {}
        }
    }

    role
}
