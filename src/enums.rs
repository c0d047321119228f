//! Game enumerations shared by the Census data, the simulations and the templates.
//!
//! Every enum serializes to its SCREAMING_SNAKE variant name so that it can be used as a map key
//! in template contexts, and carries the human readable label used on the site.
use serde::de::value::StrDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};
use strum_macros::FromRepr;

use crate::error::{Error, Result};

/// An enumeration that can be shown on the site.
pub trait Labeled: Sized + Copy {
    /// Name of the enum, used to scope label lookups from templates.
    const KIND: &'static str;

    fn label(&self) -> &'static str;
}

// Census ids map straight to the enum discriminants.
macro_rules! census_id {
    ($kind:ty) => {
        impl $kind {
            /// Builds the value from its Census numeric id.
            ///
            /// # Errors
            /// Returns `Err` if the id is not a known value of this enum.
            pub fn from_census_id(id: u32) -> Result<Self> {
                Self::from_repr(id).ok_or(Error::UnknownId {
                    kind: <Self as Labeled>::KIND,
                    id,
                })
            }
        }
    };
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum Faction {
    None = 0,
    VanuSovereignty = 1,
    NewConglomerate = 2,
    TerranRepublic = 3,
    NsOperatives = 4,
}

census_id!(Faction);

impl Labeled for Faction {
    const KIND: &'static str = "Faction";

    fn label(&self) -> &'static str {
        match self {
            Faction::None => "No faction",
            Faction::VanuSovereignty => "Vanu Sovereignty",
            Faction::NewConglomerate => "New Conglomerate",
            Faction::TerranRepublic => "Terran Republic",
            Faction::NsOperatives => "NS Operatives",
        }
    }
}

impl Faction {
    pub const ALL: [Faction; 5] = [
        Faction::None,
        Faction::VanuSovereignty,
        Faction::NewConglomerate,
        Faction::TerranRepublic,
        Faction::NsOperatives,
    ];

    #[must_use]
    pub fn background_color(self) -> &'static str {
        crate::constants::FACTION_BACKGROUND_COLORS[self as usize]
    }
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum FireModeType {
    Projectile = 0,
    IronSight = 1,
    Melee = 2,
    TriggerItemAbility = 3,
    Thrown = 4,
}

census_id!(FireModeType);

impl Labeled for FireModeType {
    const KIND: &'static str = "FireModeType";

    fn label(&self) -> &'static str {
        match self {
            FireModeType::Projectile => "Hip fire",
            FireModeType::IronSight => "ADS",
            FireModeType::Melee => "Melee",
            FireModeType::TriggerItemAbility => "Item ability",
            FireModeType::Thrown => "Throw",
        }
    }
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ItemCategory {
    Knife = 2,
    Pistol = 3,
    Shotgun = 4,
    Smg = 5,
    Lmg = 6,
    AssaultRifle = 7,
    Carbine = 8,
    AvMaxLeft = 9,
    AiMaxLeft = 10,
    SniperRifle = 11,
    ScoutRifle = 12,
    RocketLauncher = 13,
    HeavyWeapon = 14,
    Grenade = 17,
    Explosive = 18,
    BattleRifle = 19,
    AaMaxRight = 20,
    AvMaxRight = 21,
    AiMaxRight = 22,
    AaMaxLeft = 23,
    Crossbow = 24,
    VehicleWeapons = 104,
    FlashPrimaryWeapon = 109,
    GalaxyLeftWeapon = 110,
    GalaxyTailWeapon = 111,
    GalaxyRightWeapon = 112,
    GalaxyTopWeapon = 113,
    HarasserTopGunner = 114,
    LiberatorBellyWeapon = 115,
    LiberatorNoseCannon = 116,
    LiberatorTailWeapon = 117,
    LightningPrimaryWeapon = 118,
    MagriderGunnerWeapon = 119,
    MagriderPrimaryWeapon = 120,
    MosquitoNoseCannon = 121,
    MosquitoWingMount = 122,
    ProwlerGunnerWeapon = 123,
    ProwlerPrimaryWeapon = 124,
    ReaverNoseCannon = 125,
    ReaverWingMount = 126,
    ScytheNoseCannon = 127,
    ScytheWingMount = 128,
    SundererFrontGunner = 129,
    SundererRearGunner = 130,
    VanguardGunnerWeapon = 131,
    VanguardPrimaryWeapon = 132,
    ValkyrieNoseGunner = 138,
    AntTopTurret = 144,
    AerialCombatWeapon = 147,
    HybridRifle = 157,
    BastionPointDefense = 207,
    BastionBombard = 208,
    BastionWeaponSystem = 209,
    ColossusPrimaryWeapon = 210,
    ColossusFrontRightWeapon = 211,
    ColossusFrontLeftWeapon = 212,
    ColossusRearRightWeapon = 213,
    ColossusRearLeftWeapon = 214,
}

census_id!(ItemCategory);

impl Labeled for ItemCategory {
    const KIND: &'static str = "ItemCategory";

    #[allow(clippy::too_many_lines)]
    fn label(&self) -> &'static str {
        match self {
            ItemCategory::RocketLauncher => "Rocket launcher",
            ItemCategory::Explosive => "Explosive",
            ItemCategory::Grenade => "Grenade",
            ItemCategory::Knife => "Knife",
            ItemCategory::Pistol => "Pistol",
            ItemCategory::Shotgun => "Shotgun",
            ItemCategory::Smg => "SMG",
            ItemCategory::Lmg => "LMG",
            ItemCategory::AssaultRifle => "Assault rifle",
            ItemCategory::Carbine => "Carbine",
            ItemCategory::SniperRifle => "Sniper rifle",
            ItemCategory::ScoutRifle => "Scout rifle",
            ItemCategory::HeavyWeapon => "Heavy weapon",
            ItemCategory::BattleRifle => "Battle rifle",
            ItemCategory::Crossbow => "Crossbow",
            ItemCategory::HybridRifle => "Hybrid rifle",
            ItemCategory::AerialCombatWeapon => "Aerial combat weapon",
            ItemCategory::VehicleWeapons => "Vehicle weapon",
            ItemCategory::FlashPrimaryWeapon => "Flash primary",
            ItemCategory::GalaxyLeftWeapon => "Galaxy left",
            ItemCategory::GalaxyTailWeapon => "Galazy tail",
            ItemCategory::GalaxyRightWeapon => "Galaxy right",
            ItemCategory::GalaxyTopWeapon => "Galaxy top",
            ItemCategory::HarasserTopGunner => "Harasser top",
            ItemCategory::LiberatorBellyWeapon => "Liberator belly",
            ItemCategory::LiberatorNoseCannon => "Liberator nose",
            ItemCategory::LiberatorTailWeapon => "Liberator tail",
            ItemCategory::LightningPrimaryWeapon => "Lightning",
            ItemCategory::MagriderGunnerWeapon => "Magrider gunner",
            ItemCategory::MagriderPrimaryWeapon => "Magrider primary",
            ItemCategory::MosquitoNoseCannon => "Mosquito nose",
            ItemCategory::MosquitoWingMount => "Mosquito wing",
            ItemCategory::ProwlerGunnerWeapon => "Prowler gunner",
            ItemCategory::ProwlerPrimaryWeapon => "Prowler primary",
            ItemCategory::ReaverNoseCannon => "Reaver nose",
            ItemCategory::ReaverWingMount => "Reaver wing",
            ItemCategory::ScytheNoseCannon => "Scythe nose",
            ItemCategory::ScytheWingMount => "Scythe wing",
            ItemCategory::SundererFrontGunner => "Sunderer front",
            ItemCategory::SundererRearGunner => "Sunderer rear",
            ItemCategory::VanguardGunnerWeapon => "Vanguard gunner",
            ItemCategory::VanguardPrimaryWeapon => "Vanguard primary",
            ItemCategory::ValkyrieNoseGunner => "Valkyrie nose",
            ItemCategory::AntTopTurret => "Ant top",
            ItemCategory::BastionPointDefense => "Bastion point defense",
            ItemCategory::BastionBombard => "Bastion bombard",
            ItemCategory::BastionWeaponSystem => "Bastion weapon system",
            ItemCategory::ColossusPrimaryWeapon => "Colossus primary",
            ItemCategory::ColossusFrontRightWeapon => "Colossus front right",
            ItemCategory::ColossusFrontLeftWeapon => "Colossus front left",
            ItemCategory::ColossusRearRightWeapon => "Colossus rear right",
            ItemCategory::ColossusRearLeftWeapon => "Colossus rear left",
            ItemCategory::AaMaxRight => "MAX AA right",
            ItemCategory::AaMaxLeft => "MAX AA left",
            ItemCategory::AvMaxRight => "MAX AV right",
            ItemCategory::AvMaxLeft => "MAX AV left",
            ItemCategory::AiMaxRight => "MAX AI right",
            ItemCategory::AiMaxLeft => "MAX AI left",
        }
    }
}

impl ItemCategory {
    /// Thrown, placed and melee weapons have no recoil pattern worth simulating.
    #[must_use]
    pub fn has_magdump_simulation(self) -> bool {
        !matches!(
            self,
            ItemCategory::Explosive
                | ItemCategory::Grenade
                | ItemCategory::Knife
                | ItemCategory::RocketLauncher
        )
    }
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum PlayerState {
    Standing = 0,
    Crouching = 1,
    Running = 2,
    Sprinting = 3,
    FallingLong = 4,
    CrouchWalking = 5,
    FallingShort = 6,
    Jumping = 7,
}

census_id!(PlayerState);

impl Labeled for PlayerState {
    const KIND: &'static str = "PlayerState";

    fn label(&self) -> &'static str {
        match self {
            PlayerState::Standing => "Standing",
            PlayerState::Crouching => "Crouching",
            PlayerState::Running => "Running",
            PlayerState::Sprinting => "Sprinting",
            PlayerState::FallingLong => "Falling long",
            PlayerState::CrouchWalking => "Crouch walking",
            PlayerState::FallingShort => "Falling short",
            PlayerState::Jumping => "Jumping",
        }
    }
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ProjectileFlightType {
    Ballistic = 1,
    TrueBallistic = 2,
    Dynamic = 3,
    ProximityDetonate = 9,
}

census_id!(ProjectileFlightType);

impl Labeled for ProjectileFlightType {
    const KIND: &'static str = "ProjectileFlightType";

    fn label(&self) -> &'static str {
        match self {
            ProjectileFlightType::Ballistic => "Ballistic",
            ProjectileFlightType::TrueBallistic => "True ballistic",
            ProjectileFlightType::Dynamic => "Dynamic",
            ProjectileFlightType::ProximityDetonate => "Proximity detonate",
        }
    }
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ResistType {
    None = 0,
    Melee = 1,
    SmallArm = 2,
    HeavyMachineGun = 4,
    HeavyAntiArmor = 5,
    Explosive = 6,
    TankShell = 7,
    AircraftMachineGun = 8,
    AntiVehicleMine = 9,
    FlakExplosiveBlast = 10,
    AntiAircraftMachineGun = 11,
    AirToGroundWarhead = 12,
    ArmorPiercingChainGun = 14,
    DefaultRocketLauncher = 15,
    AntiMaterielRifle = 16,
    WhaleHunter = 17,
    CoreExplosion = 18,
}

census_id!(ResistType);

impl Labeled for ResistType {
    const KIND: &'static str = "ResistType";

    fn label(&self) -> &'static str {
        match self {
            ResistType::None => "None",
            ResistType::Melee => "Melee",
            ResistType::SmallArm => "Small arm",
            ResistType::HeavyMachineGun => "Heavy machine gun",
            ResistType::HeavyAntiArmor => "Heavy anti armor",
            ResistType::Explosive => "Explosive",
            ResistType::TankShell => "Tank shell",
            ResistType::AircraftMachineGun => "Aircraft machine gun",
            ResistType::AntiVehicleMine => "Anti-vehicle mine",
            ResistType::FlakExplosiveBlast => "Flak explosive blast",
            ResistType::AntiAircraftMachineGun => "Anti aircraft machine gun",
            ResistType::AirToGroundWarhead => "Air to ground warhead",
            ResistType::ArmorPiercingChainGun => "Armor-piercing chain gun",
            ResistType::DefaultRocketLauncher => "Rocket launcher",
            ResistType::AntiMaterielRifle => "Anti-materiel rifle",
            ResistType::WhaleHunter => "Whale hunter",
            ResistType::CoreExplosion => "Core explosion",
        }
    }
}

/// Body part hit by a shot.  Not a Census enum: it is derived from the fire mode multipliers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DamageLocation {
    Head,
    Torso,
    Legs,
}

impl Labeled for DamageLocation {
    const KIND: &'static str = "DamageLocation";

    fn label(&self) -> &'static str {
        match self {
            DamageLocation::Head => "Head",
            DamageLocation::Torso => "Body",
            DamageLocation::Legs => "Legs",
        }
    }
}

impl DamageLocation {
    pub const ALL: [DamageLocation; 3] =
        [DamageLocation::Head, DamageLocation::Torso, DamageLocation::Legs];
}

fn parse_label<T: Labeled + DeserializeOwned>(name: &str) -> Option<&'static str> {
    let de: StrDeserializer<'_, serde::de::value::Error> = name.into_deserializer();
    T::deserialize(de).ok().map(|value| value.label())
}

/// Resolves the label of a serialized enum value.
///
/// With a `kind` the lookup is restricted to that enum.  Without one, the enums are tried in a
/// fixed order and the first match wins (so `NONE` resolves as a [`Faction`]).
#[must_use]
pub fn label_for(kind: Option<&str>, name: &str) -> Option<&'static str> {
    let lookups: [(&str, fn(&str) -> Option<&'static str>); 7] = [
        (Faction::KIND, parse_label::<Faction>),
        (FireModeType::KIND, parse_label::<FireModeType>),
        (ItemCategory::KIND, parse_label::<ItemCategory>),
        (ProjectileFlightType::KIND, parse_label::<ProjectileFlightType>),
        (DamageLocation::KIND, parse_label::<DamageLocation>),
        (PlayerState::KIND, parse_label::<PlayerState>),
        (ResistType::KIND, parse_label::<ResistType>),
    ];

    lookups
        .iter()
        .filter(|(k, _)| kind.map_or(true, |wanted| wanted == *k))
        .find_map(|(_, lookup)| lookup(name))
}
