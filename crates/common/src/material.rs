use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The material held by a single grid cell.
///
/// Discriminants index [`REGISTRY`] directly, so the order here and the
/// order of the registry entries must match.
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[default]
    Empty = 0,
    Sand = 1,
    Water = 2,
    Stone = 3,
    Wood = 4,
    Fire = 5,
    Smoke = 6,
    Oil = 7,
    Acid = 8,
    Lava = 9,
}

/// Immutable physical description of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDescriptor {
    /// Human-readable name.
    pub name: &'static str,
    /// `#RRGGBB` color for renderers.
    pub display_color: &'static str,
    /// Heavier materials sink through lighter ones. Negative means buoyant.
    pub density: f32,
    pub flammable: bool,
    /// Flows diagonally downward when blocked from falling.
    pub spreads: bool,
    /// Has a per-tick chance of vanishing.
    pub evaporates: bool,
    /// Has a per-tick chance of dissolving the cell below.
    pub corrosive: bool,
}

impl MaterialDescriptor {
    const fn inert(name: &'static str, display_color: &'static str, density: f32) -> Self {
        Self {
            name,
            display_color,
            density,
            flammable: false,
            spreads: false,
            evaporates: false,
            corrosive: false,
        }
    }
}

static REGISTRY: [MaterialDescriptor; Material::COUNT] = [
    MaterialDescriptor::inert("Empty", "#000000", 0.0),
    MaterialDescriptor::inert("Sand", "#e6c88c", 4.0),
    MaterialDescriptor {
        spreads: true,
        ..MaterialDescriptor::inert("Water", "#4a80f5", 2.0)
    },
    MaterialDescriptor::inert("Stone", "#808080", 5.0),
    MaterialDescriptor {
        flammable: true,
        ..MaterialDescriptor::inert("Wood", "#8b4513", 3.0)
    },
    MaterialDescriptor {
        evaporates: true,
        ..MaterialDescriptor::inert("Fire", "#ff4500", 0.0)
    },
    MaterialDescriptor {
        evaporates: true,
        ..MaterialDescriptor::inert("Smoke", "#555555", -1.0)
    },
    MaterialDescriptor {
        spreads: true,
        ..MaterialDescriptor::inert("Oil", "#8b4513", 1.5)
    },
    MaterialDescriptor {
        spreads: true,
        corrosive: true,
        ..MaterialDescriptor::inert("Acid", "#32cd32", 3.0)
    },
    MaterialDescriptor {
        spreads: true,
        ..MaterialDescriptor::inert("Lava", "#ff4500", 4.0)
    },
];

impl Material {
    /// Number of material variants.
    pub const COUNT: usize = 10;

    /// Every variant, in discriminant order.
    pub const ALL: [Material; Self::COUNT] = [
        Material::Empty,
        Material::Sand,
        Material::Water,
        Material::Stone,
        Material::Wood,
        Material::Fire,
        Material::Smoke,
        Material::Oil,
        Material::Acid,
        Material::Lava,
    ];

    /// Registry lookup. Total over the enum.
    #[inline]
    pub fn descriptor(self) -> &'static MaterialDescriptor {
        &REGISTRY[self as usize]
    }

    #[inline]
    pub fn density(self) -> f32 {
        self.descriptor().density
    }

    /// `#RRGGBB` color for this material.
    pub fn display_color(self) -> &'static str {
        self.descriptor().display_color
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Material::Empty
    }

    /// Lowercase identifier, as accepted by [`FromStr`] and serde.
    pub fn id(self) -> &'static str {
        match self {
            Material::Empty => "empty",
            Material::Sand => "sand",
            Material::Water => "water",
            Material::Stone => "stone",
            Material::Wood => "wood",
            Material::Fire => "fire",
            Material::Smoke => "smoke",
            Material::Oil => "oil",
            Material::Acid => "acid",
            Material::Lava => "lava",
        }
    }

    /// Single-character glyph for debug dumps.
    pub fn glyph(self) -> char {
        match self {
            Material::Empty => '.',
            Material::Sand => 's',
            Material::Water => '~',
            Material::Stone => '#',
            Material::Wood => 'w',
            Material::Fire => '*',
            Material::Smoke => '"',
            Material::Oil => 'o',
            Material::Acid => 'a',
            Material::Lava => 'L',
        }
    }

    /// Inverse of [`Material::glyph`].
    pub fn from_glyph(glyph: char) -> Option<Material> {
        Self::ALL.into_iter().find(|m| m.glyph() == glyph)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Returned when parsing an identifier that names no material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown material: {0:?}")]
pub struct ParseMaterialError(pub String);

impl FromStr for Material {
    type Err = ParseMaterialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseMaterialError(s.to_string()))
    }
}
