//! Proficiency bonus scaled by a competency multiplier.

use serde::{Deserialize, Serialize};

/// Proficiency levels a skill or tool can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    #[default]
    None,
    Half,
    Proficient,
    Expertise,
}

impl ProficiencyLevel {
    /// Normalize a stored multiplier: nearest 0.5, clamped to `[0, 2]`.
    ///
    /// A stored 1.5 has no level of its own and resolves to `Proficient`.
    pub fn from_multiplier(multiplier: f64) -> Self {
        if !multiplier.is_finite() {
            return ProficiencyLevel::None;
        }
        let snapped = ((multiplier * 2.0).round() / 2.0).clamp(0.0, 2.0);
        if snapped >= 2.0 {
            ProficiencyLevel::Expertise
        } else if snapped >= 1.0 {
            ProficiencyLevel::Proficient
        } else if snapped >= 0.5 {
            ProficiencyLevel::Half
        } else {
            ProficiencyLevel::None
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            ProficiencyLevel::None => 0.0,
            ProficiencyLevel::Half => 0.5,
            ProficiencyLevel::Proficient => 1.0,
            ProficiencyLevel::Expertise => 2.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProficiencyLevel::None => "Not Proficient",
            ProficiencyLevel::Half => "Half Proficient",
            ProficiencyLevel::Proficient => "Proficient",
            ProficiencyLevel::Expertise => "Expertise",
        }
    }
}

/// The symbolic form of a proficiency contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProficiencyTerm {
    Flat(i32),
    Dice(String),
}

impl ProficiencyTerm {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ProficiencyTerm::Flat(_))
    }
}

impl std::fmt::Display for ProficiencyTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProficiencyTerm::Flat(n) => write!(f, "{n}"),
            ProficiencyTerm::Dice(s) => f.write_str(s),
        }
    }
}

/// A proficiency bonus scaled by a multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proficiency {
    pub base: i32,
    pub multiplier: f64,
    pub round_down: bool,
    /// Express the contribution as a proficiency die instead of a flat bonus.
    #[serde(default)]
    pub dice: bool,
}

impl Default for Proficiency {
    fn default() -> Self {
        Self {
            base: 0,
            multiplier: 0.0,
            round_down: true,
            dice: false,
        }
    }
}

impl Proficiency {
    pub fn new(base: i32, multiplier: f64) -> Self {
        Self {
            base,
            multiplier,
            ..Default::default()
        }
    }

    pub fn with_round_down(mut self, round_down: bool) -> Self {
        self.round_down = round_down;
        self
    }

    pub fn with_dice(mut self, dice: bool) -> Self {
        self.dice = dice;
        self
    }

    /// Rounded numeric contribution.
    pub fn flat(&self) -> i32 {
        let raw = self.base as f64 * self.multiplier;
        if self.round_down {
            raw.floor() as i32
        } else {
            raw.ceil() as i32
        }
    }

    pub fn term(&self) -> ProficiencyTerm {
        if !self.dice || self.base == 0 || self.multiplier == 0.0 {
            return ProficiencyTerm::Flat(self.flat());
        }
        let sides = self.base * 2;
        if self.multiplier == 0.5 {
            let rounding = if self.round_down { "floor" } else { "ceil" };
            ProficiencyTerm::Dice(format!("{rounding}(1d{sides}/2)"))
        } else {
            ProficiencyTerm::Dice(format!("{}d{sides}", self.multiplier))
        }
    }

    /// The flat contribution when the term is numeric, otherwise 0.
    pub fn numeric_flat(&self) -> i32 {
        if self.term().is_numeric() {
            self.flat()
        } else {
            0
        }
    }

    pub fn has_proficiency(&self) -> bool {
        self.multiplier > 0.0
    }
}
