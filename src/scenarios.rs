// gm-content-tools/src/scenarios.rs

use clap::ValueEnum;
use std::{fmt, str::FromStr};

/// Known perf capture scenarios. The command line spells them in snake_case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum ScenarioId {
    DuskClear,
    StormyMidday,
    SunnyMidday,
}

impl ScenarioId {
    /// Lexical order by name.
    pub const ALL: [ScenarioId; 3] = [Self::DuskClear, Self::StormyMidday, Self::SunnyMidday];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuskClear => "dusk_clear",
            Self::StormyMidday => "stormy_midday",
            Self::SunnyMidday => "sunny_midday",
        }
    }

    pub fn def(&self) -> &'static ScenarioDef {
        match self {
            Self::DuskClear => &DUSK_CLEAR,
            Self::StormyMidday => &STORMY_MIDDAY,
            Self::SunnyMidday => &SUNNY_MIDDAY,
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown scenario '{0}'")]
pub struct UnknownScenario(pub String);

impl FromStr for ScenarioId {
    type Err = UnknownScenario;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|id| id.as_str() == s).ok_or_else(|| UnknownScenario(s.into()))
    }
}

/// Hand-authored capture scenario.
#[derive(Debug, PartialEq, Eq)]
pub struct ScenarioDef {
    /// Value passed to the game's `--perf-capture` flag.
    pub profiling_preset: &'static str,
    pub duration_seconds: u32,
    pub capture_types: &'static [&'static str],
    pub description: &'static str,
    pub notes: &'static [&'static str],
}

static SUNNY_MIDDAY: ScenarioDef = ScenarioDef {
    profiling_preset: "sunny",
    duration_seconds: 120,
    capture_types: &["reflection", "light_probe"],
    description: "Baseline clear-sky midday reference",
    notes: &[
        "Verifies outdoor shading stability with minimal fog/rain.",
        "Expected GPU frame time under 16.7ms on reference hardware.",
    ],
};

static STORMY_MIDDAY: ScenarioDef = ScenarioDef {
    profiling_preset: "stormy",
    duration_seconds: 150,
    capture_types: &["reflection", "light_probe"],
    description: "Heavy rain & wet materials stress scenario",
    notes: &[
        "Collects probes during maximum precipitation/wetness.",
        "Ensure weather particles and fog remain enabled.",
    ],
};

static DUSK_CLEAR: ScenarioDef = ScenarioDef {
    profiling_preset: "dusk",
    duration_seconds: 140,
    capture_types: &["reflection"],
    description: "Golden-hour lighting & long shadows",
    notes: &[
        "Targets sun elevation ~15° for long shadow coverage.",
        "Useful for verifying cascaded shadow transitions.",
    ],
};
