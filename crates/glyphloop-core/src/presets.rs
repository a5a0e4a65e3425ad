//! Named parameter sets.
//!
//! A preset is a complete [`SessionParams`]; selecting one replaces the
//! configured session block rather than merging with it.

use core::fmt;
use core::str::FromStr;

use glyphloop_types::{GrammarMode, SessionParams};

use crate::config::ConfigError;

/// The built-in presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Heptapod grammar on a 720-quantum world seeded `0x1F1F1`.
    FirstContact,
    /// Slow, ink-preserving, linear grammar with a long memory.
    QuietArchive,
    /// Stiff rings and recursive grammar.
    RecursiveBloom,
    /// Loose coupling, fast ink, experimental grammar.
    StaticStorm,
}

impl Preset {
    /// Every preset, in display order.
    pub const ALL: [Self; 4] = [
        Self::FirstContact,
        Self::QuietArchive,
        Self::RecursiveBloom,
        Self::StaticStorm,
    ];

    /// Kebab-case name used in configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstContact => "first-contact",
            Self::QuietArchive => "quiet-archive",
            Self::RecursiveBloom => "recursive-bloom",
            Self::StaticStorm => "static-storm",
        }
    }

    /// The full parameter set for this preset.
    pub fn params(self) -> SessionParams {
        let base = SessionParams::default();
        match self {
            Self::FirstContact => SessionParams {
                seed: 0x1F1F1,
                agent_count: 720,
                mode: GrammarMode::Heptapod,
                ..base
            },
            Self::QuietArchive => SessionParams {
                seed: 0xA4C1,
                agent_count: 480,
                time_scope: 0.6,
                dance: 0.3,
                entrainment: 0.7,
                ink_decay: 0.1,
                speak_intensity: 0.4,
                mode: GrammarMode::Linear,
                ..base
            },
            Self::RecursiveBloom => SessionParams {
                seed: 0xB100,
                agent_count: 640,
                time_scope: 0.3,
                dance: 0.7,
                entrainment: 0.65,
                loop_threshold: 0.8,
                mode: GrammarMode::Recursive,
                ..base
            },
            Self::StaticStorm => SessionParams {
                seed: 0x57A7,
                agent_count: 800,
                dance: 0.95,
                entrainment: 0.2,
                ink_decay: 0.7,
                speak_intensity: 0.9,
                mode: GrammarMode::Experimental,
                ..base
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().ok(), Some(preset));
            assert_eq!(preset.to_string(), preset.name());
        }
        assert_eq!("First-Contact".parse::<Preset>().ok(), Some(Preset::FirstContact));
    }

    #[test]
    fn first_contact_matches_its_description() {
        let p = Preset::FirstContact.params();
        assert_eq!(p.seed, 0x1F1F1);
        assert_eq!(p.agent_count, 720);
        assert_eq!(p.mode, GrammarMode::Heptapod);
    }

    #[test]
    fn every_preset_uses_its_own_grammar() {
        let modes: Vec<GrammarMode> = Preset::ALL.iter().map(|p| p.params().mode).collect();
        assert_eq!(
            modes,
            vec![
                GrammarMode::Heptapod,
                GrammarMode::Linear,
                GrammarMode::Recursive,
                GrammarMode::Experimental,
            ]
        );
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(matches!(
            "loud-archive".parse::<Preset>(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }
}
