//! CB and PMR band plans
//!
//! Channel tables and per-band modulation rules. Channel frequencies are
//! rounded to kHz resolution to match the server's 3-decimal storage, so
//! lookups use a small tolerance to absorb float noise.

use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;
use crate::models::Mode;

/// Frequencies match a channel when within this many MHz.
const CHANNEL_TOLERANCE: f64 = 0.0001;

const CB_BASE: f64 = 26.965;
const CB_SPACING: f64 = 0.010;
const CB_CHANNEL_COUNT: u8 = 40;

const PMR_BASE: f64 = 446.00625;
const PMR_SPACING: f64 = 0.0125;
const PMR_CHANNEL_COUNT: u8 = 16;

/// Supported radio bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// 26/27 MHz citizens band, 40 channels at 10 kHz spacing
    Cb,
    /// PMR446, 16 channels at 12.5 kHz spacing
    Pmr,
}

/// One channel of a band plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub number: u8,
    /// Channel centre in MHz, kHz resolution
    pub frequency: f64,
}

impl Band {
    /// Short label used on the wire and in displays
    pub fn label(&self) -> &'static str {
        match self {
            Band::Cb => "CB",
            Band::Pmr => "PMR",
        }
    }

    /// Modulations legal on this band
    pub fn modes(&self) -> &'static [Mode] {
        match self {
            Band::Cb => &[Mode::Am, Mode::Ssb, Mode::Fm],
            Band::Pmr => &[Mode::Fm],
        }
    }

    /// Whether a mode is legal on this band
    pub fn supports(&self, mode: Mode) -> bool {
        self.modes().contains(&mode)
    }

    /// First legal mode, used as the form default
    pub fn default_mode(&self) -> Mode {
        self.modes()[0]
    }

    pub fn channel_count(&self) -> u8 {
        match self {
            Band::Cb => CB_CHANNEL_COUNT,
            Band::Pmr => PMR_CHANNEL_COUNT,
        }
    }

    /// Centre frequency of a channel, `None` when out of range
    pub fn channel_frequency(&self, number: u8) -> Option<f64> {
        if number == 0 || number > self.channel_count() {
            return None;
        }
        let (base, spacing) = match self {
            Band::Cb => (CB_BASE, CB_SPACING),
            Band::Pmr => (PMR_BASE, PMR_SPACING),
        };
        Some(round_to_khz(base + f64::from(number - 1) * spacing))
    }

    /// Channel whose centre matches the frequency, if any
    pub fn channel_for_frequency(&self, frequency: f64) -> Option<Channel> {
        (1..=self.channel_count())
            .filter_map(|number| {
                self.channel_frequency(number).map(|f| Channel {
                    number,
                    frequency: f,
                })
            })
            .find(|channel| (channel.frequency - frequency).abs() < CHANNEL_TOLERANCE)
    }

    /// Full channel table for this band
    pub fn channels(&self) -> Vec<Channel> {
        (1..=self.channel_count())
            .filter_map(|number| {
                self.channel_frequency(number).map(|f| Channel {
                    number,
                    frequency: f,
                })
            })
            .collect()
    }

    /// Band a frequency belongs to, if any
    ///
    /// Ranges cover the rounded channel tables, so every table entry
    /// detects as its own band.
    pub fn from_frequency(frequency: f64) -> Option<Band> {
        if (26.965..=27.405).contains(&frequency) {
            Some(Band::Cb)
        } else if (446.006..=446.194).contains(&frequency) {
            Some(Band::Pmr)
        } else {
            None
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Band {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CB" => Ok(Band::Cb),
            "PMR" | "PMR446" => Ok(Band::Pmr),
            other => Err(ClientError::Validation(format!(
                "Unknown band '{}' (expected CB or PMR)",
                other
            ))),
        }
    }
}

/// Round an MHz value to kHz resolution (3 decimals)
pub(crate) fn round_to_khz(frequency: f64) -> f64 {
    (frequency * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cb_channel_table() {
        assert_eq!(Band::Cb.channel_frequency(1), Some(26.965));
        assert_eq!(Band::Cb.channel_frequency(13), Some(27.085));
        assert_eq!(Band::Cb.channel_frequency(40), Some(27.355));
        assert_eq!(Band::Cb.channel_frequency(0), None);
        assert_eq!(Band::Cb.channel_frequency(41), None);
        assert_eq!(Band::Cb.channels().len(), 40);
    }

    #[test]
    fn test_pmr_channel_table_is_khz_rounded() {
        assert_eq!(Band::Pmr.channel_frequency(1), Some(446.006));
        assert_eq!(Band::Pmr.channel_frequency(2), Some(446.019));
        assert_eq!(Band::Pmr.channel_frequency(16), Some(446.194));
        assert_eq!(Band::Pmr.channels().len(), 16);
    }

    #[test]
    fn test_channel_lookup_tolerates_float_noise() {
        let channel = Band::Cb.channel_for_frequency(27.08500000001).unwrap();
        assert_eq!(channel.number, 13);

        assert!(Band::Cb.channel_for_frequency(27.080).is_none());
    }

    #[test]
    fn test_band_detection() {
        assert_eq!(Band::from_frequency(26.965), Some(Band::Cb));
        assert_eq!(Band::from_frequency(27.355), Some(Band::Cb));
        assert_eq!(Band::from_frequency(446.006), Some(Band::Pmr));
        assert_eq!(Band::from_frequency(446.194), Some(Band::Pmr));
        assert_eq!(Band::from_frequency(145.500), None);

        // Every table entry detects as its own band.
        for band in [Band::Cb, Band::Pmr] {
            for channel in band.channels() {
                assert_eq!(Band::from_frequency(channel.frequency), Some(band));
            }
        }
    }

    #[test]
    fn test_band_modes() {
        assert!(Band::Cb.supports(Mode::Am));
        assert!(Band::Cb.supports(Mode::Ssb));
        assert!(Band::Pmr.supports(Mode::Fm));
        assert!(!Band::Pmr.supports(Mode::Ssb));

        assert_eq!(Band::Cb.default_mode(), Mode::Am);
        assert_eq!(Band::Pmr.default_mode(), Mode::Fm);
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(Band::Cb.to_string(), "CB");
        assert_eq!("pmr".parse::<Band>().unwrap(), Band::Pmr);
        assert!("HF".parse::<Band>().is_err());
    }
}
