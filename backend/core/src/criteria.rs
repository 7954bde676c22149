//! Built-in evaluation criteria sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// A named group of criteria evaluated together against every link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaSet {
    Mobility,
    Sight,
    Hearing,
    Autism,
    Dementia,
    Digital,
}

impl CriteriaSet {
    pub const ALL: [CriteriaSet; 6] = [
        CriteriaSet::Mobility,
        CriteriaSet::Sight,
        CriteriaSet::Hearing,
        CriteriaSet::Autism,
        CriteriaSet::Dementia,
        CriteriaSet::Digital,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CriteriaSet::Mobility => "mobility",
            CriteriaSet::Sight => "sight",
            CriteriaSet::Hearing => "hearing",
            CriteriaSet::Autism => "autism",
            CriteriaSet::Dementia => "dementia",
            CriteriaSet::Digital => "digital",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CriteriaSet::Mobility => "Mobility Impairments",
            CriteriaSet::Sight => "Blind or Partially Sighted",
            CriteriaSet::Hearing => "Deaf or Hearing Loss",
            CriteriaSet::Autism => "Customers with Autism",
            CriteriaSet::Dementia => "Customers with Dementia",
            CriteriaSet::Digital => "Digital Accessibility",
        }
    }

    pub fn criteria(&self) -> &'static [&'static str] {
        match self {
            CriteriaSet::Mobility => MOBILITY,
            CriteriaSet::Sight => SIGHT,
            CriteriaSet::Hearing => HEARING,
            CriteriaSet::Autism => AUTISM,
            CriteriaSet::Dementia => DEMENTIA,
            CriteriaSet::Digital => DIGITAL,
        }
    }

    /// Owned copy of the criteria, ready to hand to a goal builder.
    pub fn to_vec(&self) -> Vec<String> {
        self.criteria().iter().map(|c| c.to_string()).collect()
    }
}

impl fmt::Display for CriteriaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CriteriaSet {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let set = match normalized.as_str() {
            "mobility" | "mobility-impairments" => CriteriaSet::Mobility,
            "sight" | "blind" | "blind-or-partially-sighted" => CriteriaSet::Sight,
            "hearing" | "deaf" | "deaf-or-hearing-loss" => CriteriaSet::Hearing,
            "autism" | "autistic-customers" => CriteriaSet::Autism,
            "dementia" | "customers-with-dementia" => CriteriaSet::Dementia,
            "digital" | "digital-accessibility" => CriteriaSet::Digital,
            _ => {
                return Err(AuditError::InvalidRequest(format!(
                    "unknown criteria set '{s}' (expected one of: mobility, sight, hearing, autism, dementia, digital)"
                )))
            }
        };
        Ok(set)
    }
}

const MOBILITY: &[&str] = &[
    "Specify areas with level access.",
    "Specify areas without level access.",
    "Detail wheelchair-accessible routes.",
    "Identify inclusive dwell spaces.",
    "List the number and location of accessible toilets.",
    "Provide information on the nearest Changing Places facility.",
    "Describe any wheelchair-accessible viewing platforms for events.",
    "Provide information on wheelchairs, scooters, or tramper hire and charging points.",
];

const SIGHT: &[&str] = &[
    "Check the availability of audio tours or guides.",
    "Check the availability of large print documentation.",
    "Check the availability of Braille documentation.",
    "Check the availability of tactile maps and signage.",
    "Describe the visual contrast available around the site.",
    "Check the availability of touch tours or tactile objects.",
    "Identify facilities for aid dogs, including water and relief areas.",
];

const HEARING: &[&str] = &[
    "Check the availability and locations of hearing loops.",
    "Check the provision of captions on videos and TV screens.",
    "Check the availability of flashing, visual fire alarms or pagers.",
    "Check the availability of American Sign Language (ASL) tours.",
];

const AUTISM: &[&str] = &[
    "Check the availability of fast-track queue opportunities.",
    "Check the availability of quiet spaces and/or sensory rooms.",
    "Provide information on quieter times to visit.",
    "Check the availability of sensory stories and maps.",
    "Check the availability of sensory equipment like ear defenders, fidget spinners, and weighted blankets.",
    "Check the availability and booking process for familiarization visits.",
];

const DEMENTIA: &[&str] = &[
    "Check the availability of dementia-friendly sessions.",
    "Check for dementia-friendly facilities such as inclusive signage and accessible toilets.",
    "Check for products like 'easy hold' cutlery.",
    "Verify specific awareness training for staff relating to dementia.",
];

const DIGITAL: &[&str] = &[
    "Verify the availability of transcripts and captions on audio content.",
    "Ensure content is clear, concise, and in plain language.",
    "Ensure content is broken up with sub-headings.",
    "Verify alternative contact methods like email or online text-based chat.",
    "Ensure compatibility with ergonomic or specialized hardware and software.",
    "Check if the website is designed for use with mouse, speech, or keyboard only.",
    "Provide visual indicators of current focus.",
    "Verify customization options for text size, fonts, colors, contrast levels, and spacing.",
    "Ensure alt text for images and transcripts or audio descriptions for videos.",
    "Check for a linear, logical layout.",
    "Ensure keyboard-only navigation.",
    "Verify the use of descriptive links instead of 'click here'.",
    "Ensure content does not auto-play unless the user expects it.",
    "Use simple, muted colors.",
    "Ensure text is left-aligned.",
    "Use bullet points and clear, consistent labels.",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_names() {
        assert_eq!("mobility".parse::<CriteriaSet>().unwrap(), CriteriaSet::Mobility);
        assert_eq!(
            "Blind_Or_Partially_Sighted".parse::<CriteriaSet>().unwrap(),
            CriteriaSet::Sight
        );
        assert_eq!(" DIGITAL ".parse::<CriteriaSet>().unwrap(), CriteriaSet::Digital);
        assert!("colour".parse::<CriteriaSet>().is_err());
    }

    #[test]
    fn every_set_has_criteria() {
        for set in CriteriaSet::ALL {
            assert!(!set.criteria().is_empty(), "{set} has no criteria");
            assert_eq!(set.key().parse::<CriteriaSet>().unwrap(), set);
        }
        assert_eq!(CriteriaSet::Digital.to_vec().len(), 16);
        assert_eq!(CriteriaSet::Hearing.to_vec().len(), 4);
    }
}
