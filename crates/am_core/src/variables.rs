//! variables.rs — canton settings and the closed enums that select algorithms.
//!
//! Settings are immutable value objects handed to the engines at call time;
//! nothing in the core reads configuration storage.

use serde::de::{Error as DeError, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::CoreError;

/// Allow only safe token chars and length (1..=64).
fn is_token(s: &str) -> bool {
    if s.is_empty() || s.len() > 64 {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

/// Define a serde'd enum with explicit wire tokens.
macro_rules! serde_enum {
    ($(#[$m:meta])* $name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }
    };
}

/* ------------ Newtypes with invariants (validated on de/ser) ------------ */

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringToken(String);

impl StringToken {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if is_token(&s) {
            Ok(Self(s))
        } else {
            Err(CoreError::InvalidToken)
        }
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for StringToken {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        if is_token(&s) {
            Ok(StringToken(s))
        } else {
            Err(D::Error::invalid_value(
                Unexpected::Str(&s),
                &"token [A-Za-z0-9_.:-], len 1..=64",
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Pct(u8); // 0..=100

impl Pct {
    pub fn new(v: u8) -> Result<Self, CoreError> {
        if v <= 100 {
            Ok(Self(v))
        } else {
            Err(CoreError::DomainOutOfRange("pct"))
        }
    }
    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// `part / whole >= self` in integer math (`100 * part >= pct * whole`).
    pub fn reached_by(self, part: u128, whole: u128) -> bool {
        part.saturating_mul(100) >= u128::from(self.0).saturating_mul(whole)
    }
}

impl<'de> Deserialize<'de> for Pct {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = u8::deserialize(d)?;
        if v <= 100 {
            Ok(Pct(v))
        } else {
            Err(D::Error::invalid_value(Unexpected::Unsigned(v as u64), &"0..=100"))
        }
    }
}

/* ------------ Canonical enums (wire tokens explicit) ------------ */

serde_enum!(
    /// Formula for the absolute majority of a majority election.
    AbsoluteMajorityCalculation => {
        ValidBallotsDividedByTwo = "valid_ballots_divided_by_two",
        CandidateVotesDividedByTheDoubleOfNumberOfMandates = "candidate_votes_divided_by_the_double_of_number_of_mandates"
    }
);

serde_enum!(
    /// Whether elected candidates need the absolute majority or only a rank within the seats.
    MajorityElectionMandateAlgorithm => {
        AbsoluteMajority = "absolute_majority",
        RelativeMajority = "relative_majority"
    }
);

serde_enum!(
    /// Seat distribution method for proportional elections.
    ///
    /// `Doi` is a domain of influence (one election); `NDois` distributes over
    /// a union of elections. The suffix names the quorum a list has to reach.
    ProportionalElectionMandateAlgorithm => {
        HagenbachBischoff = "hagenbach_bischoff",
        DoubleProportional1Doi0DoiQuorum = "double_proportional_1_doi_0_doi_quorum",
        DoubleProportional1Doi5DoiQuorum = "double_proportional_1_doi_5_doi_quorum",
        DoubleProportionalNDois5DoiQuorum = "double_proportional_n_dois_5_doi_quorum",
        DoubleProportionalNDois5DoiOr3TotQuorum = "double_proportional_n_dois_5_doi_or_3_tot_quorum"
    }
);

impl ProportionalElectionMandateAlgorithm {
    #[inline]
    pub fn is_double_proportional(self) -> bool {
        !matches!(self, Self::HagenbachBischoff)
    }

    /// Distribution over a union of elections (as opposed to a single election).
    #[inline]
    pub fn is_union(self) -> bool {
        matches!(
            self,
            Self::DoubleProportionalNDois5DoiQuorum | Self::DoubleProportionalNDois5DoiOr3TotQuorum
        )
    }

    /// Quorum alternatives a column has to pass to take part in the distribution.
    pub fn quorum(self) -> DoubleProportionalQuorum {
        let five = Pct(5);
        let three = Pct(3);
        match self {
            Self::HagenbachBischoff | Self::DoubleProportional1Doi0DoiQuorum => {
                DoubleProportionalQuorum::default()
            }
            Self::DoubleProportional1Doi5DoiQuorum | Self::DoubleProportionalNDois5DoiQuorum => {
                DoubleProportionalQuorum { election_quorum: Some(five), cantonal_quorum: None }
            }
            Self::DoubleProportionalNDois5DoiOr3TotQuorum => DoubleProportionalQuorum {
                election_quorum: Some(five),
                cantonal_quorum: Some(three),
            },
        }
    }
}

/// Quorum alternatives. With neither set every column takes part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleProportionalQuorum {
    /// Share of an election's votes a list must reach in at least one election.
    pub election_quorum: Option<Pct>,
    /// Share of the union's voter number a union list must reach.
    pub cantonal_quorum: Option<Pct>,
}

impl DoubleProportionalQuorum {
    #[inline]
    pub fn is_required(&self) -> bool {
        self.election_quorum.is_some() || self.cantonal_quorum.is_some()
    }
}

/* ------------ Canton settings ------------ */

/// Canton-level configuration passed to every recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CantonSettings {
    pub canton: StringToken,
    pub majority_election_absolute_majority_calculation: AbsoluteMajorityCalculation,
    pub proportional_election_mandate_algorithm: ProportionalElectionMandateAlgorithm,
    /// Secondary-election candidates referencing a primary candidate are only
    /// eligible when that candidate is elected in the primary election.
    #[serde(default)]
    pub secondary_candidates_require_primary_election: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tokens_round_trip_through_serde() {
        let s: CantonSettings = serde_json::from_str(
            r#"{
                "canton": "ZH",
                "majority_election_absolute_majority_calculation": "valid_ballots_divided_by_two",
                "proportional_election_mandate_algorithm": "double_proportional_n_dois_5_doi_quorum"
            }"#,
        )
        .unwrap();
        assert_eq!(s.canton.as_str(), "ZH");
        assert!(!s.secondary_candidates_require_primary_election);
        assert!(s.proportional_election_mandate_algorithm.is_union());
    }

    #[test]
    fn pct_rejects_out_of_range() {
        assert!(Pct::new(101).is_err());
        assert!(serde_json::from_str::<Pct>("101").is_err());
    }

    #[test]
    fn quorum_per_algorithm() {
        use ProportionalElectionMandateAlgorithm::*;
        assert!(!DoubleProportional1Doi0DoiQuorum.quorum().is_required());
        let q = DoubleProportionalNDois5DoiOr3TotQuorum.quorum();
        assert_eq!(q.election_quorum.map(Pct::as_u8), Some(5));
        assert_eq!(q.cantonal_quorum.map(Pct::as_u8), Some(3));
        assert!(!HagenbachBischoff.is_double_proportional());
    }

    #[test]
    fn pct_reached_uses_integer_math() {
        let five = Pct::new(5).unwrap();
        assert!(five.reached_by(50, 1000));
        assert!(!five.reached_by(49, 1000));
        assert!(five.reached_by(0, 0));
    }
}
