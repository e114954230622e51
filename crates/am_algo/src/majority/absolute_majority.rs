//! Absolute majority of a majority election.
//!
//! threshold = decisive votes / divisor (exact), absolute majority = ⌊threshold⌋ + 1.
//! The display threshold is rounded to one decimal, half away from zero.

use am_core::entities::{MajorityElectionEndResult, MajorityElectionEndResultCalculation};
use am_core::rounding::Ratio;
use am_core::variables::{AbsoluteMajorityCalculation, MajorityElectionMandateAlgorithm};

use super::MajorityError;

const THRESHOLD_DISPLAY_SCALE: u32 = 1;

/// Compute the absolute majority of the primary election and every secondary
/// election of `end_result`, storing it in their `calculation`.
///
/// Secondary elections use the primary election's accounted ballots under
/// `ValidBallotsDividedByTwo` and their own candidate votes and mandates otherwise.
/// Under relative majority the calculation is cleared.
pub fn calculate_absolute_majority(
    end_result: &mut MajorityElectionEndResult,
    formula: AbsoluteMajorityCalculation,
) -> Result<(), MajorityError> {
    if end_result.mandate_algorithm == MajorityElectionMandateAlgorithm::RelativeMajority {
        end_result.calculation = MajorityElectionEndResultCalculation::default();
        for secondary in &mut end_result.secondary_end_results {
            secondary.calculation = MajorityElectionEndResultCalculation::default();
        }
        return Ok(());
    }

    let accounted_ballots = end_result.accounted_ballots;
    end_result.calculation = match formula {
        AbsoluteMajorityCalculation::ValidBallotsDividedByTwo => {
            valid_ballots_divided_by_two(accounted_ballots)?
        }
        AbsoluteMajorityCalculation::CandidateVotesDividedByTheDoubleOfNumberOfMandates => {
            candidate_votes_divided_by_double_mandates(
                end_result.total_candidate_vote_count_incl_individual(),
                end_result.number_of_mandates,
            )?
        }
    };

    for secondary in &mut end_result.secondary_end_results {
        secondary.calculation = match formula {
            AbsoluteMajorityCalculation::ValidBallotsDividedByTwo => {
                valid_ballots_divided_by_two(accounted_ballots)?
            }
            AbsoluteMajorityCalculation::CandidateVotesDividedByTheDoubleOfNumberOfMandates => {
                candidate_votes_divided_by_double_mandates(
                    secondary.total_candidate_vote_count_incl_individual(),
                    secondary.number_of_mandates,
                )?
            }
        };
    }
    Ok(())
}

/// `accounted_ballots / 2`.
pub fn valid_ballots_divided_by_two(
    accounted_ballots: u64,
) -> Result<MajorityElectionEndResultCalculation, MajorityError> {
    from_threshold(accounted_ballots, 2)
}

/// `candidate_votes / (2 × mandates)`; zero mandates is a configuration error.
pub fn candidate_votes_divided_by_double_mandates(
    candidate_votes: u64,
    number_of_mandates: u32,
) -> Result<MajorityElectionEndResultCalculation, MajorityError> {
    if number_of_mandates == 0 {
        return Err(MajorityError::ZeroMandates);
    }
    from_threshold(candidate_votes, 2 * u64::from(number_of_mandates))
}

fn from_threshold(
    decisive_vote_count: u64,
    divisor: u64,
) -> Result<MajorityElectionEndResultCalculation, MajorityError> {
    let threshold = Ratio::of(decisive_vote_count, divisor)?;
    let floor = u64::try_from(threshold.floor()).map_err(|_| MajorityError::Overflow)?;
    Ok(MajorityElectionEndResultCalculation {
        decisive_vote_count,
        absolute_majority: Some(floor + 1),
        absolute_majority_threshold: Some(threshold),
        absolute_majority_threshold_rounded: Some(threshold.to_decimal(THRESHOLD_DISPLAY_SCALE)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(c: &MajorityElectionEndResultCalculation) -> (String, u64) {
        (
            c.absolute_majority_threshold_rounded.map(|d| d.to_string()).unwrap_or_default(),
            c.absolute_majority.unwrap_or(0),
        )
    }

    #[test]
    fn valid_ballots_formula() {
        let c = valid_ballots_divided_by_two(970).unwrap();
        assert_eq!(shown(&c), ("485.0".into(), 486));
        assert_eq!(c.decisive_vote_count, 970);
        let odd = valid_ballots_divided_by_two(971).unwrap();
        assert_eq!(shown(&odd), ("485.5".into(), 486));
    }

    #[test]
    fn candidate_votes_formula() {
        let one = candidate_votes_divided_by_double_mandates(970, 1).unwrap();
        assert_eq!(shown(&one), ("485.0".into(), 486));
        let five = candidate_votes_divided_by_double_mandates(4840, 5).unwrap();
        assert_eq!(shown(&five), ("484.0".into(), 485));
    }

    #[test]
    fn display_threshold_rounds_half_away_from_zero() {
        // 1001 / 6 = 166.8333…
        let c = candidate_votes_divided_by_double_mandates(1001, 3).unwrap();
        assert_eq!(shown(&c), ("166.8".into(), 167));
        // 15 / 20 = 0.75 → 0.8
        let c = candidate_votes_divided_by_double_mandates(15, 10).unwrap();
        assert_eq!(shown(&c), ("0.8".into(), 1));
    }

    #[test]
    fn zero_mandates_is_rejected() {
        assert!(matches!(
            candidate_votes_divided_by_double_mandates(100, 0),
            Err(MajorityError::ZeroMandates)
        ));
    }
}
