//! Loader: read a calculation request (canton settings + election data) from
//! a local JSON file, check its cross references and return it typed for the
//! pipeline. No network I/O.

#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use am_algo::{DoubleProportionalLotDecision, HagenbachBischoffLotDecision};
use am_core::entities::{
    CandidateEndResult, CandidateLotDecision, MajorityElectionEndResult, MajorityElectionResult,
    ProportionalElectionEndResult, ProportionalElectionResult, ProportionalElectionUnionEndResult,
};
use am_core::ids::{ElectionId, ListId};
use am_core::variables::CantonSettings;
use serde::{Deserialize, Serialize};

use crate::{looks_like_url_strict, IoError};

/// Requests larger than this are rejected before parsing.
pub const MAX_REQUEST_BYTES: u64 = 64 * 1024 * 1024;

// ----------------------------- Wire-facing types -----------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub settings: CantonSettings,
    pub election: ElectionRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElectionRequest {
    Majority(MajorityRequest),
    Proportional(ProportionalRequest),
    ProportionalUnion(ProportionalUnionRequest),
}

/// Majority election; counting-circle results, when given, replace the end
/// result's tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityRequest {
    pub end_result: MajorityElectionEndResult,
    #[serde(default)]
    pub counting_circle_results: Vec<MajorityElectionResult>,
    /// Lot decisions per election (primary or secondary).
    #[serde(default)]
    pub lot_decisions: BTreeMap<ElectionId, Vec<CandidateLotDecision>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalRequest {
    pub end_result: ProportionalElectionEndResult,
    #[serde(default)]
    pub counting_circle_results: Vec<ProportionalElectionResult>,
    #[serde(default)]
    pub lot_decisions: Vec<HagenbachBischoffLotDecision>,
    /// Super-apportionment decision for the single-election double-proportional variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_proportional_lot_decision: Option<DoubleProportionalLotDecision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalUnionRequest {
    pub union: ProportionalElectionUnionEndResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_decision: Option<DoubleProportionalLotDecision>,
}

// ----------------------------- Loading -----------------------------

/// Load and check a request from a local file path.
pub fn load_request(path: &Path) -> Result<CalculationRequest, IoError> {
    let text = path.to_string_lossy();
    if looks_like_url_strict(&text) {
        return Err(IoError::Path(format!("remote paths are not supported: {text}")));
    }
    let bytes = read_with_limit(path)?;
    parse_request(&bytes)
}

/// Parse and check a request from raw JSON bytes.
pub fn parse_request(bytes: &[u8]) -> Result<CalculationRequest, IoError> {
    let req: CalculationRequest = serde_json::from_slice(bytes)?;
    validate_request(&req)?;
    Ok(req)
}

fn read_with_limit(path: &Path) -> Result<Vec<u8>, IoError> {
    let f = File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let len = f.metadata()?.len();
    if len > MAX_REQUEST_BYTES {
        return Err(IoError::Invalid(format!("request of {len} bytes exceeds {MAX_REQUEST_BYTES}")));
    }
    let mut buf = Vec::with_capacity(len as usize);
    f.take(MAX_REQUEST_BYTES).read_to_end(&mut buf)?;
    Ok(buf)
}

// ----------------------------- Cross-reference checks -----------------------------

/// Checks that need more than one field: unique ids, union membership, and
/// the request kind matching the canton's mandate algorithm.
pub fn validate_request(req: &CalculationRequest) -> Result<(), IoError> {
    let algorithm = req.settings.proportional_election_mandate_algorithm;
    match &req.election {
        ElectionRequest::Majority(m) => validate_majority(&m.end_result),
        ElectionRequest::Proportional(p) => {
            if algorithm.is_union() {
                return Err(IoError::Invalid(format!(
                    "{algorithm:?} distributes over a union; send a proportional_union request"
                )));
            }
            validate_proportional(&p.end_result)
        }
        ElectionRequest::ProportionalUnion(u) => {
            if !algorithm.is_union() {
                return Err(IoError::Invalid(format!("{algorithm:?} does not distribute over a union")));
            }
            validate_union(&u.union)
        }
    }
}

fn unique<'a, T: Ord + std::fmt::Display + 'a>(
    what: &str,
    ids: impl IntoIterator<Item = &'a T>,
) -> Result<(), IoError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(IoError::Invalid(format!("duplicate {what} {id}")));
        }
    }
    Ok(())
}

fn counting_circles(election: &ElectionId, done: u32, total: u32) -> Result<(), IoError> {
    if done > total {
        return Err(IoError::Invalid(format!(
            "election {election}: {done} done counting circles exceed the total of {total}"
        )));
    }
    Ok(())
}

fn candidate_ids(cs: &[CandidateEndResult]) -> impl Iterator<Item = &am_core::ids::CandidateId> {
    cs.iter().map(|c| &c.candidate_id)
}

fn validate_majority(e: &MajorityElectionEndResult) -> Result<(), IoError> {
    counting_circles(&e.election_id, e.count_of_done_counting_circles, e.total_count_of_counting_circles)?;
    unique("candidate", candidate_ids(&e.candidate_end_results))?;
    unique(
        "election",
        std::iter::once(&e.election_id).chain(e.secondary_end_results.iter().map(|s| &s.election_id)),
    )?;
    for s in &e.secondary_end_results {
        unique("candidate", candidate_ids(&s.candidate_end_results))?;
    }
    Ok(())
}

fn validate_proportional(e: &ProportionalElectionEndResult) -> Result<(), IoError> {
    counting_circles(&e.election_id, e.count_of_done_counting_circles, e.total_count_of_counting_circles)?;
    unique("list", e.list_end_results.iter().map(|l| &l.list_id))?;
    if let Some(l) = e.list_end_results.iter().find(|l| l.sub_list_union.is_some() && l.list_union.is_none()) {
        return Err(IoError::Invalid(format!("list {} has a sub-list union but no list union", l.list_id)));
    }
    Ok(())
}

fn validate_union(u: &ProportionalElectionUnionEndResult) -> Result<(), IoError> {
    unique("election", u.elections.iter().map(|e| &e.election_id))?;
    for e in &u.elections {
        validate_proportional(e)?;
    }
    unique(
        "list",
        u.elections.iter().flat_map(|e| e.list_end_results.iter().map(|l| &l.list_id)),
    )?;
    unique("union list", u.union_lists.iter().map(|ul| &ul.union_list_id))?;

    let known: BTreeSet<&ListId> =
        u.elections.iter().flat_map(|e| e.list_end_results.iter().map(|l| &l.list_id)).collect();
    let mut assigned: BTreeSet<&ListId> = BTreeSet::new();
    for ul in &u.union_lists {
        for id in &ul.list_ids {
            if !known.contains(id) {
                return Err(IoError::Invalid(format!("union list {} names unknown list {id}", ul.union_list_id)));
            }
            if !assigned.insert(id) {
                return Err(IoError::Invalid(format!("list {id} belongs to more than one union list")));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(algorithm: &str) -> serde_json::Value {
        json!({
            "canton": "ZH",
            "majority_election_absolute_majority_calculation": "valid_ballots_divided_by_two",
            "proportional_election_mandate_algorithm": algorithm
        })
    }

    fn proportional(lists: serde_json::Value) -> serde_json::Value {
        json!({
            "kind": "proportional",
            "end_result": {
                "election_id": "NR",
                "number_of_mandates": 2,
                "count_of_done_counting_circles": 1,
                "total_count_of_counting_circles": 1,
                "list_end_results": lists
            }
        })
    }

    fn parse(v: serde_json::Value) -> Result<CalculationRequest, IoError> {
        parse_request(&serde_json::to_vec(&v).unwrap())
    }

    #[test]
    fn parses_proportional_request() {
        let req = parse(json!({
            "settings": settings("hagenbach_bischoff"),
            "election": proportional(json!([
                {"list_id": "L1", "vote_count": 10, "list_union": "U"},
                {"list_id": "L2", "vote_count": 5}
            ]))
        }))
        .unwrap();
        let ElectionRequest::Proportional(p) = req.election else {
            panic!("expected a proportional request");
        };
        assert_eq!(p.end_result.list_end_results.len(), 2);
        assert!(p.lot_decisions.is_empty());
    }

    #[test]
    fn rejects_duplicate_lists_and_orphan_sub_unions() {
        let dup = parse(json!({
            "settings": settings("hagenbach_bischoff"),
            "election": proportional(json!([{"list_id": "L1"}, {"list_id": "L1"}]))
        }));
        assert!(matches!(dup, Err(IoError::Invalid(m)) if m.contains("duplicate list")));

        let orphan = parse(json!({
            "settings": settings("hagenbach_bischoff"),
            "election": proportional(json!([{"list_id": "L1", "sub_list_union": "S"}]))
        }));
        assert!(matches!(orphan, Err(IoError::Invalid(_))));
    }

    #[test]
    fn request_kind_must_match_algorithm() {
        let r = parse(json!({
            "settings": settings("double_proportional_n_dois_5_doi_quorum"),
            "election": proportional(json!([{"list_id": "L1"}]))
        }));
        assert!(matches!(r, Err(IoError::Invalid(_))));
    }

    #[test]
    fn malformed_json_reports_location() {
        let err = parse_request(b"{\"settings\": ").unwrap_err();
        assert!(matches!(err, IoError::Json { .. }));
    }

    #[test]
    fn urls_are_rejected() {
        let err = load_request(Path::new("https://example.org/request.json")).unwrap_err();
        assert!(matches!(err, IoError::Path(_)));
    }
}
