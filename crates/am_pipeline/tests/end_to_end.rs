//! Request file → load → recompute → fingerprint.

use std::fs;

use am_core::entities::CandidateEndResultState;
use am_io::hasher::sha256_canonical;
use am_io::loader::{load_request, parse_request, CalculationRequest};
use am_pipeline::{recalculate, recalculate_all, EndResult, Parallel, PipelineError};
use serde_json::{json, Value};

fn settings(algorithm: &str) -> Value {
    json!({
        "canton": "ZH",
        "majority_election_absolute_majority_calculation": "candidate_votes_divided_by_the_double_of_number_of_mandates",
        "proportional_election_mandate_algorithm": algorithm
    })
}

fn media_request() -> Value {
    let lists = [
        ("L1", 13000, "A", Some("A1")),
        ("L2", 7000, "A", Some("A1")),
        ("L3", 5000, "A", Some("A2")),
        ("L4", 3000, "A", Some("A2")),
        ("L5", 12000, "B", None),
        ("L6", 5000, "B", None),
        ("L7", 10000, "C", None),
        ("L8", 3000, "C", None),
        ("L9", 2000, "C", None),
    ];
    let list_end_results: Vec<Value> = lists
        .iter()
        .map(|(id, _, u, s)| json!({"list_id": id, "list_union": u, "sub_list_union": s}))
        .collect();
    let list_results: Vec<Value> =
        lists.iter().map(|(id, v, _, _)| json!({"list_id": id, "vote_count": v})).collect();
    json!({
        "settings": settings("hagenbach_bischoff"),
        "election": {
            "kind": "proportional",
            "end_result": {
                "election_id": "NR-2019",
                "number_of_mandates": 5,
                "total_count_of_counting_circles": 1,
                "list_end_results": list_end_results
            },
            "counting_circle_results": [
                {"counting_circle_id": "CC-1", "done": true, "list_results": list_results}
            ]
        }
    })
}

fn majority_request() -> Value {
    json!({
        "settings": settings("hagenbach_bischoff"),
        "election": {
            "kind": "majority",
            "end_result": {
                "election_id": "SR",
                "number_of_mandates": 5,
                "mandate_algorithm": "absolute_majority",
                "count_of_done_counting_circles": 1,
                "total_count_of_counting_circles": 1,
                "accounted_ballots": 1000,
                "candidate_end_results": [
                    {"candidate_id": "A", "kind": "primary", "vote_count": 1500},
                    {"candidate_id": "B", "kind": "primary", "vote_count": 1200},
                    {"candidate_id": "C", "kind": "primary", "vote_count": 900},
                    {"candidate_id": "D", "kind": "primary", "vote_count": 740},
                    {"candidate_id": "E", "kind": "primary", "vote_count": 400}
                ]
            }
        }
    })
}

fn request(v: &Value) -> CalculationRequest {
    parse_request(&serde_json::to_vec(v).unwrap()).unwrap()
}

fn list_seats(out: &EndResult) -> Vec<u32> {
    match out {
        EndResult::Proportional(p) => p.end_result.list_end_results.iter().map(|l| l.number_of_mandates).collect(),
        other => panic!("unexpected end result {other:?}"),
    }
}

#[test]
fn list_union_fixture_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nr.json");
    fs::write(&path, serde_json::to_vec(&media_request()).unwrap()).unwrap();

    let out = recalculate(load_request(&path).unwrap()).unwrap();
    assert_eq!(list_seats(&out), vec![1, 1, 1, 0, 1, 0, 1, 0, 0]);
    assert!(!out.lot_decision_required());
    let EndResult::Proportional(p) = &out else { unreachable!() };
    let hb = p.hagenbach_bischoff.as_ref().unwrap();
    assert_eq!(hb.tree.root().quotient.to_string(), "10000");
    assert!(p.end_result.mandate_distribution_triggered);
}

#[test]
fn majority_request_uses_candidate_votes_formula() {
    let out = recalculate(request(&majority_request())).unwrap();
    let EndResult::Majority(m) = out else { panic!("expected majority") };
    // 4740 candidate votes over 2 × 5 mandates: threshold 474.0, majority 475
    assert_eq!(m.calculation.decisive_vote_count, 4740);
    assert_eq!(m.calculation.absolute_majority, Some(475));
    assert_eq!(m.calculation.absolute_majority_threshold_rounded.unwrap().to_string(), "474.0");
    let states: Vec<_> = m.candidate_end_results.iter().map(|c| c.state).collect();
    assert_eq!(states[3], CandidateEndResultState::AbsoluteMajorityAndElected);
    assert_eq!(states[4], CandidateEndResultState::NoAbsoluteMajorityAndNotElectedButRankOk);
}

#[test]
fn rerun_fingerprint_is_stable() {
    let a = recalculate(request(&media_request())).unwrap();
    let b = recalculate(request(&media_request())).unwrap();
    assert_eq!(sha256_canonical(&a).unwrap(), sha256_canonical(&b).unwrap());
}

#[test]
fn serial_and_rayon_batches_agree() {
    let requests: Vec<CalculationRequest> =
        (0..6).map(|i| if i % 2 == 0 { request(&media_request()) } else { request(&majority_request()) }).collect();
    let serial = recalculate_all(requests.clone(), Parallel::No);
    let parallel = recalculate_all(requests, Parallel::Rayon);
    assert_eq!(serial.len(), parallel.len());
    for (s, p) in serial.iter().zip(&parallel) {
        assert_eq!(s.as_ref().unwrap(), p.as_ref().unwrap());
    }
}

#[test]
fn zero_mandates_under_candidate_votes_formula_fails() {
    let mut v = majority_request();
    v["election"]["end_result"]["number_of_mandates"] = json!(0);
    let err = recalculate(request(&v)).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
}
