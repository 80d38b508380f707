use std::thread;

use ethnum::U256;
use ethrelay_dispute::{DisputeError, ReturnCode};
use ethrelay_header_tree::SubmitError;
use ethrelay_params::relay::RelayParams;
use ethrelay_test_utils::{
    arbitrary_generator::distinct_addresses,
    chain::{mainnet_header, valid_chain},
    pow::{empty_full_witness, MockPowOracle},
};

use super::fixtures::{fixture, fixture_with, stake, ALICE};
use crate::{RelayError, SharedRelay, Submission};

const CALLERS: usize = 8;

#[test]
fn test_racing_submissions_store_once() {
    let f = fixture();
    let block1 = f.child(&f.genesis, 1);
    let now = f.start;
    let relay = SharedRelay::new(f.relay);
    let callers = distinct_addresses(CALLERS);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = callers
            .iter()
            .map(|&who| {
                let relay = relay.clone();
                let header = block1.clone();
                s.spawn(move || {
                    relay.deposit(who, stake(1), stake(1)).unwrap();
                    (who, relay.submit(header, who, now))
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<_> = results
        .iter()
        .filter(|(_, res)| matches!(res, Ok(Submission::Accepted(_))))
        .map(|(who, _)| *who)
        .collect();
    assert_eq!(winners.len(), 1);
    for (_, res) in &results {
        assert!(matches!(
            res,
            Ok(Submission::Accepted(_)) | Err(RelayError::Submit(SubmitError::Duplicate(_)))
        ));
    }

    assert_eq!(relay.longest_chain_endpoint(), block1.hash());
    assert_eq!(relay.get_header_metadata(&block1.hash()).unwrap().submitter, winners[0]);
    for who in &callers {
        let bonded = relay.submitted_headers_for(who).len();
        assert_eq!(bonded, usize::from(*who == winners[0]));
    }
}

#[test]
fn test_handle_serves_every_caller() {
    let f = fixture();
    let chain = f.chain(&f.genesis, 3, 1);
    let genesis = f.genesis.hash();
    let now = f.start;
    let relay = SharedRelay::new(f.relay);
    relay.deposit(ALICE, stake(3), stake(3)).unwrap();

    let reader = relay.clone();
    for header in &chain {
        let res = relay.submit_rlp(&header.to_rlp(), ALICE, now).unwrap();
        assert_eq!(res, Submission::Accepted(vec![header.hash()]));
    }

    let tip = chain[2].hash();
    assert_eq!(reader.get_header(&tip), Some(chain[2].clone()));
    assert!(reader.contains(&chain[0].hash()));
    assert_eq!(reader.longest_chain_endpoint(), tip);
    assert_eq!(reader.get_endpoint(0), Some(tip));
    assert_eq!(reader.number_of_forks(), 1);
    assert_eq!(reader.confirmations_for(&genesis), Some(3));
    assert!(!reader.is_unlocked(&tip, now));
    assert_eq!(reader.get_stake(&ALICE), stake(3));
    assert_eq!(reader.submitted_headers_for(&ALICE).len(), 3);
    assert_eq!(reader.earned_fees(&ALICE), U256::ZERO);
    assert_eq!(reader.withdraw_fees(ALICE), U256::ZERO);

    // both handles see the same relay
    relay.with(|state| assert_eq!(state.genesis(), genesis));
}

#[test]
fn test_racing_disputes_slash_once() {
    let params = RelayParams::default();
    let chain = valid_chain(&mainnet_header(), &params, 3, 1);
    let mut oracle = MockPowOracle::new();
    oracle.mark_invalid(chain[1].hash());

    let mut f = fixture_with(oracle, params);
    f.fund(ALICE, 3);
    for header in &chain {
        f.submit(header, ALICE);
    }
    let now = f.start;
    let relay = SharedRelay::new(f.relay);
    let disputers = distinct_addresses(CALLERS);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = disputers
            .iter()
            .map(|&who| {
                let relay = relay.clone();
                let (header, parent) = (chain[1].hash(), chain[0].hash());
                s.spawn(move || relay.dispute(who, &header, &parent, &empty_full_witness(), now))
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut slashed = U256::ZERO;
    for res in results {
        match res {
            Ok(report) => {
                assert_eq!(report.code, ReturnCode::PowViolation);
                slashed += report.slashed;
            }
            Err(err) => assert!(matches!(
                err,
                RelayError::Dispute(DisputeError::HeaderNotFound(_))
            )),
        }
    }
    assert_eq!(slashed, stake(2));

    let total: U256 = disputers
        .iter()
        .map(|who| relay.get_stake(who))
        .fold(U256::ZERO, |acc, s| acc + s);
    assert_eq!(total, stake(2));
    assert_eq!(relay.withdraw(ALICE, stake(3), now).unwrap(), U256::ZERO);
}
