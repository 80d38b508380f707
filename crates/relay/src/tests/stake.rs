use ethnum::U256;
use ethrelay_stake_ledger::StakeError;

use super::fixtures::{fixture, stake, ALICE, BOB};
use crate::{RelayError, Submission};

#[test]
fn test_deposit_must_match_transfer() {
    let mut f = fixture();
    let res = f.relay.deposit(ALICE, stake(1), stake(2));
    assert!(matches!(
        res,
        Err(RelayError::Stake(StakeError::TransferMismatch { .. }))
    ));
    assert_eq!(f.relay.get_stake(&ALICE), U256::ZERO);

    assert_eq!(f.relay.deposit(ALICE, stake(1), stake(1)).unwrap(), stake(1));
    assert_eq!(f.relay.deposit(ALICE, stake(2), stake(2)).unwrap(), stake(3));
    assert_eq!(f.relay.get_stake(&ALICE), stake(3));
}

#[test]
fn test_withdraw_more_than_deposited() {
    let mut f = fixture();
    f.fund(ALICE, 1);
    let res = f.relay.withdraw(ALICE, stake(1) + U256::ONE, f.start);
    assert!(matches!(
        res,
        Err(RelayError::Stake(StakeError::AmountExceedsDeposit { .. }))
    ));
    assert_eq!(f.relay.get_stake(&ALICE), stake(1));
}

#[test]
fn test_withdraw_without_locked_stake() {
    let mut f = fixture();
    f.fund(ALICE, 2);
    assert_eq!(f.relay.withdraw(ALICE, stake(2), f.start).unwrap(), stake(2));
    assert_eq!(f.relay.get_stake(&ALICE), U256::ZERO);
}

#[test]
fn test_locked_stake_waits_for_lock_period() {
    let mut f = fixture();
    f.fund(ALICE, 1);
    let block1 = f.child(&f.genesis, 1);
    f.submit(&block1, ALICE);

    assert_eq!(f.relay.withdraw(ALICE, stake(1), f.start).unwrap(), U256::ZERO);
    assert_eq!(f.relay.get_stake(&ALICE), stake(1));
    assert_eq!(f.relay.submitted_headers_for(&ALICE), vec![block1.hash()]);

    // still locked at the last locked instant
    let last_locked = f.start + f.params.lock_period;
    assert!(!f.relay.is_unlocked(&block1.hash(), last_locked));
    assert!(f.relay.is_unlocked(&block1.hash(), last_locked + 1));

    let later = f.unlocked_after(f.start);
    assert_eq!(f.relay.withdraw(ALICE, stake(1), later).unwrap(), stake(1));
    assert_eq!(f.relay.get_stake(&ALICE), U256::ZERO);
    assert!(f.relay.submitted_headers_for(&ALICE).is_empty());
}

#[test]
fn test_over_request_withdraws_unlocked_part() {
    let mut f = fixture();
    f.fund(ALICE, 2);
    let chain = f.chain(&f.genesis, 2, 1);

    f.submit_at(&chain[0], ALICE, f.start);
    let second = f.unlocked_after(f.start);
    f.submit_at(&chain[1], ALICE, second);

    // the first bond expired, the second still locks one stake
    assert_eq!(f.relay.withdraw(ALICE, stake(2), second).unwrap(), stake(1));
    assert_eq!(f.relay.get_stake(&ALICE), stake(1));
    assert_eq!(f.relay.submitted_headers_for(&ALICE), vec![chain[1].hash()]);

    let later = f.unlocked_after(second);
    assert_eq!(f.relay.withdraw(ALICE, stake(1), later).unwrap(), stake(1));
    assert_eq!(f.relay.get_stake(&ALICE), U256::ZERO);
}

#[test]
fn test_submission_without_stake_is_ignored() {
    let mut f = fixture();
    let block1 = f.child(&f.genesis, 1);

    let res = f.relay.submit(block1.clone(), ALICE, f.start).unwrap();
    assert_eq!(res, Submission::Ignored);
    assert!(f.relay.get_header(&block1.hash()).is_none());
    assert!(f.relay.submitted_headers_for(&ALICE).is_empty());

    f.fund(ALICE, 1);
    f.submit(&block1, ALICE);
    assert_eq!(f.relay.submitted_headers_for(&ALICE), vec![block1.hash()]);
    assert_eq!(
        f.relay.get_header_metadata(&block1.hash()).unwrap().submitter,
        ALICE
    );
}

#[test]
fn test_batch_needs_stake_for_every_header() {
    let mut f = fixture();
    f.fund(BOB, 2);
    let chain = f.chain(&f.genesis, 3, 1);

    let res = f.relay.submit_batch(chain.clone(), BOB, f.start).unwrap();
    assert_eq!(res, Submission::Ignored);
    assert!(chain.iter().all(|h| !f.relay.contains(&h.hash())));

    let res = f.relay.submit_batch(chain[..2].to_vec(), BOB, f.start).unwrap();
    assert_eq!(
        res,
        Submission::Accepted(vec![chain[0].hash(), chain[1].hash()])
    );
    assert_eq!(f.relay.submit(chain[2].clone(), BOB, f.start).unwrap(), Submission::Ignored);
}
