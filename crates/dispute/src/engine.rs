//! The dispute engine.

use ethnum::U256;
use ethrelay_header_tree::{check_header, HeaderTree};
use ethrelay_params::relay::RelayParams;
use ethrelay_pow_oracle::{FullPowWitness, LookupWitness, PowOracle};
use ethrelay_primitives::{
    buf::{Address, Buf32},
    header::Header,
};
use ethrelay_stake_ledger::StakeLedger;
use tracing::{debug, info};

use crate::{
    code::{DisputeReport, DisputeTier, ReturnCode},
    errors::DisputeError,
};

/// Decides disputes and settles their outcome on the tree and the ledger.
#[derive(Debug, Clone)]
pub struct DisputeEngine<O> {
    oracle: O,
    params: RelayParams,
}

impl<O: PowOracle> DisputeEngine<O> {
    /// Creates an engine checking PoW with `oracle`.
    pub const fn new(oracle: O, params: RelayParams) -> Self {
        Self { oracle, params }
    }

    /// Returns the PoW oracle.
    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Returns the PoW oracle for updates, such as committing new epochs.
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Runs a lightweight dispute against `header`, whose parent is `parent`.
    ///
    /// On a violation the header and its descendants are removed and their bonds released.
    pub fn dispute_without_punishment(
        &self,
        tree: &mut HeaderTree,
        ledger: &mut StakeLedger,
        header: &Buf32,
        parent: &Buf32,
        witness: &LookupWitness,
        now: u64,
    ) -> Result<DisputeReport, DisputeError> {
        let (disputed, parent_header) = resolve(tree, header, parent)?;

        let code = match self.structural(disputed, parent_header, now) {
            ReturnCode::NoViolation => {
                if self.oracle.verify_sample(disputed, witness)?.is_valid() {
                    ReturnCode::NoViolation
                } else {
                    ReturnCode::PowViolation
                }
            }
            violation => violation,
        };

        let mut report = DisputeReport::clean(DisputeTier::Lightweight);
        if code.is_violation() {
            report.code = code;
            report.removed = tree.prune(header)?;
            for pruned in &report.removed {
                ledger.release(&pruned.submitter, &pruned.hash);
            }
        }

        info!(%header, code = report.code.code(), outcome = %report.code, removed = report.removed.len(), "lightweight dispute decided");
        Ok(report)
    }

    /// Runs a full dispute by `disputer` against `header`, whose parent is `parent`.
    ///
    /// On a violation the header and its descendants are removed and their bonds are moved to
    /// `disputer`.
    #[expect(clippy::too_many_arguments)]
    pub fn dispute(
        &self,
        tree: &mut HeaderTree,
        ledger: &mut StakeLedger,
        disputer: Address,
        header: &Buf32,
        parent: &Buf32,
        witness: &FullPowWitness,
        now: u64,
    ) -> Result<DisputeReport, DisputeError> {
        let (disputed, parent_header) = resolve(tree, header, parent)?;

        let code = match self.structural(disputed, parent_header, now) {
            ReturnCode::NoViolation => {
                if self.oracle.verify_full(disputed, witness)?.is_valid() {
                    ReturnCode::NoViolation
                } else {
                    ReturnCode::PowViolation
                }
            }
            violation => violation,
        };

        let mut report = DisputeReport::clean(DisputeTier::Full);
        if code.is_violation() {
            report.code = code;
            report.removed = tree.prune(header)?;

            let is_live = |hash: &Buf32| tree.contains(hash);
            let mut slashed = U256::ZERO;
            for pruned in &report.removed {
                slashed += ledger.slash(&pruned.submitter, disputer, &pruned.hash, now, is_live);
            }
            report.slashed = slashed;
        }

        info!(%header, %disputer, code = report.code.code(), outcome = %report.code, removed = report.removed.len(), slashed = %report.slashed, "full dispute decided");
        Ok(report)
    }

    fn structural(&self, header: &Header, parent: &Header, now: u64) -> ReturnCode {
        match check_header(header, parent, now, &self.params) {
            Ok(()) => ReturnCode::NoViolation,
            Err(violation) => {
                debug!(number = header.number, %violation, "structural violation");
                ReturnCode::Structural(violation)
            }
        }
    }
}

/// Looks up a disputed header and its parent, making sure they are stored and linked.
fn resolve<'a>(
    tree: &'a HeaderTree,
    header: &Buf32,
    parent: &Buf32,
) -> Result<(&'a Header, &'a Header), DisputeError> {
    if *header == tree.genesis() {
        return Err(DisputeError::Genesis);
    }

    let disputed = tree
        .header(header)
        .ok_or(DisputeError::HeaderNotFound(*header))?;
    let parent_header = tree
        .header(parent)
        .ok_or(DisputeError::ParentNotFound(*parent))?;
    if disputed.parent_hash != *parent {
        return Err(DisputeError::NotLinked {
            header: *header,
            parent: *parent,
        });
    }

    Ok((disputed, parent_header))
}

#[cfg(test)]
mod tests {
    use ethrelay_header_tree::Violation;
    use ethrelay_pow_oracle::{EthashOracle, PowOracleError};
    use ethrelay_test_utils::{
        chain::{
            low_difficulty_genesis, low_difficulty_params, mainnet_header, valid_chain,
            valid_child,
        },
        pow::{
            break_seal, empty_full_witness, empty_lookup_witness, ethash_oracle, mine,
            synthetic_dataset, MockPowOracle,
        },
    };
    use proptest::prelude::*;

    use super::*;

    const ALICE: Address = Address([0xa1; 20]);
    const BOB: Address = Address([0xb0; 20]);
    const DISPUTER: Address = Address([0xd1; 20]);

    struct Fixture<O> {
        tree: HeaderTree,
        ledger: StakeLedger,
        engine: DisputeEngine<O>,
        params: RelayParams,
        genesis: Header,
        now: u64,
    }

    impl<O: PowOracle> Fixture<O> {
        fn with(genesis: Header, params: RelayParams, oracle: O) -> Self {
            let now = genesis.timestamp + 1_000;
            let tree = HeaderTree::new(genesis.clone(), genesis.difficulty, now);
            let mut ledger = StakeLedger::new(params.stake.stake_per_header);
            for who in [ALICE, BOB] {
                let amount = params.stake.stake_per_header * U256::from(10u64);
                ledger.deposit(who, amount, amount).unwrap();
            }

            Self {
                tree,
                ledger,
                engine: DisputeEngine::new(oracle, params),
                params,
                genesis,
                now,
            }
        }

        fn submit(&mut self, header: &Header, who: Address) -> Buf32 {
            let tree = &self.tree;
            assert!(self.ledger.can_bond(&who, 1, self.now, |h| tree.contains(h)));
            let hash = self
                .tree
                .submit(header.clone(), who, self.now, &self.params)
                .unwrap();
            self.ledger
                .bond(who, hash, self.now + self.params.lock_period);
            hash
        }

        fn locked(&self, who: Address) -> U256 {
            self.ledger
                .locked(&who, self.now, |h| self.tree.contains(h))
        }

        fn lightweight(&mut self, header: &Header) -> Result<DisputeReport, DisputeError> {
            self.engine.dispute_without_punishment(
                &mut self.tree,
                &mut self.ledger,
                &header.hash(),
                &header.parent_hash,
                &empty_lookup_witness(),
                self.now,
            )
        }

        fn full(&mut self, header: &Header) -> Result<DisputeReport, DisputeError> {
            self.engine.dispute(
                &mut self.tree,
                &mut self.ledger,
                DISPUTER,
                &header.hash(),
                &header.parent_hash,
                &empty_full_witness(),
                self.now,
            )
        }
    }

    fn mock_fixture(oracle: MockPowOracle) -> Fixture<MockPowOracle> {
        Fixture::with(mainnet_header(), RelayParams::default(), oracle)
    }

    fn stake(n: u64) -> U256 {
        RelayParams::default().stake.stake_per_header * U256::from(n)
    }

    #[test]
    fn test_valid_header_survives_both_tiers() {
        let mut f = mock_fixture(MockPowOracle::new());
        let h1 = valid_child(&f.genesis, &f.params, 1);
        f.submit(&h1, ALICE);

        let report = f.lightweight(&h1).unwrap();
        assert_eq!(report.code, ReturnCode::NoViolation);
        assert!(report.removed.is_empty());

        let report = f.full(&h1).unwrap();
        assert_eq!(report.code, ReturnCode::NoViolation);
        assert_eq!(report.slashed, U256::ZERO);

        assert!(f.tree.contains(&h1.hash()));
        assert_eq!(f.locked(ALICE), stake(1));
    }

    #[test]
    fn test_structural_violation_releases_bonds() {
        let mut f = mock_fixture(MockPowOracle::new());
        let mut bad = valid_child(&f.genesis, &f.params, 1);
        bad.gas_used = bad.gas_limit + 1;
        let on_top = valid_child(&bad, &f.params, 1);
        f.submit(&bad, ALICE);
        f.submit(&on_top, BOB);

        let report = f.lightweight(&bad).unwrap();
        assert_eq!(report.code, ReturnCode::Structural(Violation::GasUsed));
        assert_eq!(report.code.code(), 11);
        assert_eq!(report.submitters(), vec![ALICE, BOB]);
        assert_eq!(report.slashed, U256::ZERO);

        assert!(!f.tree.contains(&bad.hash()));
        assert!(!f.tree.contains(&on_top.hash()));
        assert_eq!(f.tree.endpoints(), &[f.genesis.hash()]);
        assert_eq!(f.tree.longest_chain_endpoint(), f.genesis.hash());

        // bonds are released, nothing is confiscated
        assert_eq!(f.locked(ALICE), U256::ZERO);
        assert_eq!(f.locked(BOB), U256::ZERO);
        assert_eq!(f.ledger.deposited(&ALICE), stake(10));
        assert_eq!(f.ledger.deposited(&BOB), stake(10));
    }

    #[test]
    fn test_future_timestamp_is_judged_at_dispute_time() {
        let mut f = mock_fixture(MockPowOracle::new());
        let mut ahead = valid_child(&f.genesis, &f.params, 1);
        ahead.timestamp = f.now + f.params.allowed_future_skew;
        ahead.difficulty = f
            .params
            .difficulty
            .expected_difficulty(&f.genesis, ahead.timestamp);
        f.submit(&ahead, ALICE);

        let report = f.lightweight(&ahead).unwrap();
        assert_eq!(report.code.code(), 5);
    }

    #[test]
    fn test_full_dispute_slashes_structural_violations() {
        let mut f = mock_fixture(MockPowOracle::new());
        let mut bad = valid_child(&f.genesis, &f.params, 1);
        bad.number += 7;
        f.submit(&bad, ALICE);

        let report = f.full(&bad).unwrap();
        assert_eq!(report.code, ReturnCode::Structural(Violation::Number));
        assert_eq!(report.slashed, stake(1));
        assert_eq!(f.ledger.deposited(&ALICE), stake(9));
        assert_eq!(f.ledger.deposited(&DISPUTER), stake(1));
    }

    #[test]
    fn test_sampled_pow_violation() {
        let genesis = mainnet_header();
        let params = RelayParams::default();
        let chain = valid_chain(&genesis, &params, 3, 1);
        let mut oracle = MockPowOracle::new();
        oracle.mark_invalid(chain[1].hash());

        let mut f = mock_fixture(oracle);
        for header in &chain {
            f.submit(header, ALICE);
        }

        let report = f.lightweight(&chain[1]).unwrap();
        assert_eq!(report.code, ReturnCode::PowViolation);
        assert_eq!(report.code.code(), 2);
        let removed: Vec<_> = report.removed.iter().map(|p| p.hash).collect();
        assert_eq!(removed, vec![chain[1].hash(), chain[2].hash()]);
        assert_eq!(f.tree.longest_chain_endpoint(), chain[0].hash());
        assert_eq!(f.locked(ALICE), stake(1));
        assert_eq!(f.ledger.deposited(&ALICE), stake(10));
    }

    #[test]
    fn test_only_full_dispute_catches_evaded_sample() {
        let genesis = mainnet_header();
        let params = RelayParams::default();
        let chain = valid_chain(&genesis, &params, 3, 1);
        let mut oracle = MockPowOracle::new();
        oracle.mark_invalid(chain[0].hash());
        oracle.evade_sampling(chain[0].hash());

        let mut f = mock_fixture(oracle);
        f.submit(&chain[0], ALICE);
        f.submit(&chain[1], BOB);
        f.submit(&chain[2], ALICE);

        assert_eq!(f.lightweight(&chain[0]).unwrap().code, ReturnCode::NoViolation);
        assert!(f.tree.contains(&chain[0].hash()));

        let report = f.full(&chain[0]).unwrap();
        assert_eq!(report.code, ReturnCode::PowViolation);
        assert_eq!(report.submitters(), vec![ALICE, BOB, ALICE]);
        assert_eq!(report.slashed, stake(3));
        assert_eq!(f.ledger.deposited(&ALICE), stake(8));
        assert_eq!(f.ledger.deposited(&BOB), stake(9));
        assert_eq!(f.ledger.deposited(&DISPUTER), stake(3));
        assert_eq!(f.tree.endpoints(), &[f.genesis.hash()]);
    }

    #[test]
    fn test_undecidable_disputes_change_nothing() {
        let mut f = mock_fixture(MockPowOracle::new());
        let h1 = valid_child(&f.genesis, &f.params, 1);
        let h2 = valid_child(&h1, &f.params, 1);
        let side = valid_child(&f.genesis, &f.params, 2);
        f.submit(&h1, ALICE);
        f.submit(&h2, ALICE);
        f.submit(&side, BOB);

        let genesis = f.genesis.clone();
        assert_eq!(f.lightweight(&genesis), Err(DisputeError::Genesis));

        let unknown = valid_child(&h2, &f.params, 1);
        assert_eq!(f.full(&unknown), Err(DisputeError::HeaderNotFound(unknown.hash())));

        let res = f.engine.dispute(
            &mut f.tree,
            &mut f.ledger,
            DISPUTER,
            &h2.hash(),
            &side.hash(),
            &empty_full_witness(),
            f.now,
        );
        assert_eq!(
            res,
            Err(DisputeError::NotLinked {
                header: h2.hash(),
                parent: side.hash()
            })
        );

        let res = f.engine.dispute_without_punishment(
            &mut f.tree,
            &mut f.ledger,
            &h2.hash(),
            &Buf32([9; 32]),
            &empty_lookup_witness(),
            f.now,
        );
        assert_eq!(res, Err(DisputeError::ParentNotFound(Buf32([9; 32]))));

        f.engine
            .oracle_mut()
            .fail_with(PowOracleError::UnknownEpoch(3));
        assert_eq!(
            f.full(&h2),
            Err(DisputeError::Witness(PowOracleError::UnknownEpoch(3)))
        );

        assert_eq!(f.tree.number_of_forks(), 2);
        assert!(f.tree.contains(&h2.hash()));
        assert_eq!(f.locked(ALICE), stake(2));
        assert_eq!(f.ledger.deposited(&DISPUTER), U256::ZERO);
    }

    #[test]
    fn test_dispute_of_pruned_header_fails_cleanly() {
        let genesis = mainnet_header();
        let params = RelayParams::default();
        let chain = valid_chain(&genesis, &params, 2, 1);
        let mut oracle = MockPowOracle::new();
        oracle.mark_invalid(chain[0].hash());

        let mut f = mock_fixture(oracle);
        f.submit(&chain[0], ALICE);
        f.submit(&chain[1], ALICE);

        assert!(f.full(&chain[0]).unwrap().code.is_violation());
        assert_eq!(
            f.full(&chain[0]),
            Err(DisputeError::HeaderNotFound(chain[0].hash()))
        );
        assert_eq!(
            f.lightweight(&chain[1]),
            Err(DisputeError::HeaderNotFound(chain[1].hash()))
        );
        assert_eq!(f.ledger.deposited(&DISPUTER), stake(2));
    }

    fn ethash_fixture() -> (Fixture<EthashOracle>, ethrelay_pow_oracle::dataset::EthashDataset) {
        let params = low_difficulty_params();
        let dataset = synthetic_dataset(61);
        let oracle = ethash_oracle(params.pow, 0, &dataset);
        (Fixture::with(low_difficulty_genesis(), params, oracle), dataset)
    }

    #[test]
    fn test_ethash_disputes() {
        let (mut f, dataset) = ethash_fixture();
        let accesses = f.params.pow.dataset_accesses;

        let honest = mine(valid_child(&f.genesis, &f.params, 1), &dataset, accesses);
        let forged = break_seal(
            mine(valid_child(&f.genesis, &f.params, 2), &dataset, accesses),
            &dataset,
            accesses,
        );
        f.submit(&honest, ALICE);
        f.submit(&forged, BOB);

        for header in [&honest, &forged] {
            let lookup = dataset.lookup_witness(header, accesses);
            let report = f
                .engine
                .dispute_without_punishment(
                    &mut f.tree,
                    &mut f.ledger,
                    &header.hash(),
                    &header.parent_hash,
                    &lookup,
                    f.now,
                )
                .unwrap();
            let expected = if header == &honest {
                ReturnCode::NoViolation
            } else {
                ReturnCode::PowViolation
            };
            assert_eq!(report.code, expected);
        }
        assert!(!f.tree.contains(&forged.hash()));
        assert_eq!(f.ledger.deposited(&BOB), stake(10));

        // resubmit the forged header and dispute it conclusively
        f.submit(&forged, BOB);
        let full = dataset.full_witness(&forged, accesses);
        let report = f
            .engine
            .dispute(
                &mut f.tree,
                &mut f.ledger,
                DISPUTER,
                &forged.hash(),
                &forged.parent_hash,
                &full,
                f.now,
            )
            .unwrap();
        assert_eq!(report.code, ReturnCode::PowViolation);
        assert_eq!(f.ledger.deposited(&BOB), stake(9));
        assert_eq!(f.ledger.deposited(&DISPUTER), stake(1));

        // a witness with a forged page is rejected without touching the honest header
        let mut full = dataset.full_witness(&honest, accesses);
        full.pages[0][0] ^= 1;
        let res = f.engine.dispute(
            &mut f.tree,
            &mut f.ledger,
            DISPUTER,
            &honest.hash(),
            &honest.parent_hash,
            &full,
            f.now,
        );
        assert_eq!(res, Err(DisputeError::Witness(PowOracleError::DatasetProof(0))));
        assert!(f.tree.contains(&honest.hash()));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Submit { parent: usize, tag: u8, bob: bool, invalid: bool },
        Dispute { target: usize, full: bool },
    }

    prop_compose! {
        fn arb_op()(dispute in proptest::bool::weighted(0.3), pick in any::<usize>(), tag in any::<u8>(), flag in any::<bool>(), invalid in proptest::bool::weighted(0.3)) -> Op {
            if dispute {
                Op::Dispute { target: pick, full: flag }
            } else {
                Op::Submit { parent: pick, tag, bob: flag, invalid }
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn proptest_disputes_conserve_stake(ops in proptest::collection::vec(arb_op(), 1..30)) {
            let mut f = mock_fixture(MockPowOracle::new());
            let total = f.ledger.deposited(&ALICE) + f.ledger.deposited(&BOB);

            for op in ops {
                let hashes: Vec<Buf32> = f.tree.hashes().copied().collect();
                match op {
                    Op::Submit { parent, tag, bob, invalid } => {
                        let parent = f.tree.header(&hashes[parent % hashes.len()]).unwrap().clone();
                        let child = valid_child(&parent, &f.params, tag);
                        let who = if bob { BOB } else { ALICE };
                        let tree = &f.tree;
                        if tree.contains(&child.hash()) || !f.ledger.can_bond(&who, 1, f.now, |h| tree.contains(h)) {
                            continue;
                        }
                        if invalid {
                            f.engine.oracle_mut().mark_invalid(child.hash());
                        }
                        f.submit(&child, who);
                    }
                    Op::Dispute { target, full } => {
                        let target = f.tree.header(&hashes[target % hashes.len()]).unwrap().clone();
                        let before = (f.ledger.deposited(&ALICE), f.ledger.deposited(&BOB));
                        let res = if full { f.full(&target) } else { f.lightweight(&target) };
                        match res {
                            Ok(report) if !full => {
                                prop_assert_eq!(report.slashed, U256::ZERO);
                                prop_assert_eq!((f.ledger.deposited(&ALICE), f.ledger.deposited(&BOB)), before);
                            }
                            Ok(report) => {
                                let n = report.removed.len() as u64;
                                prop_assert_eq!(report.slashed, stake(n));
                            }
                            Err(err) => prop_assert_eq!(err, DisputeError::Genesis),
                        }
                    }
                }

                let deposited = f.ledger.deposited(&ALICE) + f.ledger.deposited(&BOB);
                prop_assert_eq!(deposited + f.ledger.deposited(&DISPUTER), total);
                for who in [ALICE, BOB] {
                    prop_assert!(f.ledger.deposited(&who) >= f.locked(who));
                }
            }
        }
    }
}
