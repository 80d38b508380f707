//! The header tree and its fork bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

use ethnum::U256;
use ethrelay_params::relay::{RelayParams, SubmissionChecks};
use ethrelay_primitives::{
    buf::{Address, Buf32},
    header::Header,
};
use tracing::{debug, info, trace};

use crate::{
    errors::{PruneError, QueryError, SubmitError},
    metadata::{HeaderMetadata, PrunedHeader},
    validation::check_header,
};

#[derive(Debug, Clone)]
struct StoredHeader {
    header: Header,
    meta: HeaderMetadata,

    /// Insertion order, breaks total difficulty ties in favour of the header seen first.
    seq: u64,
}

/// All headers the relay knows about, rooted at a trusted genesis.
///
/// Invariants kept by every operation:
/// - every stored header but genesis has its parent stored, and appears in the parent's
///   successors;
/// - the endpoint list holds exactly the stored headers without successors, and each endpoint's
///   `iterable_index` is its position in the list;
/// - the longest chain endpoint is an endpoint with maximal total difficulty.
#[derive(Debug, Clone)]
pub struct HeaderTree {
    headers: BTreeMap<Buf32, StoredHeader>,
    endpoints: Vec<Buf32>,
    longest: Buf32,
    genesis: Buf32,
    next_fork_id: u64,
    next_seq: u64,
}

impl HeaderTree {
    /// Creates a tree holding only `genesis`, whose total difficulty is taken as given.
    ///
    /// Genesis has no submitter and is unlocked from `now` on.
    pub fn new(genesis: Header, total_difficulty: U256, now: u64) -> Self {
        let hash = genesis.hash();
        info!(%hash, number = genesis.number, %total_difficulty, "installed genesis header");

        let meta = HeaderMetadata {
            submitter: Address::zero(),
            locked_until: now,
            fork_id: 0,
            iterable_index: 0,
            latest_fork: Buf32::zero(),
            successors: Vec::new(),
            total_difficulty,
        };

        let mut headers = BTreeMap::new();
        headers.insert(
            hash,
            StoredHeader {
                header: genesis,
                meta,
                seq: 0,
            },
        );

        Self {
            headers,
            endpoints: vec![hash],
            longest: hash,
            genesis: hash,
            next_fork_id: 1,
            next_seq: 1,
        }
    }

    /// Returns the genesis hash.
    pub const fn genesis(&self) -> Buf32 {
        self.genesis
    }

    /// Returns `true` if a header with `hash` is stored.
    pub fn contains(&self, hash: &Buf32) -> bool {
        self.headers.contains_key(hash)
    }

    /// Returns the stored header with `hash`.
    pub fn header(&self, hash: &Buf32) -> Option<&Header> {
        self.headers.get(hash).map(|stored| &stored.header)
    }

    /// Returns the bookkeeping of the stored header with `hash`.
    pub fn metadata(&self, hash: &Buf32) -> Option<&HeaderMetadata> {
        self.headers.get(hash).map(|stored| &stored.meta)
    }

    /// Returns the hashes of all stored headers.
    pub fn hashes(&self) -> impl Iterator<Item = &Buf32> {
        self.headers.keys()
    }

    /// Returns the headers without successors.
    pub fn endpoints(&self) -> &[Buf32] {
        &self.endpoints
    }

    /// Returns the endpoint at `index`.
    pub fn endpoint(&self, index: usize) -> Option<Buf32> {
        self.endpoints.get(index).copied()
    }

    /// Returns the tip of the heaviest branch.
    pub const fn longest_chain_endpoint(&self) -> Buf32 {
        self.longest
    }

    /// Returns the number of branches, i.e. of endpoints.
    pub fn number_of_forks(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if the header with `hash` is stored and its lock has passed at `now`.
    pub fn is_unlocked(&self, hash: &Buf32, now: u64) -> bool {
        self.metadata(hash)
            .is_some_and(|meta| now > meta.locked_until)
    }

    /// Submits a single header. See [`Self::submit_batch`].
    pub fn submit(
        &mut self,
        header: Header,
        submitter: Address,
        now: u64,
        params: &RelayParams,
    ) -> Result<Buf32, SubmitError> {
        self.submit_batch(vec![header], submitter, now, params)
            .map(|hashes| hashes[0])
    }

    /// Validates and stores `headers`, which must form a chain whose first header's parent is
    /// stored. Either all headers are stored or none is.
    ///
    /// Returns the hashes of the stored headers.
    pub fn submit_batch(
        &mut self,
        headers: Vec<Header>,
        submitter: Address,
        now: u64,
        params: &RelayParams,
    ) -> Result<Vec<Buf32>, SubmitError> {
        let hashes = self.validate_batch(&headers, now, params)?;

        let locked_until = now.saturating_add(params.lock_period);
        for (header, hash) in headers.into_iter().zip(&hashes) {
            self.insert(header, *hash, submitter, locked_until)?;
        }
        self.update_longest();

        Ok(hashes)
    }

    fn validate_batch(
        &self,
        headers: &[Header],
        now: u64,
        params: &RelayParams,
    ) -> Result<Vec<Buf32>, SubmitError> {
        let Some(first) = headers.first() else {
            return Err(SubmitError::EmptyBatch);
        };

        let mut parent_hash = first.parent_hash;
        let mut parent = self
            .header(&parent_hash)
            .ok_or(SubmitError::ParentNotFound(parent_hash))?;

        let mut hashes = Vec::with_capacity(headers.len());
        for (index, header) in headers.iter().enumerate() {
            if header.parent_hash != parent_hash {
                return Err(SubmitError::NotChained { index });
            }

            let hash = header.hash();
            if self.contains(&hash) {
                return Err(SubmitError::Duplicate(hash));
            }

            if params.submission_checks == SubmissionChecks::Strict {
                check_header(header, parent, now, params)
                    .map_err(|violation| SubmitError::Invalid { hash, violation })?;
            }

            hashes.push(hash);
            parent = header;
            parent_hash = hash;
        }

        Ok(hashes)
    }

    fn insert(
        &mut self,
        header: Header,
        hash: Buf32,
        submitter: Address,
        locked_until: u64,
    ) -> Result<(), SubmitError> {
        let parent_hash = header.parent_hash;
        let parent = self
            .headers
            .get_mut(&parent_hash)
            .ok_or(SubmitError::ParentNotFound(parent_hash))?;

        let sibling = parent.meta.successors.first().copied();
        parent.meta.successors.push(hash);
        let total_difficulty = parent
            .meta
            .total_difficulty
            .saturating_add(header.difficulty);

        let (fork_id, iterable_index, latest_fork) = if sibling.is_none() {
            (
                parent.meta.fork_id,
                parent.meta.iterable_index,
                parent.meta.latest_fork,
            )
        } else {
            (self.next_fork_id, self.endpoints.len(), parent_hash)
        };

        match sibling {
            None => self.endpoints[iterable_index] = hash,
            Some(sibling) => {
                self.next_fork_id += 1;
                self.endpoints.push(hash);
                // the parent is now the nearest fork point of the existing branch too
                let path = self.first_successor_path(sibling);
                self.set_latest_fork(&path, parent_hash);
                info!(%hash, parent = %parent_hash, fork_id, "created fork");
            }
        }

        info!(%hash, number = header.number, %submitter, fork_id, "accepted header");

        let meta = HeaderMetadata {
            submitter,
            locked_until,
            fork_id,
            iterable_index,
            latest_fork,
            successors: Vec::new(),
            total_difficulty,
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.headers
            .insert(hash, StoredHeader { header, meta, seq });

        Ok(())
    }

    /// Follows first successors from `start` down to an endpoint.
    fn first_successor_path(&self, start: Buf32) -> Vec<Buf32> {
        let mut path = Vec::new();
        let mut cursor = Some(start);
        while let Some(hash) = cursor {
            let Some(stored) = self.headers.get(&hash) else {
                break;
            };
            path.push(hash);
            cursor = stored.meta.successors.first().copied();
        }
        path
    }

    /// Sets `latest_fork` along `path` up to and including the first fork point on it.
    fn set_latest_fork(&mut self, path: &[Buf32], latest_fork: Buf32) {
        for hash in path {
            let Some(stored) = self.headers.get_mut(hash) else {
                break;
            };
            stored.meta.latest_fork = latest_fork;
            if stored.meta.successors.len() > 1 {
                break;
            }
        }
    }

    fn update_longest(&mut self) {
        let best = self
            .endpoints
            .iter()
            .filter_map(|hash| self.headers.get(hash).map(|stored| (*hash, stored)))
            .max_by(|(_, a), (_, b)| {
                a.meta
                    .total_difficulty
                    .cmp(&b.meta.total_difficulty)
                    .then(b.seq.cmp(&a.seq))
            })
            .map(|(hash, _)| hash);

        if let Some(best) = best {
            if best != self.longest {
                debug!(old = %self.longest, new = %best, "longest chain endpoint changed");
            }
            self.longest = best;
        }
    }

    /// Counts the headers on the heaviest branch after the header with `hash`.
    ///
    /// Returns `None` if the header is not stored or not on the heaviest branch.
    pub fn confirmations_for(&self, hash: &Buf32) -> Option<u64> {
        let target = self.headers.get(hash)?.meta.total_difficulty;

        let mut cursor = self.longest;
        let mut hops = 0;
        loop {
            if cursor == *hash {
                return Some(hops);
            }

            let stored = self.headers.get(&cursor)?;
            trace!(%cursor, hops, "walking towards genesis");
            // everything further back is lighter than the target
            if stored.meta.total_difficulty < target || cursor == self.genesis {
                return None;
            }

            cursor = stored.header.parent_hash;
            hops += 1;
        }
    }

    /// Checks that the header with `hash` is on the heaviest branch and that the header
    /// `confirmations` positions further along that branch exists and is unlocked at `now`.
    pub fn require_confirmed(
        &self,
        hash: &Buf32,
        confirmations: u64,
        now: u64,
    ) -> Result<(), QueryError> {
        if !self.contains(hash) {
            return Err(QueryError::NotFound(*hash));
        }

        let depth = self
            .confirmations_for(hash)
            .ok_or(QueryError::NotOnLongestChain(*hash))?;

        let not_confirmed = QueryError::NotConfirmed {
            hash: *hash,
            requested: confirmations,
        };
        if depth < confirmations {
            return Err(not_confirmed);
        }

        let confirming = self.ancestor(self.longest, depth - confirmations);
        if !confirming.is_some_and(|confirming| self.is_unlocked(&confirming, now)) {
            return Err(not_confirmed);
        }

        Ok(())
    }

    fn ancestor(&self, start: Buf32, hops: u64) -> Option<Buf32> {
        let mut cursor = start;
        for _ in 0..hops {
            cursor = self.headers.get(&cursor)?.header.parent_hash;
        }
        self.contains(&cursor).then_some(cursor)
    }

    /// Removes the header with `root` and all its descendants.
    ///
    /// Returns the removed headers depth-first, parents before children and siblings in
    /// insertion order. If the parent of `root` is left without successors it becomes an
    /// endpoint again. If it is left with a single successor, that branch merges back into the
    /// parent's: it takes over the parent's fork id and latest fork.
    pub fn prune(&mut self, root: &Buf32) -> Result<Vec<PrunedHeader>, PruneError> {
        if *root == self.genesis {
            return Err(PruneError::Genesis);
        }
        let parent_hash = self
            .header(root)
            .ok_or(PruneError::NotFound(*root))?
            .parent_hash;

        let mut order = Vec::new();
        let mut stack = vec![*root];
        while let Some(hash) = stack.pop() {
            if let Some(stored) = self.headers.get(&hash) {
                stack.extend(stored.meta.successors.iter().rev());
                order.push(hash);
            }
        }

        let removed_set: BTreeSet<Buf32> = order.iter().copied().collect();
        self.endpoints.retain(|hash| !removed_set.contains(hash));

        let pruned: Vec<PrunedHeader> = order
            .iter()
            .filter_map(|hash| {
                self.headers.remove(hash).map(|stored| PrunedHeader {
                    hash: *hash,
                    submitter: stored.meta.submitter,
                })
            })
            .collect();

        let mut survivor = None;
        if let Some(parent) = self.headers.get_mut(&parent_hash) {
            parent.meta.successors.retain(|hash| hash != root);
            match parent.meta.successors.as_slice() {
                [] => {
                    self.endpoints.push(parent_hash);
                    debug!(%parent_hash, "parent of pruned subtree became an endpoint");
                }
                [only] => {
                    survivor = Some((*only, parent.meta.fork_id, parent.meta.latest_fork));
                }
                _ => {}
            }
        }

        let merged = match survivor {
            Some((start, fork_id, latest_fork)) => {
                let path = self.first_successor_path(start);
                for hash in &path {
                    if let Some(stored) = self.headers.get_mut(hash) {
                        stored.meta.fork_id = fork_id;
                    }
                }
                self.set_latest_fork(&path, latest_fork);
                debug!(%parent_hash, %start, fork_id, "merged surviving branch into parent's");
                path
            }
            None => Vec::new(),
        };

        for (index, hash) in self.endpoints.iter().enumerate() {
            if let Some(stored) = self.headers.get_mut(hash) {
                stored.meta.iterable_index = index;
            }
        }
        let merged_slot = merged
            .last()
            .and_then(|endpoint| self.headers.get(endpoint))
            .map(|stored| stored.meta.iterable_index);
        if let Some(slot) = merged_slot {
            for hash in &merged {
                if let Some(stored) = self.headers.get_mut(hash) {
                    stored.meta.iterable_index = slot;
                }
            }
        }
        self.update_longest();

        info!(%root, removed = pruned.len(), "pruned subtree");
        Ok(pruned)
    }
}
