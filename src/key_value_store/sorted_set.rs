use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
};

use bytes::Bytes;

use super::normalize_range;

/// Score wrapper giving `f64` the total order needed for the index.
#[derive(Debug, Clone, Copy)]
struct OrderedScore(f64);

impl PartialEq for OrderedScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedScore {}

impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Lower or upper limit of a score range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    Inclusive(f64),
    Exclusive(f64),
}

impl ScoreBound {
    fn admits_from_below(&self, score: f64) -> bool {
        match *self {
            ScoreBound::Inclusive(min) => score >= min,
            ScoreBound::Exclusive(min) => score > min,
        }
    }

    fn admits_from_above(&self, score: f64) -> bool {
        match *self {
            ScoreBound::Inclusive(max) => score <= max,
            ScoreBound::Exclusive(max) => score < max,
        }
    }
}

/// Members ordered by `(score, member)`, with O(1) score lookup.
#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    scores: HashMap<Bytes, f64>,
    index: BTreeSet<(OrderedScore, Bytes)>,
}

impl PartialEq for SortedSet {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Inserts or updates a member. Returns `true` when the member is new.
    pub fn add(&mut self, member: Bytes, score: f64) -> bool {
        // -0.0 and 0.0 are the same score.
        let score = if score == 0.0 { 0.0 } else { score };

        match self.scores.insert(member.clone(), score) {
            Some(previous) => {
                self.index.remove(&(OrderedScore(previous), member.clone()));
                self.index.insert((OrderedScore(score), member));
                false
            }
            None => {
                self.index.insert((OrderedScore(score), member));
                true
            }
        }
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove_entry(member) {
            Some((member, score)) => {
                self.index.remove(&(OrderedScore(score), member));
                true
            }
            None => false,
        }
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Zero-based position of `member` in ascending order.
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let score = self.score(member)?;
        let key = (OrderedScore(score), Bytes::copy_from_slice(member));

        Some(self.index.range(..&key).count())
    }

    /// Members between two ranks, both inclusive. Negative ranks count from the end.
    pub fn range_by_rank(&self, start: i64, stop: i64) -> Vec<(Bytes, f64)> {
        let Some((start, stop)) = normalize_range(start, stop, self.len()) else {
            return Vec::new();
        };

        self.index
            .iter()
            .skip(start)
            .take(stop - start + 1)
            .map(|(score, member)| (member.clone(), score.0))
            .collect()
    }

    pub fn range_by_score(&self, min: ScoreBound, max: ScoreBound) -> Vec<(Bytes, f64)> {
        self.index
            .iter()
            .skip_while(|(score, _)| !min.admits_from_below(score.0))
            .take_while(|(score, _)| max.admits_from_above(score.0))
            .map(|(score, member)| (member.clone(), score.0))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, f64)> {
        self.index.iter().map(|(score, member)| (member, score.0))
    }
}
