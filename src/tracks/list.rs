//! Track list and random track selection

use std::io::BufRead;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::TrackError;

/// Immutable list of track paths, loaded once at startup
#[derive(Debug, Clone)]
pub struct TrackList {
    paths: Vec<PathBuf>,
}

impl TrackList {
    /// Build a list from paths. An empty list is rejected.
    pub fn new(paths: Vec<PathBuf>) -> Result<Self, TrackError> {
        if paths.is_empty() {
            return Err(TrackError::EmptyTrackList);
        }
        Ok(Self { paths })
    }

    /// Read one path per non-empty line.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, TrackError> {
        let mut paths = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(TrackError::ListUnreadable)?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            paths.push(PathBuf::from(line));
        }
        Self::new(paths)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Let `selector` pick the next track.
    pub fn choose<S>(&self, selector: &mut S) -> (usize, &Path)
    where
        S: TrackSelector + ?Sized,
    {
        let index = selector.next_index(self.paths.len()) % self.paths.len();
        (index, &self.paths[index])
    }
}

/// Source of track indices for one connection
pub trait TrackSelector: Send {
    /// Pick an index in `0..len`. `len` is never zero.
    fn next_index(&mut self, len: usize) -> usize;
}

/// Uniform random selection
#[derive(Debug)]
pub struct RandomSelector<R = StdRng> {
    rng: R,
}

impl RandomSelector<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomSelector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> TrackSelector for RandomSelector<R> {
    fn next_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}
