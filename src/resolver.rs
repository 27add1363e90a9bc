//! # Object Path Resolution
//!
//! Users name objects approximately: `vstore get gh` should find
//! `work/github`. Resolution works in two steps:
//!
//! 1. [`fuzzy_find`] ranks every object path by how well the query matches
//!    it as a subsequence, rewarding matches at the start of the path,
//!    after separators, on camel-case humps and on adjacent characters.
//! 2. [`resolve_path`] returns the single candidate when there is exactly
//!    one. Otherwise a [`Disambiguator`] picks a candidate or asks for the
//!    query to be created as a new object.

use crate::error::{Result, VstoreError};
use std::cmp::Ordering;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const GIT_DIR: &str = ".git";

const FIRST_CHAR_MATCH_BONUS: i32 = 10;
const SEPARATOR_MATCH_BONUS: i32 = 20;
const CAMEL_CASE_MATCH_BONUS: i32 = 20;
const ADJACENT_MATCH_BONUS: i32 = 5;
const UNMATCHED_LEADING_CHAR_PENALTY: i32 = -5;
const MAX_UNMATCHED_LEADING_CHAR_PENALTY: i32 = -15;
const UNMATCHED_CHAR_PENALTY: i32 = -1;

/// One ranked candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    /// Object path relative to the store root, `/`-separated
    pub path: String,
    pub score: i32,
    /// Character positions in `path` matched by the query
    pub matched_indexes: Vec<usize>,
    index: usize,
}

/// Picks among ambiguous candidates.
///
/// Returning `candidates.len()` means "none of these": the query itself
/// becomes the path of a new object.
pub trait Disambiguator {
    fn select(&mut self, query: &str, candidates: &[FuzzyMatch]) -> Result<usize>;
}

impl<F> Disambiguator for F
where
    F: FnMut(&str, &[FuzzyMatch]) -> Result<usize>,
{
    fn select(&mut self, query: &str, candidates: &[FuzzyMatch]) -> Result<usize> {
        self(query, candidates)
    }
}

/// Outcome of [`resolve_path`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Path relative to the store root
    pub relative: PathBuf,
    pub absolute: PathBuf,
    pub is_new: bool,
}

/// Map `query` onto exactly one object path under `store_dir`
pub fn resolve_path(
    store_dir: &Path,
    query: &str,
    disambiguator: &mut dyn Disambiguator,
) -> Result<ResolvedPath> {
    let candidates = fuzzy_find(query, &list_objects(store_dir)?);
    debug!(query, candidates = candidates.len(), "fuzzy matched object path");

    if let [only] = candidates.as_slice() {
        return Ok(existing(store_dir, &only.path));
    }

    let choice = disambiguator.select(query, &candidates)?;
    match choice.cmp(&candidates.len()) {
        Ordering::Less => Ok(existing(store_dir, &candidates[choice].path)),
        Ordering::Equal => prepare_new_object(store_dir, query),
        Ordering::Greater => Err(VstoreError::PathResolutionFailure(format!(
            "selection {choice} is out of range (0..={})",
            candidates.len()
        ))),
    }
}

/// Validate `query` as a new object path and create its parent directories
pub fn prepare_new_object(store_dir: &Path, query: &str) -> Result<ResolvedPath> {
    let relative = validate_object_path(query)?;
    let absolute = store_dir.join(&relative);
    if let Some(parent) = absolute.parent() {
        fs::create_dir_all(parent)?;
    }
    let is_new = !absolute.exists();
    Ok(ResolvedPath {
        relative,
        absolute,
        is_new,
    })
}

/// Check that `path` stays inside the store and names a file
pub fn validate_object_path(path: &str) -> Result<PathBuf> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(VstoreError::PathResolutionFailure(
            "object path is empty".into(),
        ));
    }

    let relative = PathBuf::from(trimmed);
    for component in relative.components() {
        match component {
            Component::Normal(part) if part != GIT_DIR => {}
            _ => {
                return Err(VstoreError::PathResolutionFailure(format!(
                    "{path} is not a valid object path"
                )))
            }
        }
    }
    Ok(relative)
}

/// Every regular file under `store_dir`, relative and `/`-separated, sorted.
///
/// A missing store directory holds no objects.
pub fn list_objects(store_dir: &Path) -> Result<Vec<String>> {
    if !store_dir.exists() {
        return Ok(Vec::new());
    }

    let mut objects = Vec::new();
    let walker = WalkDir::new(store_dir)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != GIT_DIR);
    for entry in walker {
        let entry = entry.map_err(|e| VstoreError::Other(format!("Couldn't list objects: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(store_dir)
            .map_err(|e| VstoreError::Other(e.to_string()))?;
        objects.push(to_object_name(relative));
    }
    objects.sort();
    Ok(objects)
}

fn to_object_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn existing(store_dir: &Path, object: &str) -> ResolvedPath {
    let relative = PathBuf::from(object);
    ResolvedPath {
        absolute: store_dir.join(&relative),
        relative,
        is_new: false,
    }
}

/// Rank `candidates` against `query`, best first.
///
/// Candidates that don't contain the query as a case-insensitive
/// subsequence are dropped. An empty query matches nothing.
pub fn fuzzy_find(query: &str, candidates: &[String]) -> Vec<FuzzyMatch> {
    let query: Vec<char> = query.chars().collect();
    if query.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<FuzzyMatch> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| score(&query, candidate, index))
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.path.len().cmp(&b.path.len()))
            .then_with(|| a.index.cmp(&b.index))
    });
    matches
}

fn score(query: &[char], candidate: &str, index: usize) -> Option<FuzzyMatch> {
    let chars: Vec<char> = candidate.chars().collect();
    let mut matched_indexes = Vec::with_capacity(query.len());
    let mut total = 0;
    let mut q = 0;
    let mut last_match: Option<usize> = None;

    for (i, &c) in chars.iter().enumerate() {
        if q == query.len() {
            break;
        }
        if !chars_equal(c, query[q]) {
            continue;
        }

        let mut bonus = 0;
        if i == 0 {
            bonus += FIRST_CHAR_MATCH_BONUS;
        }
        if i > 0 && is_separator(chars[i - 1]) {
            bonus += SEPARATOR_MATCH_BONUS;
        }
        if i > 0 && chars[i - 1].is_lowercase() && c.is_uppercase() {
            bonus += CAMEL_CASE_MATCH_BONUS;
        }
        if last_match.is_some_and(|last| last + 1 == i) {
            bonus += ADJACENT_MATCH_BONUS;
        }
        if q == 0 && i > 0 {
            let leading = (i as i32 * UNMATCHED_LEADING_CHAR_PENALTY)
                .max(MAX_UNMATCHED_LEADING_CHAR_PENALTY);
            bonus += leading;
        }

        total += bonus;
        matched_indexes.push(i);
        last_match = Some(i);
        q += 1;
    }

    if q < query.len() {
        return None;
    }

    let unmatched = (chars.len() - matched_indexes.len()) as i32;
    total += unmatched * UNMATCHED_CHAR_PENALTY;

    Some(FuzzyMatch {
        path: candidate.to_string(),
        score: total,
        matched_indexes,
        index,
    })
}

fn chars_equal(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn is_separator(c: char) -> bool {
    matches!(c, '/' | '-' | '_' | '.' | ' ')
}
