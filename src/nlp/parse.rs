//! Decoding of typed-dependency lines and bracketed constituency trees.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// One typed dependency, e.g. `nsubj(arrested-2, Police-1)`.
///
/// Word indices are 1-based; index 0 is the artificial ROOT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub relation: String,
    pub governor: String,
    pub governor_index: usize,
    pub dependent: String,
    pub dependent_index: usize,
}

static DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^\s(]+)\((.+)-(\d+)'*,\s*(.+)-(\d+)'*\)\s*$").expect("valid regex")
});

impl DependencyEdge {
    pub fn new(
        relation: impl Into<String>,
        governor: impl Into<String>,
        governor_index: usize,
        dependent: impl Into<String>,
        dependent_index: usize,
    ) -> Self {
        Self {
            relation: relation.into(),
            governor: governor.into(),
            governor_index,
            dependent: dependent.into(),
            dependent_index,
        }
    }

    /// Parse the Stanford text form of a dependency. Copy-node primes
    /// (`went-3'`) are accepted and dropped.
    pub fn parse(line: &str) -> Result<Self> {
        let caps = DEPENDENCY
            .captures(line)
            .ok_or_else(|| Error::malformed("dependency", format!("unrecognised line {line:?}")))?;
        let index = |i: usize| -> Result<usize> {
            caps[i]
                .parse()
                .map_err(|_| Error::malformed("dependency", format!("bad index in {line:?}")))
        };
        Ok(Self {
            relation: caps[1].to_string(),
            governor: caps[2].to_string(),
            governor_index: index(3)?,
            dependent: caps[4].to_string(),
            dependent_index: index(5)?,
        })
    }
}

/// Parse every dependency line of one sentence, failing on the first bad line.
pub fn parse_dependencies<S: AsRef<str>>(lines: &[S]) -> Result<Vec<DependencyEdge>> {
    lines
        .iter()
        .map(|line| line.as_ref())
        .filter(|line| !line.trim().is_empty())
        .map(DependencyEdge::parse)
        .collect()
}

/// Leaves of a bracketed parse tree in sentence order, as (POS tag, word).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseTree {
    leaves: Vec<(String, String)>,
}

impl ParseTree {
    /// Read a Penn-style bracketed tree such as
    /// `(ROOT (S (NP (NNS Police)) (VP (VBD arrested) (NP (PRP him)))))`.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = bracket_tokens(text);
        let mut leaves = Vec::new();
        let mut depth = 0usize;
        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                "(" => {
                    depth += 1;
                    let label = match tokens.get(i + 1) {
                        Some(&tok) if tok != "(" && tok != ")" => {
                            i += 1;
                            tok
                        }
                        _ => "",
                    };
                    if let (Some(&word), Some(&")")) = (tokens.get(i + 1), tokens.get(i + 2)) {
                        if word != "(" && word != ")" {
                            leaves.push((label.to_string(), word.to_string()));
                            i += 2;
                            depth -= 1;
                        }
                    }
                }
                ")" => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        Error::malformed("parse tree", "unbalanced closing bracket")
                    })?;
                }
                word => {
                    return Err(Error::malformed(
                        "parse tree",
                        format!("stray token {word:?} outside a preterminal"),
                    ))
                }
            }
            i += 1;
        }
        if depth != 0 {
            return Err(Error::malformed("parse tree", "unbalanced opening bracket"));
        }
        Ok(Self { leaves })
    }

    /// Build a tree directly from tagged words, mostly useful in tests.
    pub fn from_tagged<I, T, W>(tagged: I) -> Self
    where
        I: IntoIterator<Item = (T, W)>,
        T: Into<String>,
        W: Into<String>,
    {
        Self {
            leaves: tagged
                .into_iter()
                .map(|(tag, word)| (tag.into(), word.into()))
                .collect(),
        }
    }

    /// POS tag of the word at a 1-based dependency index.
    pub fn pos_at(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.leaves.get(i))
            .map(|(tag, _)| tag.as_str())
    }

    /// Surface word at a 1-based dependency index.
    pub fn word_at(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.leaves.get(i))
            .map(|(_, word)| word.as_str())
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

fn bracket_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (pos, ch) in text.char_indices() {
        if ch == '(' || ch == ')' || ch.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(&text[s..pos]);
            }
            if !ch.is_whitespace() {
                tokens.push(&text[pos..pos + 1]);
            }
        } else if start.is_none() {
            start = Some(pos);
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens
}
