//! Quote-aware keyword rewriter
//!
//! Each line is scanned on its own, left to right. Outside a quoted literal
//! the longest keyword that starts at the current position and is not glued
//! to a neighbouring letter is replaced; everything else is copied through.

use std::collections::HashMap;

use crate::dictionary::KeywordMap;

const ESCAPE: char = '\\';

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Per-line scan state
#[derive(Debug, Default)]
struct LexState {
    pos: usize,
    quote: Option<char>,
}

impl LexState {
    fn in_string(&self) -> bool {
        self.quote.is_some()
    }

    /// Feed a quote character that is not escaped
    fn toggle(&mut self, c: char) {
        match self.quote {
            None => self.quote = Some(c),
            Some(open) if open == c => self.quote = None,
            // The other quote kind inside a literal is plain content
            Some(_) => {}
        }
    }
}

#[derive(Debug)]
struct Candidate {
    chars: Vec<char>,
    replacement: String,
}

/// Rewrites dialect source into host-language source
#[derive(Debug)]
pub struct Translator {
    keywords: KeywordMap,
    /// Candidates in longest-first order
    candidates: Vec<Candidate>,
    /// First character -> candidate ids, preserving longest-first order
    index: HashMap<char, Vec<usize>>,
}

impl Translator {
    pub fn new(keywords: KeywordMap) -> Self {
        let candidates: Vec<Candidate> = keywords
            .by_length()
            .into_iter()
            .map(|k| Candidate {
                chars: k.word.chars().collect(),
                replacement: k.replacement.clone(),
            })
            .collect();

        let mut index: HashMap<char, Vec<usize>> = HashMap::new();
        for (id, candidate) in candidates.iter().enumerate() {
            if let Some(&first) = candidate.chars.first() {
                index.entry(first).or_default().push(id);
            }
        }

        Self {
            keywords,
            candidates,
            index,
        }
    }

    /// The dictionary this translator was built from
    pub fn keywords(&self) -> &KeywordMap {
        &self.keywords
    }

    /// Translate a whole source text. Never fails; unknown text passes
    /// through unchanged and the number of lines is preserved.
    pub fn translate(&self, source: &str) -> String {
        source
            .split('\n')
            .map(|line| self.translate_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Translate a single line. Quote state never carries over to the next
    /// line.
    pub fn translate_line(&self, line: &str) -> String {
        let chars: Vec<char> = line.chars().collect();
        let mut out = String::with_capacity(line.len());
        let mut state = LexState::default();

        while state.pos < chars.len() {
            let c = chars[state.pos];

            if is_quote(c) && (state.pos == 0 || chars[state.pos - 1] != ESCAPE) {
                state.toggle(c);
                out.push(c);
                state.pos += 1;
                continue;
            }

            if !state.in_string() {
                if let Some(candidate) = self.match_at(&chars, state.pos) {
                    out.push_str(&candidate.replacement);
                    state.pos += candidate.chars.len();
                    continue;
                }
            }

            out.push(c);
            state.pos += 1;
        }

        out
    }

    /// First keyword (longest-first) matching at `pos` on word boundaries
    fn match_at(&self, chars: &[char], pos: usize) -> Option<&Candidate> {
        let ids = self.index.get(&chars[pos])?;

        if pos > 0 && chars[pos - 1].is_alphabetic() {
            return None;
        }

        ids.iter()
            .map(|&id| &self.candidates[id])
            .find(|candidate| {
                let end = pos + candidate.chars.len();
                end <= chars.len()
                    && chars[pos..end] == candidate.chars[..]
                    && chars.get(end).map_or(true, |next| !next.is_alphabetic())
            })
    }
}
