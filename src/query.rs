use std::borrow::Cow;
use std::fmt;

/// Ordered view of a URL query string. Keys are case-sensitive and keep
/// their original position across rewrites, so a signature parameter can be
/// replaced in place and the string re-serialized without reordering
/// anything the origin server might care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMap {
    base: Option<String>,
    pairs: Vec<(String, String)>,
}

impl QueryMap {
    /// Parses either a bare `k=v&k=v` string or a full URL (everything up to
    /// the first `?` is kept as an opaque base). Values are percent-decoded
    /// once; malformed pairs are skipped.
    pub fn parse(input: &str) -> QueryMap {
        let (base, query) = match input.find('?') {
            Some(idx) => (Some(input[..idx].to_string()), &input[idx + 1..]),
            None => (None, input),
        };

        let mut pairs = Vec::new();
        for pair in query.split('&') {
            let (name, value) = match pair.split_once('=') {
                Some(kv) => kv,
                None => continue,
            };
            if name.is_empty() {
                continue;
            }
            pairs.push((name.to_string(), percent_decode(value)));
        }

        QueryMap { base, pairs }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }

    /// Overwrites an existing value in place, or appends the pair.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.pairs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.pairs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for QueryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(base) = &self.base {
            write!(f, "{}?", base)?;
        }
        for (i, (name, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                write!(f, "&")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Lenient percent-decode; input that does not decode to valid UTF-8 is
/// returned unchanged.
pub fn percent_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| input.to_string())
}
