//! Signature decipher: extracts the page's string-mangling routine from
//! player script source, classifies its primitives by shape, and replays
//! them on a scrambled signature. The script is never executed; upstream
//! format drift lands here first, so the structural patterns are kept in one
//! place.

use std::collections::HashMap;

use regex::Regex;

use crate::error::Error;

/// Call site of the decipher routine inside the larger decryption function.
const ROUTINE_ANCHOR: &str =
    r"\bc\s*&&\s*d\.set\([^,]+\s*,\s*\([^)]*\)\s*\(\s*([a-zA-Z0-9$]+)\(";

/// Dispatcher invocation inside the routine body, e.g. `Ab.cd(a,2);`.
const DISPATCHER_CALL: &str = r"([$_\w]+)\.\w+\(\w+,\d+\);";

/// Any dotted or bracket-indexed call, used to harvest candidate function
/// identifiers from the routine's statements.
const FUNCTION_NAME: &str = r#"[\w$]+(?:\.|\[)"?([\w$]+)"?\]?\("#;

const PRIMITIVE_KINDS: usize = 3;

fn pattern(source: &str) -> Regex {
    Regex::new(source).unwrap()
}

/// One primitive string transform recognized in the player script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherOperation {
    Reverse,
    Slice(usize),
    Swap(usize),
}

impl CipherOperation {
    pub fn apply(&self, signature: &str) -> String {
        match *self {
            CipherOperation::Reverse => signature.chars().rev().collect(),
            CipherOperation::Slice(index) => signature.chars().skip(index).collect(),
            CipherOperation::Swap(index) => {
                let mut chars: Vec<char> = signature.chars().collect();
                if index < chars.len() {
                    chars.swap(0, index);
                }
                chars.into_iter().collect()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Primitive {
    Reverse,
    Slice,
    Swap,
}

/// Ordered sequence of operations derived once per player-script version.
/// Applying it to the scrambled `s` parameter yields the signature the
/// origin server expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecipherProgram {
    operations: Vec<CipherOperation>,
}

impl DecipherProgram {
    /// Derives the program from player script source. Fails with
    /// `DecipherNotFound` when any structural anchor stops matching; there
    /// is no partial fallback.
    pub fn from_js(js: &str) -> Result<DecipherProgram, Error> {
        let routine = routine_name(js)?;
        let lines = routine_lines(js, &routine)?;
        let dispatcher = dispatcher_name(&lines)?;
        let definition = definition_body(js, &dispatcher)?;
        let classified = classify(&definition, &lines);
        build_program(&lines, &dispatcher, &classified)
    }

    pub fn operations(&self) -> &[CipherOperation] {
        &self.operations
    }

    pub fn apply(&self, signature: &str) -> String {
        let mut signature = signature.to_string();
        for operation in &self.operations {
            signature = operation.apply(&signature);
        }
        signature
    }
}

fn routine_name(js: &str) -> Result<String, Error> {
    pattern(ROUTINE_ANCHOR)
        .captures(js)
        .map(|caps| caps[1].to_string())
        .ok_or(Error::DecipherNotFound("decipher routine call site"))
}

/// Statement lines of the routine body, split on `;`. Helper-object members
/// (`h.NAME=function...`) shadow the routine name in some script versions
/// and are skipped.
fn routine_lines(js: &str, routine: &str) -> Result<Vec<String>, Error> {
    let body = pattern(&format!(
        r"(?s){}=function\(\w+\)\{{(.*?)\}}",
        regex::escape(routine)
    ));

    for caps in body.captures_iter(js) {
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
        if js[..start].ends_with("h.") {
            continue;
        }
        return Ok(caps[1].split(';').map(str::to_string).collect());
    }

    Err(Error::DecipherNotFound("decipher routine body"))
}

fn dispatcher_name(lines: &[String]) -> Result<String, Error> {
    pattern(DISPATCHER_CALL)
        .captures(&lines.join(";"))
        .map(|caps| caps[1].to_string())
        .ok_or(Error::DecipherNotFound("decipher dispatcher name"))
}

/// The `var NAME={...};` object literal holding the dispatcher's sibling
/// function definitions.
fn definition_body(js: &str, dispatcher: &str) -> Result<String, Error> {
    pattern(&format!(
        r"(?s)var\s+{}=\{{\w+:function\(\w+(?:,\w+)?\)\{{.*?\}},?\}};",
        regex::escape(dispatcher)
    ))
    .find(js)
    .map(|m| m.as_str().to_string())
    .ok_or(Error::DecipherNotFound("decipher definition body"))
}

/// Classifies every function identifier referenced by the routine against
/// the three known primitive shapes. Slice and swap are checked first;
/// reverse is checked last and overrides when both shapes happen to match.
/// Stops once all three primitive kinds have been identified.
fn classify(definition: &str, lines: &[String]) -> HashMap<String, Primitive> {
    let name = pattern(FUNCTION_NAME);
    let mut classified = HashMap::new();

    for line in lines {
        if classified.len() == PRIMITIVE_KINDS {
            break;
        }
        let caps = match name.captures(line) {
            Some(caps) => caps,
            None => continue,
        };
        let function = &caps[1];
        if classified.contains_key(function) {
            continue;
        }
        if let Some(primitive) = classify_function(definition, function) {
            classified.insert(function.to_string(), primitive);
        }
    }

    classified
}

fn classify_function(definition: &str, function: &str) -> Option<Primitive> {
    let escaped = regex::escape(function);
    let mut primitive = None;

    if pattern(&format!(
        r#""?{}"?:function\(a,b\).(?:return)?.?\w+\."#,
        escaped
    ))
    .is_match(definition)
    {
        primitive = Some(Primitive::Slice);
    } else if pattern(&format!(
        r#""?{}"?:function\(\w+,\w\).\bvar\b.\bc=a\b"#,
        escaped
    ))
    .is_match(definition)
    {
        primitive = Some(Primitive::Swap);
    }
    if pattern(&format!(r#""?{}"?:function\(\w+\)\{{\w+\.reverse"#, escaped)).is_match(definition)
    {
        primitive = Some(Primitive::Reverse);
    }

    primitive
}

/// Walks the routine's statements in original order and appends one
/// operation per dispatcher invocation. A dispatcher method the classifier
/// never identified makes the whole program unusable.
fn build_program(
    lines: &[String],
    dispatcher: &str,
    classified: &HashMap<String, Primitive>,
) -> Result<DecipherProgram, Error> {
    let call = pattern(&format!(
        r"{}\.(\w+)\(\w+(?:,(\d+))?\)",
        regex::escape(dispatcher)
    ));

    let mut operations = Vec::new();
    for line in lines {
        let caps = match call.captures(line) {
            Some(caps) => caps,
            None => continue,
        };
        let primitive = classified
            .get(&caps[1])
            .ok_or(Error::DecipherNotFound("unclassified cipher primitive"))?;
        let index = || -> Result<usize, Error> {
            caps.get(2)
                .and_then(|m| m.as_str().parse().ok())
                .ok_or(Error::DecipherNotFound("cipher operation index"))
        };
        operations.push(match primitive {
            Primitive::Reverse => CipherOperation::Reverse,
            Primitive::Slice => CipherOperation::Slice(index()?),
            Primitive::Swap => CipherOperation::Swap(index()?),
        });
    }

    if operations.is_empty() {
        return Err(Error::DecipherNotFound("no cipher operations in routine"));
    }

    Ok(DecipherProgram { operations })
}
