//! A minimal ElementPath-style query language over [`Element`] trees.
//!
//! Supported syntax: `.` (context node), child steps by name, `*`, `//`
//! for descendant steps (including a leading `.//`) and any number of
//! `[@ATTR='value']` predicates per step (single or double quotes).

use std::collections::HashSet;

use super::error::ManifestError;
use super::xml::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Context,
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<(String, String)>,
}

impl Step {
    fn matches(&self, element: &Element) -> bool {
        let name_ok = match &self.test {
            NameTest::Context | NameTest::Any => true,
            NameTest::Name(name) => element.name == *name,
        };
        name_ok
            && self
                .predicates
                .iter()
                .all(|(attr, value)| element.attr(attr) == Some(value.as_str()))
    }
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    source: String,
    steps: Vec<Step>,
}

impl ElementPath {
    pub fn parse(path: &str) -> Result<Self, ManifestError> {
        let invalid = |reason: &str| ManifestError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("empty path"));
        }
        if path.starts_with('/') {
            return Err(invalid("absolute paths are not supported"));
        }

        let segments = split_segments(path).ok_or_else(|| invalid("unbalanced brackets"))?;
        let mut steps = Vec::new();
        let mut axis = Axis::Child;

        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                if i == 0 || i == segments.len() - 1 || axis == Axis::Descendant {
                    return Err(invalid("unexpected '/'"));
                }
                axis = Axis::Descendant;
                continue;
            }
            let step = parse_step(segment, axis).map_err(|reason| invalid(&reason))?;
            // A leading `.` is the context node itself.
            if !(step.test == NameTest::Context && step.predicates.is_empty() && axis == Axis::Child)
            {
                steps.push(step);
            }
            axis = Axis::Child;
        }

        Ok(Self {
            source: path.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluates the path from `context`, returning unique matches in
    /// document order.
    pub fn evaluate<'a>(&self, context: &'a Element) -> Vec<&'a Element> {
        let mut current = vec![context];
        for step in &self.steps {
            let mut next: Vec<&'a Element> = Vec::new();
            let mut seen: HashSet<*const Element> = HashSet::new();
            for node in &current {
                let candidates: Vec<&'a Element> = match (step.axis, &step.test) {
                    (Axis::Child, NameTest::Context) => vec![*node],
                    (Axis::Child, _) => node.children.iter().collect(),
                    (Axis::Descendant, _) => node.descendants(),
                };
                for candidate in candidates {
                    if step.matches(candidate) && seen.insert(candidate as *const Element) {
                        next.push(candidate);
                    }
                }
            }
            current = next;
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

/// Splits on `/` outside of brackets and quotes.
fn split_segments(path: &str) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in path.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') if depth > 0 => {
                quote = Some(c);
                current.push(c);
            }
            (None, '[') => {
                depth += 1;
                current.push(c);
            }
            (None, ']') => {
                depth = depth.checked_sub(1)?;
                current.push(c);
            }
            (None, '/') if depth == 0 => segments.push(std::mem::take(&mut current)),
            (None, c) => current.push(c),
        }
    }

    if depth != 0 || quote.is_some() {
        return None;
    }
    segments.push(current);
    Some(segments)
}

fn parse_step(segment: &str, axis: Axis) -> Result<Step, String> {
    let (name, mut rest) = match segment.find('[') {
        Some(i) => (&segment[..i], &segment[i..]),
        None => (segment, ""),
    };

    let test = match name {
        "." => NameTest::Context,
        "*" => NameTest::Any,
        "" => return Err("missing element name".to_string()),
        n if n.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')) => {
            NameTest::Name(n.to_string())
        }
        n => return Err(format!("invalid element name '{}'", n)),
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let end = rest
            .find(']')
            .ok_or_else(|| "unterminated predicate".to_string())?;
        predicates.push(parse_predicate(&rest[1..end])?);
        rest = &rest[end + 1..];
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(format!("unexpected '{}' after predicate", rest));
        }
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn parse_predicate(body: &str) -> Result<(String, String), String> {
    let body = body.trim();
    let inner = body
        .strip_prefix('@')
        .ok_or_else(|| format!("unsupported predicate '[{}]'", body))?;
    let (attr, value) = inner
        .split_once('=')
        .ok_or_else(|| format!("unsupported predicate '[{}]'", body))?;
    let value = value.trim();
    let unquoted = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
        .ok_or_else(|| format!("predicate value must be quoted in '[{}]'", body))?;
    Ok((attr.trim().to_string(), unquoted.to_string()))
}
