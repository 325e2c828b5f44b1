//! SHACL property paths.

use super::terms::{as_subject, list, object};
use crate::error::ShapeError;
use crate::vocab::sh;
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, Graph, NamedNode, Term, Triple};
use rustc_hash::FxHashSet;
use std::fmt;

/// A parsed `sh:path` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyPath {
    Predicate(NamedNode),
    Sequence(Vec<PropertyPath>),
    Alternative(Vec<PropertyPath>),
    Inverse(Box<PropertyPath>),
    ZeroOrMore(Box<PropertyPath>),
    OneOrMore(Box<PropertyPath>),
    ZeroOrOne(Box<PropertyPath>),
}

impl PropertyPath {
    pub fn parse(graph: &Graph, term: &Term) -> Result<Self, ShapeError> {
        match term {
            Term::NamedNode(predicate) => Ok(Self::Predicate(predicate.clone())),
            Term::BlankNode(_) => {
                if let Some(head) = object(graph, term, sh::ALTERNATIVE_PATH) {
                    return Ok(Self::Alternative(Self::parse_list(graph, head, term)?));
                }
                let unary: [(_, fn(Box<Self>) -> Self); 4] = [
                    (sh::INVERSE_PATH, Self::Inverse),
                    (sh::ZERO_OR_MORE_PATH, Self::ZeroOrMore),
                    (sh::ONE_OR_MORE_PATH, Self::OneOrMore),
                    (sh::ZERO_OR_ONE_PATH, Self::ZeroOrOne),
                ];
                for (predicate, build) in unary {
                    if let Some(inner) = object(graph, term, predicate) {
                        return Ok(build(Box::new(Self::parse(graph, &inner)?)));
                    }
                }
                if object(graph, term, rdf::FIRST).is_some() {
                    let paths = Self::parse_list(graph, term.clone(), term)?;
                    if paths.len() >= 2 {
                        return Ok(Self::Sequence(paths));
                    }
                }
                Err(ShapeError::InvalidPath {
                    shape: term.clone(),
                    message: "unknown property path structure".into(),
                })
            }
            _ => Err(ShapeError::InvalidPath {
                shape: term.clone(),
                message: "a property path must be an IRI or a blank node".into(),
            }),
        }
    }

    fn parse_list(graph: &Graph, head: Term, owner: &Term) -> Result<Vec<Self>, ShapeError> {
        list(graph, head, owner)?
            .iter()
            .map(|item| Self::parse(graph, item))
            .collect()
    }

    /// Returns the value nodes reached from `focus`, without duplicates, in discovery order.
    pub fn evaluate(&self, graph: &Graph, focus: &Term) -> Vec<Term> {
        let mut values = Vec::new();
        let mut seen = FxHashSet::default();
        for value in self.step(graph, focus) {
            if seen.insert(value.clone()) {
                values.push(value);
            }
        }
        values
    }

    fn step(&self, graph: &Graph, focus: &Term) -> Vec<Term> {
        match self {
            Self::Predicate(predicate) => as_subject(focus)
                .map(|subject| {
                    graph
                        .objects_for_subject_predicate(subject, predicate)
                        .map(|t| t.into_owned())
                        .collect()
                })
                .unwrap_or_default(),
            Self::Sequence(paths) => {
                let mut current = vec![focus.clone()];
                for path in paths {
                    current = current
                        .iter()
                        .flat_map(|node| path.evaluate(graph, node))
                        .collect();
                }
                current
            }
            Self::Alternative(paths) => paths
                .iter()
                .flat_map(|path| path.evaluate(graph, focus))
                .collect(),
            Self::Inverse(inner) => match inner.as_ref() {
                Self::Predicate(predicate) => graph
                    .subjects_for_predicate_object(predicate, focus)
                    .map(|s| s.into_owned().into())
                    .collect(),
                inner => {
                    // Complex inverse paths have no index to follow.
                    let mut subjects = Vec::new();
                    let mut tried = FxHashSet::default();
                    for triple in graph {
                        let candidate: Term = triple.subject.into_owned().into();
                        if tried.insert(candidate.clone())
                            && inner.evaluate(graph, &candidate).contains(focus)
                        {
                            subjects.push(candidate);
                        }
                    }
                    subjects
                }
            },
            Self::ZeroOrMore(inner) => closure(inner, graph, focus, true),
            Self::OneOrMore(inner) => closure(inner, graph, focus, false),
            Self::ZeroOrOne(inner) => {
                let mut values = vec![focus.clone()];
                values.extend(inner.evaluate(graph, focus));
                values
            }
        }
    }

    /// Writes the SHACL form of the path into `graph` and returns its root node.
    ///
    /// `blank_node` names every blank node the path needs.
    pub fn to_rdf(&self, graph: &mut Graph, blank_node: &mut impl FnMut() -> BlankNode) -> Term {
        let (predicate, inner) = match self {
            Self::Predicate(p) => return p.clone().into(),
            Self::Sequence(paths) => return write_list(paths, graph, blank_node),
            Self::Alternative(paths) => {
                let node = blank_node();
                let list = write_list(paths, graph, blank_node);
                graph.insert(&Triple::new(node.clone(), sh::ALTERNATIVE_PATH, list));
                return node.into();
            }
            Self::Inverse(p) => (sh::INVERSE_PATH, p),
            Self::ZeroOrMore(p) => (sh::ZERO_OR_MORE_PATH, p),
            Self::OneOrMore(p) => (sh::ONE_OR_MORE_PATH, p),
            Self::ZeroOrOne(p) => (sh::ZERO_OR_ONE_PATH, p),
        };
        let node = blank_node();
        let inner = inner.to_rdf(graph, blank_node);
        graph.insert(&Triple::new(node.clone(), predicate, inner));
        node.into()
    }

    pub fn as_predicate(&self) -> Option<&NamedNode> {
        match self {
            Self::Predicate(p) => Some(p),
            _ => None,
        }
    }
}

/// An RDF list of `paths`.
fn write_list(
    paths: &[PropertyPath],
    graph: &mut Graph,
    blank_node: &mut impl FnMut() -> BlankNode,
) -> Term {
    let cells = paths.iter().map(|_| blank_node()).collect::<Vec<_>>();
    for (i, (cell, path)) in cells.iter().zip(paths).enumerate() {
        let first = path.to_rdf(graph, blank_node);
        graph.insert(&Triple::new(cell.clone(), rdf::FIRST, first));
        let rest: Term = match cells.get(i + 1) {
            Some(next) => next.clone().into(),
            None => rdf::NIL.into_owned().into(),
        };
        graph.insert(&Triple::new(cell.clone(), rdf::REST, rest));
    }
    match cells.into_iter().next() {
        Some(head) => head.into(),
        None => rdf::NIL.into_owned().into(),
    }
}

/// Transitive closure of `inner` from `focus`, breadth first.
fn closure(inner: &PropertyPath, graph: &Graph, focus: &Term, reflexive: bool) -> Vec<Term> {
    let mut reached = Vec::new();
    let mut seen = FxHashSet::default();
    if reflexive {
        seen.insert(focus.clone());
        reached.push(focus.clone());
    }
    let mut frontier = vec![focus.clone()];
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for node in &frontier {
            for value in inner.evaluate(graph, node) {
                if seen.insert(value.clone()) {
                    reached.push(value.clone());
                    next.push(value);
                }
            }
        }
        frontier = next;
    }
    reached
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, paths: &[PropertyPath], sep: &str) -> fmt::Result {
            f.write_str("(")?;
            for (i, p) in paths.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{p}")?;
            }
            f.write_str(")")
        }
        match self {
            Self::Predicate(p) => write!(f, "{p}"),
            Self::Sequence(paths) => join(f, paths, " / "),
            Self::Alternative(paths) => join(f, paths, " | "),
            Self::Inverse(p) => write!(f, "^{p}"),
            Self::ZeroOrMore(p) => write!(f, "{p}*"),
            Self::OneOrMore(p) => write!(f, "{p}+"),
            Self::ZeroOrOne(p) => write!(f, "{p}?"),
        }
    }
}
