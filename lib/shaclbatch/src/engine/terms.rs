//! Small read helpers over [`Graph`] shared by the shape compiler and the validator.

use crate::error::ShapeError;
use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedNodeRef, NamedOrBlankNodeRef, Term};
use rustc_hash::FxHashSet;

/// Returns the term as a triple subject, if it can be one.
pub fn as_subject(term: &Term) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        Term::NamedNode(node) => Some(node.as_ref().into()),
        Term::BlankNode(node) => Some(node.as_ref().into()),
        _ => None,
    }
}

pub fn object(graph: &Graph, subject: &Term, predicate: NamedNodeRef<'_>) -> Option<Term> {
    graph
        .object_for_subject_predicate(as_subject(subject)?, predicate)
        .map(|t| t.into_owned())
}

pub fn objects(graph: &Graph, subject: &Term, predicate: NamedNodeRef<'_>) -> Vec<Term> {
    let Some(subject) = as_subject(subject) else {
        return Vec::new();
    };
    graph
        .objects_for_subject_predicate(subject, predicate)
        .map(|t| t.into_owned())
        .collect()
}

/// Reads the RDF list starting at `head`.
///
/// `shape` only feeds the error message.
pub fn list(graph: &Graph, head: Term, shape: &Term) -> Result<Vec<Term>, ShapeError> {
    let mut items = Vec::new();
    let mut seen = FxHashSet::default();
    let mut current = head;
    loop {
        if matches!(&current, Term::NamedNode(n) if n.as_ref() == rdf::NIL) {
            return Ok(items);
        }
        if !seen.insert(current.clone()) {
            return Err(ShapeError::InvalidList {
                shape: shape.clone(),
                message: "the list is cyclic".into(),
            });
        }
        let first = object(graph, &current, rdf::FIRST).ok_or_else(|| ShapeError::InvalidList {
            shape: shape.clone(),
            message: format!("{current} has no rdf:first"),
        })?;
        items.push(first);
        current = object(graph, &current, rdf::REST).ok_or_else(|| ShapeError::InvalidList {
            shape: shape.clone(),
            message: format!("{current} has no rdf:rest"),
        })?;
    }
}

/// Stable ordering key for terms, used wherever output order must not depend on hashing.
pub fn sort_key(term: &Term) -> String {
    term.to_string()
}
