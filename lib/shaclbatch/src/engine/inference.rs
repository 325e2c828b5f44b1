//! RDFS entailment, materialized in the data graph before validation.
//!
//! Covers the schema rules that change SHACL results: rdfs2 (domain), rdfs3 (range),
//! rdfs5 and rdfs11 (transitivity of sub-properties and sub-classes), rdfs7 (sub-property
//! inheritance) and rdfs9 (type inheritance). Axiomatic triples are not added.

use crate::error::EngineError;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Graph, NamedOrBlankNode, NamedOrBlankNodeRef, Term, TermRef, Triple};

/// Bound on the number of fixpoint rounds.
pub const MAX_ITERATIONS: usize = 1_000;

/// Adds the RDFS closure of `graph` to it and returns the number of inferred triples.
pub fn rdfs_closure(graph: &mut Graph) -> Result<usize, EngineError> {
    let initial = graph.len();
    for _ in 0..MAX_ITERATIONS {
        let fresh = one_round(graph)
            .into_iter()
            .filter(|t| !graph.contains(t))
            .collect::<Vec<_>>();
        if fresh.is_empty() {
            return Ok(graph.len() - initial);
        }
        for triple in &fresh {
            graph.insert(triple);
        }
    }
    Err(EngineError::InferenceLimit(MAX_ITERATIONS))
}

fn one_round(graph: &Graph) -> Vec<Triple> {
    let mut inferred = Vec::new();

    // rdfs5, rdfs11
    for hierarchy in [rdfs::SUB_PROPERTY_OF, rdfs::SUB_CLASS_OF] {
        for link in graph.triples_for_predicate(hierarchy) {
            let Some(middle) = node(link.object) else {
                continue;
            };
            for upper in graph.objects_for_subject_predicate(middle, hierarchy) {
                inferred.push(Triple::new(
                    link.subject.into_owned(),
                    hierarchy,
                    upper.into_owned(),
                ));
            }
        }
    }

    // rdfs7
    for link in graph.triples_for_predicate(rdfs::SUB_PROPERTY_OF) {
        let (NamedOrBlankNodeRef::NamedNode(sub), TermRef::NamedNode(sup)) =
            (link.subject, link.object)
        else {
            continue;
        };
        for t in graph.triples_for_predicate(sub) {
            inferred.push(Triple::new(t.subject.into_owned(), sup, t.object.into_owned()));
        }
    }

    // rdfs2, rdfs3
    for (schema, on_object) in [(rdfs::DOMAIN, false), (rdfs::RANGE, true)] {
        for declaration in graph.triples_for_predicate(schema) {
            let NamedOrBlankNodeRef::NamedNode(property) = declaration.subject else {
                continue;
            };
            for t in graph.triples_for_predicate(property) {
                let typed = if on_object {
                    node(t.object).map(NamedOrBlankNodeRef::into_owned)
                } else {
                    Some(t.subject.into_owned())
                };
                if let Some(typed) = typed {
                    inferred.push(type_triple(typed, declaration.object.into_owned()));
                }
            }
        }
    }

    // rdfs9
    for link in graph.triples_for_predicate(rdfs::SUB_CLASS_OF) {
        for instance in graph.subjects_for_predicate_object(rdf::TYPE, link.subject) {
            inferred.push(type_triple(instance.into_owned(), link.object.into_owned()));
        }
    }

    inferred
}

fn node(term: TermRef<'_>) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        TermRef::NamedNode(n) => Some(n.into()),
        TermRef::BlankNode(b) => Some(b.into()),
        _ => None,
    }
}

fn type_triple(instance: NamedOrBlankNode, class: Term) -> Triple {
    Triple::new(instance, rdf::TYPE, class)
}
