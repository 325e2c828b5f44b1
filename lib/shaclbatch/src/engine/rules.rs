//! `sh:TripleRule` execution.
//!
//! Rules of every active targeted shape are applied to that shape's focus nodes until no new
//! triple is produced. Focus nodes are recomputed each round so inferred types can bring new
//! nodes into scope.

use super::inference::MAX_ITERATIONS;
use super::model::{CompiledShapes, TripleRule};
use super::terms::as_subject;
use crate::error::EngineError;
use oxrdf::{Graph, Term, Triple};

/// Applies the rules of `shapes` to `graph` and returns the number of inferred triples.
pub fn apply_rules(shapes: &CompiledShapes, graph: &mut Graph) -> Result<usize, EngineError> {
    let initial = graph.len();
    for _ in 0..MAX_ITERATIONS {
        let mut fresh = Vec::new();
        for shape in shapes.targeted() {
            if shape.deactivated || shape.rules.is_empty() {
                continue;
            }
            let focus_nodes = shape
                .targets
                .iter()
                .flat_map(|target| target.focus_nodes(graph))
                .collect::<Vec<_>>();
            for rule in &shape.rules {
                for focus in &focus_nodes {
                    fresh.extend(
                        produce(rule, graph, focus)
                            .into_iter()
                            .filter(|t| !graph.contains(t)),
                    );
                }
            }
        }
        if fresh.is_empty() {
            return Ok(graph.len() - initial);
        }
        for triple in &fresh {
            graph.insert(triple);
        }
    }
    Err(EngineError::InferenceLimit(MAX_ITERATIONS))
}

fn produce(rule: &TripleRule, graph: &Graph, focus: &Term) -> Vec<Triple> {
    let objects = rule.object.evaluate(graph, focus);
    let mut triples = Vec::new();
    for subject in rule.subject.evaluate(graph, focus) {
        // Literals cannot be subjects.
        let Some(subject) = as_subject(&subject).map(|s| s.into_owned()) else {
            continue;
        };
        for object in &objects {
            triples.push(Triple::new(
                subject.clone(),
                rule.predicate.clone(),
                object.clone(),
            ));
        }
    }
    triples
}
