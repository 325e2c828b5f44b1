//! Compiled form of a shapes graph.
//!
//! Shapes are discovered from their declarations (`sh:NodeShape`, `sh:PropertyShape`, target
//! predicates, implicit class targets) and from every reference reachable from them
//! (`sh:property`, `sh:node`, `sh:not`, `sh:and`, `sh:or`, `sh:xone`, `sh:qualifiedValueShape`).

use super::constraint::Constraint;
use super::path::PropertyPath;
use super::report::Severity;
use super::terms::{as_subject, list, object, objects, sort_key};
use crate::error::ShapeError;
use crate::vocab::sh;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Graph, Literal, NamedNode, NamedNodeRef, Term, TermRef};
use rustc_hash::FxHashMap;

/// Identifier of a shape: the IRI or blank node it is described by.
pub type ShapeRef = Term;

/// How focus nodes are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Class(NamedNode),
    Node(Term),
    SubjectsOf(NamedNode),
    ObjectsOf(NamedNode),
}

impl Target {
    /// Focus nodes in `graph`, in graph order.
    pub fn focus_nodes(&self, graph: &Graph) -> Vec<Term> {
        match self {
            Self::Class(class) => instances_of(graph, class),
            Self::Node(node) => vec![node.clone()],
            Self::SubjectsOf(predicate) => graph
                .triples_for_predicate(predicate)
                .map(|t| t.subject.into_owned().into())
                .collect(),
            Self::ObjectsOf(predicate) => graph
                .triples_for_predicate(predicate)
                .map(|t| t.object.into_owned())
                .collect(),
        }
    }
}

/// SHACL instances of `class`: typed with it or with one of its transitive subclasses.
pub fn instances_of(graph: &Graph, class: &NamedNode) -> Vec<Term> {
    let mut classes = vec![Term::from(class.clone())];
    let mut i = 0;
    while let Some(current) = classes.get(i).cloned() {
        for sub in graph.subjects_for_predicate_object(rdfs::SUB_CLASS_OF, &current) {
            let sub = Term::from(sub.into_owned());
            if !classes.contains(&sub) {
                classes.push(sub);
            }
        }
        i += 1;
    }
    classes
        .iter()
        .flat_map(|class| graph.subjects_for_predicate_object(rdf::TYPE, class))
        .map(|s| s.into_owned().into())
        .collect()
}

/// A SHACL-AF node expression.
#[derive(Debug, Clone)]
pub enum NodeExpression {
    This,
    Constant(Term),
    Path(PropertyPath),
}

impl NodeExpression {
    fn parse(graph: &Graph, term: Term) -> Result<Self, ShapeError> {
        if matches!(&term, Term::NamedNode(n) if n.as_ref() == sh::THIS) {
            return Ok(Self::This);
        }
        if let Some(path) = object(graph, &term, sh::PATH) {
            return Ok(Self::Path(PropertyPath::parse(graph, &path)?));
        }
        Ok(Self::Constant(term))
    }

    pub fn evaluate(&self, graph: &Graph, focus: &Term) -> Vec<Term> {
        match self {
            Self::This => vec![focus.clone()],
            Self::Constant(term) => vec![term.clone()],
            Self::Path(path) => path.evaluate(graph, focus),
        }
    }
}

/// A `sh:TripleRule`.
#[derive(Debug, Clone)]
pub struct TripleRule {
    pub subject: NodeExpression,
    pub predicate: NamedNode,
    pub object: NodeExpression,
}

#[derive(Debug, Clone)]
pub struct Shape {
    pub id: ShapeRef,
    /// Set for property shapes.
    pub path: Option<PropertyPath>,
    pub targets: Vec<Target>,
    pub constraints: Vec<Constraint>,
    pub property_shapes: Vec<ShapeRef>,
    pub severity: Severity,
    pub deactivated: bool,
    pub message: Option<String>,
    pub rules: Vec<TripleRule>,
}

/// All shapes of a shapes graph, indexed by identifier.
#[derive(Debug, Default)]
pub struct CompiledShapes {
    shapes: FxHashMap<ShapeRef, Shape>,
    /// Shapes with at least one target, sorted.
    targeted: Vec<ShapeRef>,
}

impl CompiledShapes {
    pub fn compile(graph: &Graph) -> Result<Self, ShapeError> {
        let mut pending = Vec::new();
        for class in [sh::NODE_SHAPE, sh::PROPERTY_SHAPE] {
            pending.extend(
                graph
                    .subjects_for_predicate_object(rdf::TYPE, class)
                    .map(|s| Term::from(s.into_owned())),
            );
        }
        for predicate in [
            sh::TARGET_CLASS,
            sh::TARGET_NODE,
            sh::TARGET_SUBJECTS_OF,
            sh::TARGET_OBJECTS_OF,
        ] {
            pending.extend(
                graph
                    .triples_for_predicate(predicate)
                    .map(|t| Term::from(t.subject.into_owned())),
            );
        }

        let mut compiled = Self::default();
        while let Some(id) = pending.pop() {
            if compiled.shapes.contains_key(&id) {
                continue;
            }
            let shape = parse_shape(graph, &id)?;
            pending.extend(references(&shape));
            compiled.shapes.insert(id, shape);
        }
        compiled.targeted = compiled
            .shapes
            .values()
            .filter(|s| !s.targets.is_empty())
            .map(|s| s.id.clone())
            .collect();
        compiled.targeted.sort_by_cached_key(sort_key);
        Ok(compiled)
    }

    pub fn get(&self, id: &ShapeRef) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Shapes that select their own focus nodes, in a stable order.
    pub fn targeted(&self) -> impl Iterator<Item = &Shape> {
        self.targeted.iter().filter_map(|id| self.shapes.get(id))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

fn references(shape: &Shape) -> Vec<ShapeRef> {
    let mut refs = shape.property_shapes.clone();
    for constraint in &shape.constraints {
        match constraint {
            Constraint::Not(r) | Constraint::Node(r) => refs.push(r.clone()),
            Constraint::QualifiedValueShape { shape, .. } => refs.push(shape.clone()),
            Constraint::And(rs) | Constraint::Or(rs) | Constraint::Xone(rs) => {
                refs.extend(rs.iter().cloned());
            }
            _ => (),
        }
    }
    refs
}

fn parse_shape(graph: &Graph, id: &Term) -> Result<Shape, ShapeError> {
    let path = object(graph, id, sh::PATH)
        .map(|p| PropertyPath::parse(graph, &p))
        .transpose()?;
    let mut shape = Shape {
        id: id.clone(),
        path,
        targets: parse_targets(graph, id),
        constraints: parse_constraints(graph, id)?,
        property_shapes: objects(graph, id, sh::PROPERTY)
            .into_iter()
            .map(shape_ref)
            .collect::<Result<_, _>>()?,
        severity: match object(graph, id, sh::SEVERITY) {
            Some(Term::NamedNode(iri)) => Severity::from_iri(iri.as_ref()),
            _ => Severity::Violation,
        },
        deactivated: boolean(graph, id, sh::DEACTIVATED).unwrap_or(false),
        message: string(graph, id, sh::MESSAGE),
        rules: parse_rules(graph, id)?,
    };
    // A shape that is also a class targets its own instances.
    if let Term::NamedNode(class) = id {
        let is_class = as_subject(id).is_some_and(|s| {
            graph
                .objects_for_subject_predicate(s, rdf::TYPE)
                .any(|t| t == TermRef::from(rdfs::CLASS))
        });
        if is_class && shape.path.is_none() {
            shape.targets.push(Target::Class(class.clone()));
        }
    }
    Ok(shape)
}

fn parse_targets(graph: &Graph, id: &Term) -> Vec<Target> {
    let mut targets = Vec::new();
    for (predicate, build) in [
        (sh::TARGET_CLASS, Target::Class as fn(NamedNode) -> Target),
        (sh::TARGET_SUBJECTS_OF, Target::SubjectsOf),
        (sh::TARGET_OBJECTS_OF, Target::ObjectsOf),
    ] {
        targets.extend(objects(graph, id, predicate).into_iter().filter_map(|t| match t {
            Term::NamedNode(n) => Some(build(n)),
            _ => None,
        }));
    }
    targets.extend(
        objects(graph, id, sh::TARGET_NODE)
            .into_iter()
            .map(Target::Node),
    );
    targets
}

fn parse_constraints(graph: &Graph, id: &Term) -> Result<Vec<Constraint>, ShapeError> {
    let mut constraints = Vec::new();

    for (predicate, build) in [
        (sh::CLASS, Constraint::Class as fn(NamedNode) -> Constraint),
        (sh::EQUALS, Constraint::Equals),
        (sh::DISJOINT, Constraint::Disjoint),
        (sh::LESS_THAN, Constraint::LessThan),
        (sh::LESS_THAN_OR_EQUALS, Constraint::LessThanOrEquals),
    ] {
        for value in objects(graph, id, predicate) {
            constraints.push(build(named(id, predicate, value)?));
        }
    }
    for (predicate, build) in [
        (sh::DATATYPE, Constraint::Datatype as fn(NamedNode) -> Constraint),
        (sh::NODE_KIND, Constraint::NodeKind),
    ] {
        if let Some(value) = object(graph, id, predicate) {
            constraints.push(build(named(id, predicate, value)?));
        }
    }
    for (predicate, build) in [
        (sh::MIN_COUNT, Constraint::MinCount as fn(usize) -> Constraint),
        (sh::MAX_COUNT, Constraint::MaxCount),
        (sh::MIN_LENGTH, Constraint::MinLength),
        (sh::MAX_LENGTH, Constraint::MaxLength),
    ] {
        if let Some(n) = count(graph, id, predicate)? {
            constraints.push(build(n));
        }
    }
    for (predicate, build) in [
        (sh::MIN_EXCLUSIVE, Constraint::MinExclusive as fn(Literal) -> Constraint),
        (sh::MAX_EXCLUSIVE, Constraint::MaxExclusive),
        (sh::MIN_INCLUSIVE, Constraint::MinInclusive),
        (sh::MAX_INCLUSIVE, Constraint::MaxInclusive),
    ] {
        if let Some(Term::Literal(bound)) = object(graph, id, predicate) {
            constraints.push(build(bound));
        }
    }

    if let Some(pattern) = string(graph, id, sh::PATTERN) {
        constraints.push(Constraint::Pattern {
            pattern,
            flags: string(graph, id, sh::FLAGS),
        });
    }
    if let Some(head) = object(graph, id, sh::LANGUAGE_IN) {
        let languages = list(graph, head, id)?
            .into_iter()
            .filter_map(|t| match t {
                Term::Literal(l) => Some(l.value().to_ascii_lowercase()),
                _ => None,
            })
            .collect();
        constraints.push(Constraint::LanguageIn(languages));
    }
    if boolean(graph, id, sh::UNIQUE_LANG) == Some(true) {
        constraints.push(Constraint::UniqueLang);
    }

    for value in objects(graph, id, sh::NOT) {
        constraints.push(Constraint::Not(shape_ref(value)?));
    }
    for value in objects(graph, id, sh::NODE) {
        constraints.push(Constraint::Node(shape_ref(value)?));
    }
    for (predicate, build) in [
        (sh::AND, Constraint::And as fn(Vec<ShapeRef>) -> Constraint),
        (sh::OR, Constraint::Or),
        (sh::XONE, Constraint::Xone),
    ] {
        for head in objects(graph, id, predicate) {
            let members = list(graph, head, id)?
                .into_iter()
                .map(shape_ref)
                .collect::<Result<_, _>>()?;
            constraints.push(build(members));
        }
    }
    if let Some(qualified) = object(graph, id, sh::QUALIFIED_VALUE_SHAPE) {
        constraints.push(Constraint::QualifiedValueShape {
            shape: shape_ref(qualified)?,
            min_count: count(graph, id, sh::QUALIFIED_MIN_COUNT)?,
            max_count: count(graph, id, sh::QUALIFIED_MAX_COUNT)?,
        });
    }

    for value in objects(graph, id, sh::HAS_VALUE) {
        constraints.push(Constraint::HasValue(value));
    }
    if let Some(head) = object(graph, id, sh::IN) {
        constraints.push(Constraint::In(list(graph, head, id)?));
    }
    if boolean(graph, id, sh::CLOSED) == Some(true) {
        let ignored_properties = match object(graph, id, sh::IGNORED_PROPERTIES) {
            Some(head) => list(graph, head, id)?
                .into_iter()
                .filter_map(|t| match t {
                    Term::NamedNode(n) => Some(n),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        };
        constraints.push(Constraint::Closed { ignored_properties });
    }

    Ok(constraints)
}

fn parse_rules(graph: &Graph, id: &Term) -> Result<Vec<TripleRule>, ShapeError> {
    let mut rules = Vec::new();
    for rule in objects(graph, id, sh::RULE) {
        let is_triple_rule = objects(graph, &rule, rdf::TYPE)
            .iter()
            .any(|t| matches!(t, Term::NamedNode(n) if n.as_ref() == sh::TRIPLE_RULE));
        if !is_triple_rule {
            continue;
        }
        let (Some(subject), Some(predicate), Some(object_expr)) = (
            object(graph, &rule, sh::SUBJECT),
            object(graph, &rule, sh::PREDICATE),
            object(graph, &rule, sh::OBJECT),
        ) else {
            return Err(ShapeError::InvalidParameter {
                shape: id.clone(),
                property: "sh:rule",
                message: "a sh:TripleRule needs sh:subject, sh:predicate and sh:object".into(),
            });
        };
        rules.push(TripleRule {
            subject: NodeExpression::parse(graph, subject)?,
            predicate: named(id, sh::PREDICATE, predicate)?,
            object: NodeExpression::parse(graph, object_expr)?,
        });
    }
    Ok(rules)
}

fn shape_ref(term: Term) -> Result<ShapeRef, ShapeError> {
    match term {
        Term::NamedNode(_) | Term::BlankNode(_) => Ok(term),
        _ => Err(ShapeError::InvalidShapeReference(term)),
    }
}

fn named(id: &Term, predicate: NamedNodeRef<'static>, value: Term) -> Result<NamedNode, ShapeError> {
    match value {
        Term::NamedNode(n) => Ok(n),
        other => Err(ShapeError::InvalidParameter {
            shape: id.clone(),
            property: predicate.as_str(),
            message: format!("expected an IRI, found {other}"),
        }),
    }
}

fn count(
    graph: &Graph,
    id: &Term,
    predicate: NamedNodeRef<'static>,
) -> Result<Option<usize>, ShapeError> {
    let Some(value) = object(graph, id, predicate) else {
        return Ok(None);
    };
    match &value {
        Term::Literal(l) => l.value().parse().map(Some).map_err(|_| ()),
        _ => Err(()),
    }
    .map_err(|()| ShapeError::InvalidParameter {
        shape: id.clone(),
        property: predicate.as_str(),
        message: format!("expected a non-negative integer, found {value}"),
    })
}

fn string(graph: &Graph, id: &Term, predicate: NamedNodeRef<'_>) -> Option<String> {
    match object(graph, id, predicate)? {
        Term::Literal(l) => Some(l.value().to_owned()),
        _ => None,
    }
}

fn boolean(graph: &Graph, id: &Term, predicate: NamedNodeRef<'_>) -> Option<bool> {
    match object(graph, id, predicate)? {
        Term::Literal(l) => match l.value() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdfio::{RdfFormat, RdfParser};

    fn shapes(ttl: &str) -> Result<CompiledShapes, ShapeError> {
        let mut graph = Graph::new();
        for quad in RdfParser::from_format(RdfFormat::Turtle).for_reader(ttl.as_bytes()) {
            graph.insert(quad.unwrap().as_ref());
        }
        CompiledShapes::compile(&graph)
    }

    #[test]
    fn collects_nested_and_referenced_shapes() {
        let compiled = shapes(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix ex: <http://example.com/> .
            ex:ConceptShape a sh:NodeShape ;
                sh:targetClass ex:Concept ;
                sh:property [ sh:path ex:label ; sh:minCount 1 ; sh:node ex:LabelShape ] .
            ex:LabelShape sh:nodeKind sh:Literal .
            "#,
        )
        .unwrap();
        assert_eq!(compiled.len(), 3);
        assert_eq!(compiled.targeted().count(), 1);
        assert!(compiled
            .get(&NamedNode::new_unchecked("http://example.com/LabelShape").into())
            .is_some());
    }

    #[test]
    fn class_shapes_target_their_instances() {
        let compiled = shapes(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
            @prefix ex: <http://example.com/> .
            ex:Concept a rdfs:Class, sh:NodeShape ; sh:closed true .
            "#,
        )
        .unwrap();
        let shape = compiled.targeted().next().unwrap();
        assert_eq!(
            shape.targets,
            vec![Target::Class(NamedNode::new_unchecked(
                "http://example.com/Concept"
            ))]
        );
    }

    #[test]
    fn rejects_negative_counts() {
        let error = shapes(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix ex: <http://example.com/> .
            ex:S sh:targetNode ex:a ; sh:property [ sh:path ex:p ; sh:minCount -1 ] .
            "#,
        )
        .unwrap_err();
        assert!(matches!(error, ShapeError::InvalidParameter { .. }));
    }
}
