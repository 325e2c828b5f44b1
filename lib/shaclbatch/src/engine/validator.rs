//! SHACL Core validation of a data graph against compiled shapes.

use super::constraint::{Constraint, ConstraintComponent};
use super::datatype::is_well_typed;
use super::model::{CompiledShapes, Shape, ShapeRef};
use super::report::{Severity, ValidationReport, ValidationResult};
use super::terms::{as_subject, objects, sort_key};
use crate::error::EngineError;
use crate::vocab::sh;
use oxrdf::vocab::{rdf, rdfs, xsd};
use oxrdf::{Graph, Literal, NamedNode, NamedNodeRef, Term, TermRef};
use regex::{Regex, RegexBuilder};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::hash_map::Entry;

/// Maximum nesting of shape references followed while validating one focus node.
pub const MAX_RECURSION_DEPTH: usize = 50;

/// Validates `data` against every targeted shape of `shapes`.
pub fn validate(shapes: &CompiledShapes, data: &Graph) -> Result<ValidationReport, EngineError> {
    let mut validator = Validator {
        shapes,
        data,
        regexes: FxHashMap::default(),
    };
    let mut report = ValidationReport::default();
    for shape in shapes.targeted() {
        if shape.deactivated {
            continue;
        }
        let mut focus_nodes = shape
            .targets
            .iter()
            .flat_map(|target| target.focus_nodes(data))
            .collect::<Vec<_>>();
        focus_nodes.sort_by_cached_key(sort_key);
        focus_nodes.dedup();
        for focus in &focus_nodes {
            validator.validate_shape(&mut report, shape, focus, 0)?;
        }
    }
    Ok(report)
}

struct Validator<'a> {
    shapes: &'a CompiledShapes,
    data: &'a Graph,
    regexes: FxHashMap<(String, Option<String>), Regex>,
}

/// Where a constraint is being checked.
struct Scope<'s> {
    shape: &'s Shape,
    focus: &'s Term,
    severity: Severity,
}

impl Scope<'_> {
    /// `focus` or `focus->path`, for messages.
    fn location(&self) -> String {
        match &self.shape.path {
            Some(path) => format!("{}->{path}", self.focus),
            None => self.focus.to_string(),
        }
    }

    fn emit(
        &self,
        report: &mut ValidationReport,
        component: ConstraintComponent,
        value: Option<&Term>,
        message: String,
    ) {
        report.add(ValidationResult {
            focus_node: self.focus.clone(),
            path: self.shape.path.clone(),
            value: value.cloned(),
            source_shape: self.shape.id.clone(),
            component,
            message: self.shape.message.clone().unwrap_or(message),
            severity: self.severity,
        });
    }
}

impl<'a> Validator<'a> {
    fn validate_shape(
        &mut self,
        report: &mut ValidationReport,
        shape: &'a Shape,
        focus: &Term,
        depth: usize,
    ) -> Result<(), EngineError> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(EngineError::RecursionLimit(MAX_RECURSION_DEPTH));
        }
        if shape.deactivated {
            return Ok(());
        }
        let values = match &shape.path {
            Some(path) => sorted(path.evaluate(self.data, focus)),
            None => vec![focus.clone()],
        };
        let scope = Scope {
            shape,
            focus,
            severity: shape.severity,
        };
        for constraint in &shape.constraints {
            self.check(report, &scope, &values, constraint, depth)?;
        }

        let shapes = self.shapes;
        for property in &shape.property_shapes {
            let Some(property) = shapes.get(property) else {
                continue;
            };
            for value in &values {
                self.validate_shape(report, property, value, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Whether `node` produces no result at all against the shape `id`.
    ///
    /// Unknown shapes accept every node.
    fn conforms_to(&mut self, node: &Term, id: &ShapeRef, depth: usize) -> Result<bool, EngineError> {
        let shapes = self.shapes;
        let Some(shape) = shapes.get(id) else {
            return Ok(true);
        };
        let mut nested = ValidationReport::default();
        self.validate_shape(&mut nested, shape, node, depth + 1)?;
        Ok(nested.is_empty())
    }

    fn count_conforming(
        &mut self,
        values: &[Term],
        id: &ShapeRef,
        depth: usize,
    ) -> Result<usize, EngineError> {
        let mut count = 0;
        for value in values {
            if self.conforms_to(value, id, depth)? {
                count += 1;
            }
        }
        Ok(count)
    }

    fn check(
        &mut self,
        report: &mut ValidationReport,
        scope: &Scope<'_>,
        values: &[Term],
        constraint: &Constraint,
        depth: usize,
    ) -> Result<(), EngineError> {
        let component = ConstraintComponent::from(constraint);
        let data = self.data;
        match constraint {
            Constraint::MinCount(min) => {
                if values.len() < *min {
                    scope.emit(
                        report,
                        component,
                        None,
                        format!("Less than {min} values on {}", scope.location()),
                    );
                }
            }
            Constraint::MaxCount(max) => {
                if values.len() > *max {
                    scope.emit(
                        report,
                        component,
                        None,
                        format!("More than {max} values on {}", scope.location()),
                    );
                }
            }
            Constraint::Class(class) => {
                for value in values {
                    if !is_instance_of(data, value, class) {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("Value does not have class {class}"),
                        );
                    }
                }
            }
            Constraint::Datatype(datatype) => {
                for value in values {
                    if !matches!(value, Term::Literal(l) if l.datatype() == datatype.as_ref() && is_well_typed(l)) {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("Value is not Literal with datatype {datatype}"),
                        );
                    }
                }
            }
            Constraint::NodeKind(kind) => {
                for value in values {
                    if !has_node_kind(value, kind.as_ref()) {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("Value is not of Node Kind {kind}"),
                        );
                    }
                }
            }
            Constraint::MinExclusive(bound)
            | Constraint::MaxExclusive(bound)
            | Constraint::MinInclusive(bound)
            | Constraint::MaxInclusive(bound) => {
                let (accepted, operator): (fn(Ordering) -> bool, _) = match constraint {
                    Constraint::MinExclusive(_) => (Ordering::is_gt, ">"),
                    Constraint::MaxExclusive(_) => (Ordering::is_lt, "<"),
                    Constraint::MinInclusive(_) => (Ordering::is_ge, ">="),
                    _ => (Ordering::is_le, "<="),
                };
                let bound = Term::Literal(bound.clone());
                for value in values {
                    if !compare(value, &bound).is_some_and(accepted) {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("Value is not {operator} {bound}"),
                        );
                    }
                }
            }
            Constraint::MinLength(min) => {
                for value in values {
                    if !lexical_form(value).is_some_and(|s| s.chars().count() >= *min) {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("String length not >= {min}"),
                        );
                    }
                }
            }
            Constraint::MaxLength(max) => {
                for value in values {
                    if !lexical_form(value).is_some_and(|s| s.chars().count() <= *max) {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("String length not <= {max}"),
                        );
                    }
                }
            }
            Constraint::Pattern { pattern, flags } => {
                let regex = self.regex(pattern, flags.as_deref())?;
                for value in values {
                    if !lexical_form(value).is_some_and(|s| regex.is_match(s)) {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("Value does not match pattern \"{pattern}\""),
                        );
                    }
                }
            }
            Constraint::LanguageIn(languages) => {
                for value in values {
                    let accepted = match value {
                        Term::Literal(l) => l
                            .language()
                            .is_some_and(|tag| languages.iter().any(|range| matches_language(tag, range))),
                        _ => false,
                    };
                    if !accepted {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("String language is not in {languages:?}"),
                        );
                    }
                }
            }
            Constraint::UniqueLang => {
                let mut tags = BTreeMap::<String, usize>::new();
                for value in values {
                    if let Term::Literal(l) = value {
                        if let Some(tag) = l.language() {
                            *tags.entry(tag.to_ascii_lowercase()).or_default() += 1;
                        }
                    }
                }
                for (tag, _) in tags.into_iter().filter(|(_, n)| *n > 1) {
                    scope.emit(
                        report,
                        component,
                        None,
                        format!(
                            "More than one String shares the same Language \"{tag}\" on {}",
                            scope.location()
                        ),
                    );
                }
            }
            Constraint::Equals(property) => {
                let others = sorted(objects(data, scope.focus, property.as_ref()));
                for value in values.iter().filter(|v| !others.contains(v)) {
                    scope.emit(
                        report,
                        component,
                        Some(value),
                        format!("Value of {} is missing from {property}", scope.location()),
                    );
                }
                for other in others.iter().filter(|o| !values.contains(o)) {
                    scope.emit(
                        report,
                        component,
                        Some(other),
                        format!("Value of {property} is missing from {}", scope.location()),
                    );
                }
            }
            Constraint::Disjoint(property) => {
                let others = sorted(objects(data, scope.focus, property.as_ref()));
                for value in values.iter().filter(|v| others.contains(v)) {
                    scope.emit(
                        report,
                        component,
                        Some(value),
                        format!("Value of {} is also a value of {property}", scope.location()),
                    );
                }
            }
            Constraint::LessThan(property) | Constraint::LessThanOrEquals(property) => {
                let (accepted, operator): (fn(Ordering) -> bool, _) =
                    if matches!(constraint, Constraint::LessThan(_)) {
                        (Ordering::is_lt, "<")
                    } else {
                        (Ordering::is_le, "<=")
                    };
                let others = sorted(objects(data, scope.focus, property.as_ref()));
                for value in values {
                    for other in &others {
                        if !compare(value, other).is_some_and(accepted) {
                            scope.emit(
                                report,
                                component,
                                Some(value),
                                format!("Value is not {operator} {other} ({property})"),
                            );
                        }
                    }
                }
            }
            Constraint::Not(id) => {
                for value in values {
                    if self.conforms_to(value, id, depth)? {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("Value conforms to negated shape {id}"),
                        );
                    }
                }
            }
            Constraint::And(ids) => {
                for value in values {
                    let mut all = true;
                    for id in ids {
                        if !self.conforms_to(value, id, depth)? {
                            all = false;
                            break;
                        }
                    }
                    if !all {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            "Value does not conform to every shape in sh:and".into(),
                        );
                    }
                }
            }
            Constraint::Or(ids) | Constraint::Xone(ids) => {
                let exclusive = matches!(constraint, Constraint::Xone(_));
                for value in values {
                    let mut conforming = 0;
                    for id in ids {
                        if self.conforms_to(value, id, depth)? {
                            conforming += 1;
                        }
                    }
                    if exclusive && conforming != 1 {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("Value conforms to {conforming} shapes in sh:xone, expected exactly 1"),
                        );
                    } else if !exclusive && conforming == 0 {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            "Value does not conform to any shape in sh:or".into(),
                        );
                    }
                }
            }
            Constraint::Node(id) => {
                for value in values {
                    if !self.conforms_to(value, id, depth)? {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("Value does not conform to Shape {id}"),
                        );
                    }
                }
            }
            Constraint::QualifiedValueShape {
                shape,
                min_count,
                max_count,
            } => {
                let conforming = self.count_conforming(values, shape, depth)?;
                if let Some(min) = min_count.filter(|min| conforming < *min) {
                    scope.emit(
                        report,
                        component,
                        None,
                        format!(
                            "Less than {min} values on {} conform to {shape}",
                            scope.location()
                        ),
                    );
                }
                if let Some(max) = max_count.filter(|max| conforming > *max) {
                    scope.emit(
                        report,
                        component,
                        None,
                        format!(
                            "More than {max} values on {} conform to {shape}",
                            scope.location()
                        ),
                    );
                }
            }
            Constraint::Closed { ignored_properties } => {
                let shapes = self.shapes;
                let allowed = scope
                    .shape
                    .property_shapes
                    .iter()
                    .filter_map(|id| shapes.get(id)?.path.as_ref()?.as_predicate())
                    .chain(ignored_properties)
                    .map(NamedNode::as_ref)
                    .collect::<FxHashSet<_>>();
                for value in values {
                    let Some(subject) = as_subject(value) else {
                        continue;
                    };
                    let mut unexpected = data
                        .triples_for_subject(subject)
                        .filter(|t| !allowed.contains(&t.predicate))
                        .map(|t| (t.predicate.into_owned(), t.object.into_owned()))
                        .collect::<Vec<_>>();
                    unexpected.sort_by_cached_key(|(p, o)| (p.to_string(), sort_key(o)));
                    for (predicate, object) in &unexpected {
                        scope.emit(
                            report,
                            component,
                            Some(object),
                            format!(
                                "Node {value} is closed. It cannot have value: {object} on {predicate}"
                            ),
                        );
                    }
                }
            }
            Constraint::HasValue(expected) => {
                if !values.contains(expected) {
                    scope.emit(
                        report,
                        component,
                        None,
                        format!("Value {expected} is missing from {}", scope.location()),
                    );
                }
            }
            Constraint::In(allowed) => {
                for value in values {
                    if !allowed.contains(value) {
                        scope.emit(
                            report,
                            component,
                            Some(value),
                            format!("Value {value} not in list {}", format_list(allowed)),
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn regex(&mut self, pattern: &str, flags: Option<&str>) -> Result<&Regex, EngineError> {
        match self
            .regexes
            .entry((pattern.to_owned(), flags.map(str::to_owned)))
        {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(compile_pattern(pattern, flags)?)),
        }
    }
}

/// Compiles an XPath-style pattern. Supported flags are `i`, `m`, `s`, `x` and `q`.
fn compile_pattern(pattern: &str, flags: Option<&str>) -> Result<Regex, EngineError> {
    let flags = flags.unwrap_or_default();
    let source = if flags.contains('q') {
        regex::escape(pattern)
    } else {
        pattern.to_owned()
    };
    RegexBuilder::new(&source)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build()
        .map_err(|e| EngineError::InvalidPattern {
            pattern: pattern.to_owned(),
            message: e.to_string(),
        })
}

/// SHACL instance check: a type of `value` is `class` or one of its transitive subclasses.
fn is_instance_of(graph: &Graph, value: &Term, class: &NamedNode) -> bool {
    let Some(subject) = as_subject(value) else {
        return false;
    };
    let mut pending = graph
        .objects_for_subject_predicate(subject, rdf::TYPE)
        .collect::<Vec<_>>();
    let mut seen = FxHashSet::default();
    while let Some(current) = pending.pop() {
        if current == TermRef::from(class.as_ref()) {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let TermRef::NamedNode(n) = current {
            pending.extend(graph.objects_for_subject_predicate(n, rdfs::SUB_CLASS_OF));
        } else if let TermRef::BlankNode(b) = current {
            pending.extend(graph.objects_for_subject_predicate(b, rdfs::SUB_CLASS_OF));
        }
    }
    false
}

/// Results follow value order, so it must not depend on graph internals.
fn sorted(mut terms: Vec<Term>) -> Vec<Term> {
    terms.sort_by_cached_key(sort_key);
    terms
}

fn has_node_kind(value: &Term, kind: NamedNodeRef<'_>) -> bool {
    let (iri, blank, literal) = (
        matches!(value, Term::NamedNode(_)),
        matches!(value, Term::BlankNode(_)),
        matches!(value, Term::Literal(_)),
    );
    if kind == sh::IRI {
        iri
    } else if kind == sh::BLANK_NODE {
        blank
    } else if kind == sh::LITERAL {
        literal
    } else if kind == sh::BLANK_NODE_OR_IRI {
        blank || iri
    } else if kind == sh::BLANK_NODE_OR_LITERAL {
        blank || literal
    } else if kind == sh::IRI_OR_LITERAL {
        iri || literal
    } else {
        false
    }
}

/// The string a pattern or length constraint applies to. Blank nodes have none.
fn lexical_form(value: &Term) -> Option<&str> {
    match value {
        Term::NamedNode(n) => Some(n.as_str()),
        Term::Literal(l) => Some(l.value()),
        _ => None,
    }
}

/// Basic language range matching: `*`, an exact tag or a tag prefix ending at a subtag.
fn matches_language(tag: &str, range: &str) -> bool {
    let tag = tag.to_ascii_lowercase();
    range == "*"
        || tag == range
        || tag
            .strip_prefix(range)
            .is_some_and(|rest| rest.starts_with('-'))
}

fn is_numeric(datatype: NamedNodeRef<'_>) -> bool {
    [
        xsd::INTEGER,
        xsd::DECIMAL,
        xsd::DOUBLE,
        xsd::FLOAT,
        xsd::INT,
        xsd::LONG,
        xsd::SHORT,
        xsd::BYTE,
        xsd::NON_NEGATIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
        xsd::POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::UNSIGNED_LONG,
        xsd::UNSIGNED_INT,
        xsd::UNSIGNED_SHORT,
        xsd::UNSIGNED_BYTE,
    ]
    .contains(&datatype)
}

/// Orders two literals. Numbers compare by value, other literals only against literals of the
/// same datatype and language, by lexical form. Anything else is incomparable.
fn compare(a: &Term, b: &Term) -> Option<Ordering> {
    let (Term::Literal(a), Term::Literal(b)) = (a, b) else {
        return None;
    };
    if is_numeric(a.datatype()) && is_numeric(b.datatype()) {
        return number(a)?.partial_cmp(&number(b)?);
    }
    (a.datatype() == b.datatype() && a.language() == b.language()).then(|| a.value().cmp(b.value()))
}

fn number(literal: &Literal) -> Option<f64> {
    literal.value().trim().parse().ok()
}

fn format_list(terms: &[Term]) -> String {
    let items = terms.iter().map(Term::to_string).collect::<Vec<_>>();
    format!("({})", items.join(", "))
}
