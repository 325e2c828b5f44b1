//! SHACL Core constraint components.

use super::model::ShapeRef;
use oxrdf::{Literal, NamedNode, NamedNodeRef, Term};

/// One constraint declared on a shape, with its parameters.
#[derive(Debug, Clone)]
pub enum Constraint {
    // Value type
    Class(NamedNode),
    Datatype(NamedNode),
    NodeKind(NamedNode),
    // Cardinality
    MinCount(usize),
    MaxCount(usize),
    // Value range
    MinExclusive(Literal),
    MaxExclusive(Literal),
    MinInclusive(Literal),
    MaxInclusive(Literal),
    // String based
    MinLength(usize),
    MaxLength(usize),
    Pattern {
        pattern: String,
        flags: Option<String>,
    },
    LanguageIn(Vec<String>),
    UniqueLang,
    // Property pairs
    Equals(NamedNode),
    Disjoint(NamedNode),
    LessThan(NamedNode),
    LessThanOrEquals(NamedNode),
    // Logical
    Not(ShapeRef),
    And(Vec<ShapeRef>),
    Or(Vec<ShapeRef>),
    Xone(Vec<ShapeRef>),
    // Shape based
    Node(ShapeRef),
    QualifiedValueShape {
        shape: ShapeRef,
        min_count: Option<usize>,
        max_count: Option<usize>,
    },
    // Other
    Closed {
        ignored_properties: Vec<NamedNode>,
    },
    HasValue(Term),
    In(Vec<Term>),
}

macro_rules! components {
    ($($variant:ident => $local:literal,)*) => {
        /// The kind of a [`Constraint`], as reported in `sh:sourceConstraintComponent`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ConstraintComponent {
            $($variant,)*
        }

        impl ConstraintComponent {
            /// The local name of the component in the SHACL namespace.
            pub fn local_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $local,)*
                }
            }

            pub fn iri(self) -> NamedNodeRef<'static> {
                match self {
                    $(Self::$variant => NamedNodeRef::new_unchecked(
                        concat!("http://www.w3.org/ns/shacl#", $local)
                    ),)*
                }
            }
        }
    };
}

components! {
    Class => "ClassConstraintComponent",
    Datatype => "DatatypeConstraintComponent",
    NodeKind => "NodeKindConstraintComponent",
    MinCount => "MinCountConstraintComponent",
    MaxCount => "MaxCountConstraintComponent",
    MinExclusive => "MinExclusiveConstraintComponent",
    MaxExclusive => "MaxExclusiveConstraintComponent",
    MinInclusive => "MinInclusiveConstraintComponent",
    MaxInclusive => "MaxInclusiveConstraintComponent",
    MinLength => "MinLengthConstraintComponent",
    MaxLength => "MaxLengthConstraintComponent",
    Pattern => "PatternConstraintComponent",
    LanguageIn => "LanguageInConstraintComponent",
    UniqueLang => "UniqueLangConstraintComponent",
    Equals => "EqualsConstraintComponent",
    Disjoint => "DisjointConstraintComponent",
    LessThan => "LessThanConstraintComponent",
    LessThanOrEquals => "LessThanOrEqualsConstraintComponent",
    Not => "NotConstraintComponent",
    And => "AndConstraintComponent",
    Or => "OrConstraintComponent",
    Xone => "XoneConstraintComponent",
    Node => "NodeConstraintComponent",
    QualifiedValueShape => "QualifiedValueShapeConstraintComponent",
    Closed => "ClosedConstraintComponent",
    HasValue => "HasValueConstraintComponent",
    In => "InConstraintComponent",
}

impl From<&Constraint> for ConstraintComponent {
    fn from(constraint: &Constraint) -> Self {
        match constraint {
            Constraint::Class(_) => Self::Class,
            Constraint::Datatype(_) => Self::Datatype,
            Constraint::NodeKind(_) => Self::NodeKind,
            Constraint::MinCount(_) => Self::MinCount,
            Constraint::MaxCount(_) => Self::MaxCount,
            Constraint::MinExclusive(_) => Self::MinExclusive,
            Constraint::MaxExclusive(_) => Self::MaxExclusive,
            Constraint::MinInclusive(_) => Self::MinInclusive,
            Constraint::MaxInclusive(_) => Self::MaxInclusive,
            Constraint::MinLength(_) => Self::MinLength,
            Constraint::MaxLength(_) => Self::MaxLength,
            Constraint::Pattern { .. } => Self::Pattern,
            Constraint::LanguageIn(_) => Self::LanguageIn,
            Constraint::UniqueLang => Self::UniqueLang,
            Constraint::Equals(_) => Self::Equals,
            Constraint::Disjoint(_) => Self::Disjoint,
            Constraint::LessThan(_) => Self::LessThan,
            Constraint::LessThanOrEquals(_) => Self::LessThanOrEquals,
            Constraint::Not(_) => Self::Not,
            Constraint::And(_) => Self::And,
            Constraint::Or(_) => Self::Or,
            Constraint::Xone(_) => Self::Xone,
            Constraint::Node(_) => Self::Node,
            Constraint::QualifiedValueShape { .. } => Self::QualifiedValueShape,
            Constraint::Closed { .. } => Self::Closed,
            Constraint::HasValue(_) => Self::HasValue,
            Constraint::In(_) => Self::In,
        }
    }
}
