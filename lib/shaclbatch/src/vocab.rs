//! [`NamedNodeRef`]s for the SHACL vocabulary terms the engine reads and writes.

pub mod sh {
    //! [SHACL](https://www.w3.org/TR/shacl/) vocabulary.
    use oxrdf::NamedNodeRef;

    pub const NAMESPACE: &str = "http://www.w3.org/ns/shacl#";

    macro_rules! terms {
        ($($name:ident = $local:literal;)*) => {
            $(
                pub const $name: NamedNodeRef<'_> =
                    NamedNodeRef::new_unchecked(concat!("http://www.w3.org/ns/shacl#", $local));
            )*
        };
    }

    // Shapes and targets
    terms! {
        SHAPE = "Shape";
        NODE_SHAPE = "NodeShape";
        PROPERTY_SHAPE = "PropertyShape";
        TARGET_CLASS = "targetClass";
        TARGET_NODE = "targetNode";
        TARGET_SUBJECTS_OF = "targetSubjectsOf";
        TARGET_OBJECTS_OF = "targetObjectsOf";
        PROPERTY = "property";
        PATH = "path";
        DEACTIVATED = "deactivated";
        SEVERITY = "severity";
        MESSAGE = "message";
    }

    // Paths
    terms! {
        ALTERNATIVE_PATH = "alternativePath";
        INVERSE_PATH = "inversePath";
        ZERO_OR_MORE_PATH = "zeroOrMorePath";
        ONE_OR_MORE_PATH = "oneOrMorePath";
        ZERO_OR_ONE_PATH = "zeroOrOnePath";
    }

    // Constraint parameters
    terms! {
        CLASS = "class";
        DATATYPE = "datatype";
        NODE_KIND = "nodeKind";
        MIN_COUNT = "minCount";
        MAX_COUNT = "maxCount";
        MIN_EXCLUSIVE = "minExclusive";
        MAX_EXCLUSIVE = "maxExclusive";
        MIN_INCLUSIVE = "minInclusive";
        MAX_INCLUSIVE = "maxInclusive";
        MIN_LENGTH = "minLength";
        MAX_LENGTH = "maxLength";
        PATTERN = "pattern";
        FLAGS = "flags";
        LANGUAGE_IN = "languageIn";
        UNIQUE_LANG = "uniqueLang";
        EQUALS = "equals";
        DISJOINT = "disjoint";
        LESS_THAN = "lessThan";
        LESS_THAN_OR_EQUALS = "lessThanOrEquals";
        NOT = "not";
        AND = "and";
        OR = "or";
        XONE = "xone";
        NODE = "node";
        HAS_VALUE = "hasValue";
        IN = "in";
        CLOSED = "closed";
        IGNORED_PROPERTIES = "ignoredProperties";
        QUALIFIED_VALUE_SHAPE = "qualifiedValueShape";
        QUALIFIED_MIN_COUNT = "qualifiedMinCount";
        QUALIFIED_MAX_COUNT = "qualifiedMaxCount";
    }

    // Node kinds
    terms! {
        IRI = "IRI";
        LITERAL = "Literal";
        BLANK_NODE = "BlankNode";
        BLANK_NODE_OR_IRI = "BlankNodeOrIRI";
        BLANK_NODE_OR_LITERAL = "BlankNodeOrLiteral";
        IRI_OR_LITERAL = "IRIOrLiteral";
    }

    // Severities
    terms! {
        VIOLATION = "Violation";
        WARNING = "Warning";
        INFO = "Info";
    }

    // Validation report
    terms! {
        VALIDATION_REPORT = "ValidationReport";
        VALIDATION_RESULT = "ValidationResult";
        CONFORMS = "conforms";
        RESULT = "result";
        FOCUS_NODE = "focusNode";
        RESULT_PATH = "resultPath";
        VALUE = "value";
        SOURCE_SHAPE = "sourceShape";
        SOURCE_CONSTRAINT_COMPONENT = "sourceConstraintComponent";
        RESULT_MESSAGE = "resultMessage";
        RESULT_SEVERITY = "resultSeverity";
    }

    // Advanced features (SHACL-AF rules)
    terms! {
        RULE = "rule";
        TRIPLE_RULE = "TripleRule";
        SUBJECT = "subject";
        PREDICATE = "predicate";
        OBJECT = "object";
        THIS = "this";
    }
}
