//! Lexical validity of literals of the XSD datatypes.

use oxrdf::Literal;
use oxrdf::vocab::xsd;
use oxsdatatypes::{
    Boolean, Date, DateTime, DayTimeDuration, Decimal, Double, Duration, Float, GDay, GMonth,
    GMonthDay, GYear, GYearMonth, Time, YearMonthDuration,
};
use std::str::FromStr;

/// Whether the lexical form of `literal` is valid for its datatype.
///
/// Datatypes outside of XSD, and XSD string types, accept every lexical form.
pub fn is_well_typed(literal: &Literal) -> bool {
    let datatype = literal.datatype();
    let value = literal.value();
    if let Some((min, max)) = integer_range(datatype.as_str()) {
        return value
            .parse::<i128>()
            .is_ok_and(|n| (min..=max).contains(&n));
    }
    let check: fn(&str) -> bool = if datatype == xsd::BOOLEAN {
        parses::<Boolean>
    } else if datatype == xsd::DECIMAL {
        parses::<Decimal>
    } else if datatype == xsd::DOUBLE {
        parses::<Double>
    } else if datatype == xsd::FLOAT {
        parses::<Float>
    } else if datatype == xsd::DATE_TIME || datatype == xsd::DATE_TIME_STAMP {
        parses::<DateTime>
    } else if datatype == xsd::DATE {
        parses::<Date>
    } else if datatype == xsd::TIME {
        parses::<Time>
    } else if datatype == xsd::G_YEAR {
        parses::<GYear>
    } else if datatype == xsd::G_YEAR_MONTH {
        parses::<GYearMonth>
    } else if datatype == xsd::G_MONTH {
        parses::<GMonth>
    } else if datatype == xsd::G_MONTH_DAY {
        parses::<GMonthDay>
    } else if datatype == xsd::G_DAY {
        parses::<GDay>
    } else if datatype == xsd::DURATION {
        parses::<Duration>
    } else if datatype == xsd::YEAR_MONTH_DURATION {
        parses::<YearMonthDuration>
    } else if datatype == xsd::DAY_TIME_DURATION {
        parses::<DayTimeDuration>
    } else {
        return true;
    };
    // The XSD types also reject surrounding whitespace in RDF lexical forms.
    value.trim() == value && check(value)
}

fn parses<T: FromStr>(value: &str) -> bool {
    value.parse::<T>().is_ok()
}

/// Value space of the integer datatypes, `xsd:integer` itself being bounded by `i128` here.
fn integer_range(datatype: &str) -> Option<(i128, i128)> {
    let local = datatype.strip_prefix("http://www.w3.org/2001/XMLSchema#")?;
    Some(match local {
        "integer" => (i128::MIN, i128::MAX),
        "long" => (i64::MIN.into(), i64::MAX.into()),
        "int" => (i32::MIN.into(), i32::MAX.into()),
        "short" => (i16::MIN.into(), i16::MAX.into()),
        "byte" => (i8::MIN.into(), i8::MAX.into()),
        "nonNegativeInteger" => (0, i128::MAX),
        "positiveInteger" => (1, i128::MAX),
        "nonPositiveInteger" => (i128::MIN, 0),
        "negativeInteger" => (i128::MIN, -1),
        "unsignedLong" => (0, u64::MAX.into()),
        "unsignedInt" => (0, u32::MAX.into()),
        "unsignedShort" => (0, u16::MAX.into()),
        "unsignedByte" => (0, u8::MAX.into()),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNodeRef;

    fn typed(value: &str, datatype: NamedNodeRef<'_>) -> Literal {
        Literal::new_typed_literal(value, datatype)
    }

    #[test]
    fn integers_are_range_checked() {
        assert!(is_well_typed(&typed("42", xsd::INTEGER)));
        assert!(is_well_typed(&typed("-7", xsd::INTEGER)));
        assert!(!is_well_typed(&typed("abc", xsd::INTEGER)));
        assert!(!is_well_typed(&typed("1.5", xsd::INTEGER)));
        assert!(is_well_typed(&typed("255", xsd::UNSIGNED_BYTE)));
        assert!(!is_well_typed(&typed("256", xsd::UNSIGNED_BYTE)));
        assert!(!is_well_typed(&typed("0", xsd::POSITIVE_INTEGER)));
        assert!(is_well_typed(&typed("18446744073709551615", xsd::UNSIGNED_LONG)));
    }

    #[test]
    fn other_xsd_types_use_their_parsers() {
        assert!(is_well_typed(&typed("true", xsd::BOOLEAN)));
        assert!(!is_well_typed(&typed("yes", xsd::BOOLEAN)));
        assert!(is_well_typed(&typed("2024-02-29", xsd::DATE)));
        assert!(!is_well_typed(&typed("2024-13-01", xsd::DATE)));
        assert!(is_well_typed(&typed("1.5E3", xsd::DOUBLE)));
        assert!(!is_well_typed(&typed(" 1.5", xsd::DECIMAL)));
    }

    #[test]
    fn strings_and_unknown_datatypes_accept_anything() {
        assert!(is_well_typed(&Literal::new_simple_literal("abc")));
        assert!(is_well_typed(&typed(
            "anything",
            NamedNodeRef::new_unchecked("http://example.com/custom")
        )));
    }
}
