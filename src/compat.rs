use log::debug;

use crate::catalog::TypeName;

/// Whether data typed `type1` can be stored in a column typed `type2`.
/// Parameters are ignored; an empty `type1` fits anywhere and nothing fits an
/// empty `type2`.
pub fn fits(type1: &str, type2: &str) -> bool {
    let source = strip_parameters(type1);
    let target = strip_parameters(type2);
    if source.is_empty() {
        return true;
    }
    if target.is_empty() {
        return false;
    }
    match (source.parse::<TypeName>(), target.parse::<TypeName>()) {
        (Ok(source), Ok(target)) => type_fits(source, target),
        (source_result, target_result) => {
            debug!(
                "Cannot compare '{type1}' with '{type2}': {}",
                source_result
                    .err()
                    .or(target_result.err())
                    .map(|err| err.to_string())
                    .unwrap_or_default()
            );
            false
        }
    }
}

pub fn type_fits(source: TypeName, target: TypeName) -> bool {
    if source == target || target.is_text_sink() {
        return true;
    }
    let integral_source = source.is_integer_like() || source == TypeName::Year;
    if integral_source
        && (target.is_integer_like() || target.is_decimal_like() || target == TypeName::Year)
    {
        return true;
    }
    (source.is_decimal_like() && target.is_decimal_like())
        || (source.is_boolean_like() && target.is_boolean_like())
        || (source.is_date_like() && target.is_date_like())
        || (source == TypeName::Time && target == TypeName::Time)
        || (source.is_blob() && target.is_blob())
        || (source.is_binary() && target.is_binary())
}

fn strip_parameters(declaration: &str) -> &str {
    declaration
        .split_once('(')
        .map_or(declaration, |(name, _)| name)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::list_types;

    #[test]
    fn every_type_fits_itself() {
        for entry in list_types() {
            assert!(fits(entry.name.as_str(), entry.name.as_str()));
        }
    }

    #[test]
    fn empty_types_follow_unspecified_rules() {
        assert!(fits("", ""));
        for entry in list_types() {
            assert!(fits("", entry.name.as_str()), "{}", entry.name);
            assert!(!fits(entry.name.as_str(), ""), "{}", entry.name);
        }
    }

    #[test]
    fn parameters_are_ignored() {
        assert!(fits("varchar(255)", "varchar(10)"));
        assert!(fits("decimal(65,30)", "double"));
        assert!(fits("int(11)", "Decimal(12, 2)"));
    }

    #[test]
    fn character_types_accept_everything() {
        assert!(fits("datetime", "varchar"));
        assert!(fits("blob", "longtext"));
        assert!(fits("double", "enum('a')"));
        assert!(!fits("varchar", "int"));
    }

    #[test]
    fn numeric_widening_is_one_directional() {
        assert!(fits("tinyint", "bigint"));
        assert!(fits("year", "int"));
        assert!(fits("int", "year"));
        assert!(fits("bigint", "double"));
        assert!(!fits("double", "int"));
        assert!(fits("real", "numeric"));
    }

    #[test]
    fn family_pairs() {
        assert!(fits("bool", "bit"));
        assert!(fits("boolean", "tinyint"));
        assert!(fits("timestamp", "date"));
        assert!(fits("date", "datetime"));
        assert!(!fits("time", "datetime"));
        assert!(fits("tinyblob", "longblob"));
        assert!(fits("binary(16)", "varbinary(20)"));
        assert!(!fits("blob", "binary"));
    }

    #[test]
    fn unknown_names_never_fit() {
        assert!(!fits("nonsense", "text"));
        assert!(!fits("int", "nonsense"));
    }
}
