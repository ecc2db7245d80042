use sheet_import::{
    catalog::{Arity, PRESET_DECLARATIONS, TypeName, list_types},
    compat::fits,
    declaration::{ColumnTypeSpec, DeclarationError, TypeParams, validate},
};

#[test]
fn validator_accepts_and_rejects_documented_examples() {
    assert!(validate(""));
    assert!(validate("varchar(255)"));
    assert!(!validate("varchar(255,10)"));
    assert!(!validate("year(3)"));
    assert!(validate("enum('a','b')"));
    assert!(!validate("nonsense"));
}

#[test]
fn signed_integer_parameters_pass_validation() {
    assert!(validate("int(-1)"));
    assert!(validate("decimal(10,-2)"));
    assert!(!validate("int(1e3)"));
    assert!(matches!(
        ColumnTypeSpec::parse("int(-1)"),
        Err(DeclarationError::NegativeParameter { .. })
    ));
}

#[test]
fn every_preset_declaration_validates() {
    for (declaration, description) in PRESET_DECLARATIONS {
        assert!(validate(declaration), "{declaration} ({description})");
    }
}

#[test]
fn bare_names_are_valid_except_member_lists() {
    for entry in list_types() {
        let expected = entry.arity != Arity::Members;
        assert_eq!(validate(entry.name.as_str()), expected, "{}", entry.name);
        assert_eq!(
            validate(&entry.name.as_str().to_uppercase()),
            expected,
            "{}",
            entry.name
        );
    }
}

#[test]
fn fixed_size_types_reject_parameters() {
    for entry in list_types().iter().filter(|e| e.arity == Arity::None) {
        let declaration = format!("{}(1)", entry.name);
        assert_eq!(
            ColumnTypeSpec::parse(&declaration),
            Err(DeclarationError::UnexpectedParameters { name: entry.name })
        );
    }
}

#[test]
fn parsed_parameters_are_typed() {
    let spec = ColumnTypeSpec::parse("Decimal(12, 2)").unwrap();
    assert_eq!(spec.name(), TypeName::Decimal);
    assert_eq!(spec.params(), &TypeParams::PrecisionScale(12, 2));
    assert_eq!(spec.precision_scale(), Some((12, 2)));

    let spec = ColumnTypeSpec::parse("char(1)").unwrap();
    assert_eq!(spec.length(), Some(1));
    assert_eq!(spec.members(), None);
}

#[test]
fn parameter_count_errors_report_expected_and_found() {
    assert_eq!(
        ColumnTypeSpec::parse("double(10)"),
        Err(DeclarationError::ParameterCount {
            name: TypeName::Double,
            expected: 2,
            found: 1
        })
    );
    let message = ColumnTypeSpec::parse("int(1,2)").unwrap_err().to_string();
    assert!(message.contains("expects 1 parameter(s) but 2 were given"));
}

#[test]
fn valid_declarations_fit_themselves() {
    for declaration in ["varchar(45)", "decimal(65,30)", "set('a')", "year(4)", "bit(1)"] {
        assert!(validate(declaration));
        assert!(fits(declaration, declaration));
        assert!(fits("", declaration));
        assert!(!fits(declaration, ""));
    }
}
