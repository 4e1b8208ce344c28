use crate::{Ident, SchemaError, SourcePos};

#[test]
fn accepts_c_identifiers() {
    for name in ["port", "_private", "Endpoint", "a1_b2"] {
        assert_eq!(Ident::new(name).unwrap().as_str(), name);
    }
}

#[test]
fn rejects_non_identifiers() {
    for name in ["", "1st", "log-level", "a b", "ünï"] {
        assert_eq!(
            Ident::new(name),
            Err(SchemaError::InvalidIdentifier(name.to_string()))
        );
    }
}

#[test]
fn try_from_str() {
    let ident: Ident = "host".try_into().unwrap();
    assert_eq!(ident.to_string(), "host");
    assert!(Ident::try_from("-x").is_err());
}

#[test]
fn source_pos_display() {
    assert_eq!(SourcePos::new(3, 14).to_string(), "line 3, column 14");
}
