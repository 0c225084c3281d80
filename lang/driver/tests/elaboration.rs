use tela_driver::{DriverError, elab_output, infer_type, normal_form};

#[test]
fn universe_is_its_own_type() {
    assert_eq!(infer_type("U").unwrap(), "U");
    assert_eq!(normal_form("U").unwrap(), "U");
    assert_eq!(elab_output("U").unwrap(), "U");
}

#[test]
fn identity_with_implicit_domain() {
    let src = "let id : {A} → A → A = λ x. x in id U";
    assert_eq!(normal_form(src).unwrap(), "U");
    assert_eq!(infer_type(src).unwrap(), "U");
    // the implicit lambda and the implicit application were inserted
    let elab = elab_output(src).unwrap();
    assert!(elab.contains("λ {A} x. x"), "elaboration was: {elab}");
    assert!(elab.contains("id {U} U"), "elaboration was: {elab}");
}

#[test]
fn const_with_two_implicits() {
    let src = "let const : {A B} → A → B → A = λ x y. x in const U (U → U)";
    assert_eq!(normal_form(src).unwrap(), "U");
    assert_eq!(infer_type(src).unwrap(), "U");
}

#[test]
fn top_level_lambdas_are_postulates() {
    assert_eq!(infer_type("λ A x. x").unwrap(), "(A : ?0) → (x : ?1 A) → ?1 A");
    assert_eq!(elab_output("λ A x. x").unwrap(), "λ A x. x");
}

#[test]
fn unapplied_let_generalizes_over_a_telescope() {
    // the inserted telescope stays open: nothing decides its contents
    let ty = infer_type("let f = λ x. x in f").unwrap();
    assert!(ty.contains("Rec"), "type was: {ty}");
}

#[test]
fn applied_let_collapses_the_telescope() {
    // using f at an explicit function type empties the inserted telescope
    let src = "let f = λ x. x in f U";
    assert_eq!(normal_form(src).unwrap(), "U");
    assert_eq!(infer_type(src).unwrap(), "U");
}

#[test]
fn annotation_holes_are_solved_by_use() {
    let src = "let id : (A : U) → A → A = λ A x. x in id U U";
    assert_eq!(normal_form(src).unwrap(), "U");
}

#[test]
fn unknown_names_are_rejected() {
    assert!(matches!(infer_type("id"), Err(DriverError::Elab(_))));
}

#[test]
fn parse_errors_are_reported() {
    assert!(matches!(infer_type("(λ x. x"), Err(DriverError::Parse(_))));
}

#[test]
fn ill_typed_application_is_rejected() {
    let src = "let id : (A : U) → A → A = λ A x. x in id U U U";
    assert!(matches!(normal_form(src), Err(DriverError::Elab(_))));
}
