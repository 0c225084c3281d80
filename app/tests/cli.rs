use assert_cmd::Command;

fn tela() -> Command {
    Command::cargo_bin("tela").unwrap()
}

#[test]
fn type_of_the_universe() {
    tela().arg("type").write_stdin("U").assert().success().stdout("U\n");
}

#[test]
fn normal_form_of_an_application() {
    tela()
        .arg("nf")
        .write_stdin("let id : {A} → A → A = λ x. x in id U")
        .assert()
        .success()
        .stdout("U\n");
}

#[test]
fn elaboration_inserts_implicits() {
    let assert = tela()
        .arg("elab")
        .write_stdin("let id : {A} → A → A = λ x. x in id U")
        .assert()
        .success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.contains("λ {A} x. x"), "output was: {out}");
}

#[test]
fn parse_errors_exit_nonzero() {
    tela().arg("nf").write_stdin("(λ x. x").assert().failure();
}

#[test]
fn elaboration_errors_exit_nonzero() {
    tela().arg("type").write_stdin("missing").assert().failure();
}
