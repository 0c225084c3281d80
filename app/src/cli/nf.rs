pub fn exec() -> miette::Result<()> {
    let src = super::read_source()?;
    match tela_driver::normal_form(&src) {
        Ok(out) => {
            println!("{out}");
            Ok(())
        }
        Err(err) => Err(miette::Report::new(err).with_source_code(src)),
    }
}
