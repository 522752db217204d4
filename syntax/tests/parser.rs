use log::*;
use osql_syntax::ast::OpaqueCommand;
use osql_syntax::parse;
use osql_syntax::source::*;
use std::error::Error;
use std::fs;

#[derive(serde::Serialize, serde::Deserialize)]
struct ParserTest {
    #[serde(default)]
    skip: bool,
    source: String,
    ast: String,
}

impl ParserTest {
    fn load(path: impl AsRef<std::path::Path>) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }
}

#[test]
pub fn run_all_tests() -> Result<(), Box<dyn Error>> {
    let _ = stderrlog::new().verbosity(3).init();

    let mut count = 0;

    for path in glob::glob("tests/parser/**/*.toml")?.filter_map(Result::ok) {
        let test = ParserTest::load(&path)?;
        let src = SourceFile::named(path.display().to_string(), test.source.clone());

        if test.skip {
            info!("skipping test: {}", src.name());
            continue;
        }

        info!("running test: {}", src.name());

        let actual = parse(src.clone())?;
        let expected: OpaqueCommand = ron::from_str(&test.ast)?;

        if actual != expected {
            let expected = format!("{:#?}", expected);
            let actual = format!("{:#?}", actual);
            eprintln!("{}", difference::Changeset::new(&expected, &actual, "\n"));
            panic!("actual AST does not match expected AST in {}", src.name());
        }

        count += 1;
    }

    assert!(count > 0, "no parser tests found");

    Ok(())
}
