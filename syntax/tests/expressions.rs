use osql_syntax::ast::*;
use osql_syntax::error::ErrorKind;
use osql_syntax::source::SourceFile;
use osql_syntax::{parse, parse_expression, Parser};

fn expr(source: &str) -> Expr {
    match parse_expression(source) {
        Ok(Value::Expr(expr)) => expr,
        other => panic!("expected an expression from {:?}, got {:?}", source, other),
    }
}

fn int(value: i32) -> Expr {
    Expr::Literal(Literal::Integer(value))
}

fn text(value: &str) -> Expr {
    Expr::Literal(Literal::Text(value.into()))
}

#[test]
fn function_then_method() {
    let expected = Method::new("baz", vec![int(2)])
        .bind(Expr::Function(Function {
            name: "foo".into(),
            arguments: vec![int(1), text("bar")],
        }))
        .unwrap();

    assert_eq!(expr(r#"foo(1, "bar").baz(2)"#), Expr::Method(expected));
}

#[test]
fn text_literals_keep_content_verbatim() {
    assert_eq!(expr(r#""hello world""#), text("hello world"));
    assert_eq!(expr("''"), text(""));
    assert_eq!(expr(r#"'it\'s'"#), text(r#"it\'s"#));
}

#[test]
fn integer_and_double_forms() {
    assert_eq!(expr("42"), int(42));
    assert_eq!(expr("-7"), int(-7));
    assert_eq!(expr("4.25"), Expr::Literal(Literal::Double(4.25)));
    assert_eq!(expr("1e3"), Expr::Literal(Literal::Double(1000.0)));
}

#[test]
fn integer_overflow_fails() {
    let error = parse_expression("99999999999").unwrap_err();

    assert_eq!(error.kind, ErrorKind::InvalidNumber("99999999999".into()));
}

#[test]
fn null_keyword_is_case_insensitive_and_distinct_from_unset() {
    assert_eq!(expr("NULL"), Expr::Literal(Literal::Null));
    assert_eq!(expr("null"), Expr::Literal(Literal::Null));
    assert_eq!(expr("unset"), Expr::Unset);
    assert_ne!(expr("NULL"), expr("UNSET"));
}

#[test]
fn keywords_only_match_whole_words() {
    assert_eq!(parse_expression("nullable").unwrap(), Value::Word("nullable".into()));
}

#[test]
fn record_identifiers() {
    assert_eq!(expr("#5:100"), Expr::Literal(Literal::RecordId(RecordId::new(5, 100))));

    let error = parse_expression("#40000:1").unwrap_err();
    assert_eq!(error.kind, ErrorKind::InvalidRecordIdentifier("#40000:1".into()));
}

#[test]
fn parentheses_do_not_change_the_result() {
    assert_eq!(expr(r#"((max(1, 2)))"#), expr("max(1, 2)"));
    assert_eq!(expr("(3)"), int(3));
}

#[test]
fn nested_composites() {
    assert_eq!(
        expr(r#"{"a": [1, {"b": f()}], 'a': 2}"#),
        Expr::Map(vec![
            (Literal::Text("a".into()), Expr::Collection(vec![
                int(1),
                Expr::Map(vec![
                    (Literal::Text("b".into()), Expr::Function(Function {
                        name: "f".into(),
                        arguments: vec![],
                    })),
                ]),
            ])),
            (Literal::Text("a".into()), int(2)),
        ]),
    );

    assert_eq!(expr("[]"), Expr::Collection(vec![]));
    assert_eq!(expr("{}"), Expr::Map(vec![]));
}

#[test]
fn methods_cannot_be_chained_onto_bare_words() {
    let error = parse_expression("name.size()").unwrap_err();

    assert_eq!(error.kind, ErrorKind::InvalidMethodChainOperands);
}

#[test]
fn bare_word_arguments_are_rejected() {
    let error = parse_expression("count(name)").unwrap_err();

    assert_eq!(error.kind, ErrorKind::ExpectedExpression);
}

#[test]
fn syntax_errors_point_at_the_source() {
    let error = parse(SourceFile::named("bad.osql", "SELECT foo(1,")).unwrap_err();

    match &error.kind {
        ErrorKind::Syntax(_) => {},
        kind => panic!("expected a syntax error, got {:?}", kind),
    }

    let message = error.to_string();
    assert!(message.contains("bad.osql:1:"), "{}", message);
    assert!(message.contains("| SELECT foo(1,"), "{}", message);
}

#[test]
fn deep_nesting_is_rejected() {
    let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));

    assert_eq!(Parser::new().parse_expression(source.as_str()).unwrap(), Value::Expr(int(1)));

    let error = Parser::new().max_depth(16).parse_expression(source.as_str()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::NestingTooDeep(16));
}

#[test]
fn commands_render_back_to_text() {
    let command = parse(r#"SELECT foo(1, "bar").baz(2), [1.0, #3:4] FROM V WHERE x = {"k": NULL}"#).unwrap();

    assert_eq!(
        command.to_string(),
        r#"SELECT foo(1, "bar").baz(2) , [1.0, #3:4] FROM V WHERE x = {"k": NULL}"#,
    );
}

#[test]
fn very_deep_nesting_fails_without_exhausting_the_stack() {
    let parens = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));
    let brackets = format!("{}{}", "[".repeat(1000), "]".repeat(1000));
    let chain = format!("a(){}", ".b()".repeat(1000));

    for source in &[&parens, &brackets, &chain] {
        let error = parse_expression(source.as_str()).unwrap_err();
        assert_eq!(error.kind, ErrorKind::NestingTooDeep(256));
    }

    let error = parse(format!("SELECT {}", parens)).unwrap_err();
    assert_eq!(error.kind, ErrorKind::NestingTooDeep(256));
}

#[test]
fn nesting_just_below_the_limit_parses() {
    let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));

    assert_eq!(expr(&source), int(1));
}

#[test]
fn names_followed_by_a_space_are_not_calls() {
    let command = parse("SELECT FROM V WHERE a IN (1, 2)").unwrap();

    assert!(command.tokens.contains(&Value::Word("IN".into())));
    assert!(!command.tokens.iter().any(|token| matches!(token, Value::Expr(Expr::Function(_)))));
}

#[test]
fn grouped_commands_render_to_text_that_parses_the_same() {
    for source in &[
        "SELECT count(*) FROM V",
        "SELECT FROM V WHERE (a = 1 OR b = 2)",
        "SELECT FROM V WHERE a IN (1, 2)",
        "SELECT a.b, [1, 2] FROM V",
    ] {
        let command = parse(*source).unwrap();

        assert_eq!(parse(command.to_string()).unwrap(), command, "{}", source);
    }
}

#[test]
fn quoted_text_renders_to_text_that_parses_the_same() {
    for source in &[r#"'say "hi"'"#, r#""it's""#, r#"'it\'s'"#] {
        let value = expr(source);

        assert_eq!(expr(&value.to_string()), value, "{}", source);
    }
}
