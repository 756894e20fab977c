#[cfg(test)]
mod verify {
    use structogram::language::*;
    use structogram::parsing::parser::ParsingError;
    use structogram::parsing::{parse, parse_expression};

    fn only_function<'a, 'i>(module: &'a Module<'i>) -> &'a Function<'i> {
        let functions: Vec<_> = module
            .functions()
            .collect();
        assert_eq!(functions.len(), 1);
        functions[0]
    }

    #[test]
    fn function_with_simple_body() {
        let source = r#"
def simple():
    a = 1
    print(a)
            "#
        .trim_ascii();

        let module = parse(source).unwrap();
        let function = only_function(&module);

        assert_eq!(function.name, Identifier("simple"));
        assert!(function
            .parameters
            .is_empty());
        assert_eq!(
            function
                .body
                .len(),
            2
        );

        let first = &function.body[0];
        assert!(matches!(
            first.kind,
            StatementKind::Assignment { .. }
        ));
        assert_eq!(
            first
                .span
                .text(source),
            "a = 1"
        );

        let second = &function.body[1];
        match &second.kind {
            StatementKind::Expression(expression) => {
                assert_eq!(expression.callee(), Some("print"));
                assert_eq!(
                    expression
                        .arguments()
                        .map(|arguments| arguments.len()),
                    Some(1)
                );
            }
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    #[test]
    fn finding_functions_by_name() {
        let source = r#"
def first():
    pass

def second(a, b=2):
    pass
            "#
        .trim_ascii();

        let module = parse(source).unwrap();

        assert_eq!(
            module
                .functions()
                .count(),
            2
        );
        let second = module
            .function("second")
            .unwrap();
        assert_eq!(second.parameters, vec![Identifier("a"), Identifier("b")]);
        assert!(module
            .function("third")
            .is_none());
    }

    #[test]
    fn elif_nests_in_the_alternative() {
        let source = r#"
def f():
    if a:
        x = 1
    elif b:
        x = 2
    else:
        x = 3
            "#
        .trim_ascii();

        let module = parse(source).unwrap();
        let function = only_function(&module);

        let StatementKind::Conditional { alternative, .. } = &function.body[0].kind else {
            panic!("expected a conditional");
        };
        assert_eq!(alternative.len(), 1);

        let StatementKind::Conditional {
            test,
            consequent,
            alternative,
        } = &alternative[0].kind
        else {
            panic!("expected a nested conditional");
        };
        assert_eq!(
            test.span
                .text(source),
            "b"
        );
        assert_eq!(consequent.len(), 1);
        assert_eq!(alternative.len(), 1);
    }

    #[test]
    fn match_cases_keep_their_positions() {
        let source = r#"
def f():
    match n % 3:
        case 0:
            pass
        case 1 | 2:
            pass
        case _:
            pass
            "#
        .trim_ascii();

        let module = parse(source).unwrap();
        let function = only_function(&module);

        let StatementKind::Match { subject, cases } = &function.body[0].kind else {
            panic!("expected a match statement");
        };
        assert_eq!(
            subject
                .span
                .text(source),
            "n % 3"
        );
        assert_eq!(cases.len(), 3);

        assert_eq!(
            cases[0]
                .pattern
                .kind,
            PatternKind::Literal(Constant::Integer(0))
        );
        assert!(matches!(
            cases[1]
                .pattern
                .kind,
            PatternKind::Or(_)
        ));
        assert!(cases[2].is_wildcard());
        assert!(cases[2].is_default(cases.len()));
        assert!(!cases[0].is_default(cases.len()));

        for (i, case) in cases
            .iter()
            .enumerate()
        {
            assert_eq!(case.position, i);
        }
    }

    #[test]
    fn match_is_a_soft_keyword() {
        let source = r#"
def f():
    match = 5
    print(match)
            "#
        .trim_ascii();

        let module = parse(source).unwrap();
        let function = only_function(&module);

        assert!(matches!(
            function.body[0].kind,
            StatementKind::Assignment { .. }
        ));
    }

    #[test]
    fn unsupported_statements_are_kept() {
        let source = r#"
def f():
    for i in range(3):
        print(i)
    x += 1
    import math
    return x
            "#
        .trim_ascii();

        let module = parse(source).unwrap();
        let function = only_function(&module);

        let kinds: Vec<&'static str> = function
            .body
            .iter()
            .map(|statement| {
                statement
                    .kind
                    .describe()
            })
            .collect();

        assert_eq!(
            kinds,
            vec!["for", "augmented assignment", "import", "return"]
        );
    }

    #[test]
    fn statements_on_one_line() {
        let source = "def f():\n    if x: a = 1; b = 2\n    pass";

        let module = parse(source).unwrap();
        let function = only_function(&module);

        let StatementKind::Conditional { consequent, .. } = &function.body[0].kind else {
            panic!("expected a conditional");
        };
        assert_eq!(consequent.len(), 2);
        assert_eq!(
            function
                .body
                .len(),
            2
        );
    }

    #[test]
    fn bracketed_lines_continue() {
        let source = r#"
def f():
    limit = eval(
        input("What is the upper limit?"))
    x = 1
            "#
        .trim_ascii();

        let module = parse(source).unwrap();
        let function = only_function(&module);

        assert_eq!(
            function
                .body
                .len(),
            2
        );
        let StatementKind::Assignment { value, .. } = &function.body[0].kind else {
            panic!("expected an assignment");
        };
        assert_eq!(value.callee(), Some("eval"));
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let source = r#"
# leading comment

def f():

    # inside
    x = 1  # trailing

    y = 2
            "#
        .trim_ascii();

        let module = parse(source).unwrap();
        let function = only_function(&module);

        assert_eq!(
            function
                .body
                .len(),
            2
        );
        assert_eq!(
            function.body[0]
                .span
                .text(source),
            "x = 1"
        );
    }

    #[test]
    fn expression_spans_cover_source_text() {
        let source = "(a < 0) and b <= 1";
        let expression = parse_expression(source).unwrap();

        assert!(matches!(
            expression.kind,
            ExpressionKind::Logical(_, LogicalOperator::And, _)
        ));
        assert_eq!(
            expression
                .span
                .text(source),
            source
        );
    }

    #[test]
    fn operator_precedence() {
        let expression = parse_expression("1 + 2 * 3").unwrap();

        let ExpressionKind::Binary(left, BinaryOperator::Add, right) = &expression.kind else {
            panic!("expected addition at the top");
        };
        assert_eq!(left.kind, ExpressionKind::Constant(Constant::Integer(1)));
        assert!(matches!(
            right.kind,
            ExpressionKind::Binary(_, BinaryOperator::Multiply, _)
        ));
    }

    #[test]
    fn errors_carry_offsets() {
        let result = parse("def f():\n    def g():\n        pass\n");
        assert_eq!(result, Err(ParsingError::NestedFunction(13)));

        let result = parse("def f():\n    print('oops)\n");
        assert!(matches!(result, Err(ParsingError::UnclosedString(_))));

        let result = parse("def f():\n    while x:\n        pass\n    else:\n        pass\n");
        assert!(matches!(
            result,
            Err(ParsingError::Unsupported(_, "while-else"))
        ));

        let result = parse("def f():\n  x = 1\n y = 2\n");
        assert!(matches!(
            result,
            Err(ParsingError::InconsistentIndentation(_))
        ));
    }
}
