#[cfg(test)]
mod verify {
    use structogram::language::*;
    use structogram::parsing::parse;
    use structogram::rendering::*;

    // markup lines carry trailing spaces; compare without them
    fn normalize(text: &str) -> String {
        text.trim_start_matches('\n')
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw(source: &str) -> Fragment {
        let module = parse(source).unwrap();
        let function = module
            .functions()
            .next()
            .unwrap();
        structogram(Node::Function(function), source).unwrap()
    }

    #[test]
    fn do_while_example() {
        let source = std::fs::read_to_string("tests/samples/fn_do_while.py").unwrap();
        let fragment = draw(&source);

        assert!(fragment.problems.is_empty(), "{:?}", fragment.problems);
        assert_eq!(
            normalize(&fragment.markup),
            normalize(
                r#"
% Structogram fn_do_while
\begin{centernss}
  \begin{struktogramm}(120,100)
    \assign[6]{limit = 12}
    \assign[6]{x = 1}
    \assign[6]{y = 1}
    \assign[6]{Output(x, y)}
    \until[8]{y \textless\  limit}
        \assign[6]{z = x + y}
        \assign[6]{Output(z)}
        \assign[6]{x = y}
        \assign[6]{y = z}
    \untilend
  \end{struktogramm}
\end{centernss}
"#
            )
        );
    }

    #[test]
    fn while_do_example() {
        let source = std::fs::read_to_string("tests/samples/fn_while_do.py").unwrap();
        let fragment = draw(&source);

        assert!(fragment.problems.is_empty(), "{:?}", fragment.problems);
        assert_eq!(
            normalize(&fragment.markup),
            normalize(
                r#"
% Structogram fn_while_do
\begin{centernss}
  \begin{struktogramm}(120,100)
    \assign[6]{a = 1}
    \assign[6]{b = 15}
    \assign[6]{c = 3}
    \while[8]{c $\geq$ -1}
        \assign[6]{b = a + b}
        \assign[6]{a = a - b}
        \assign[6]{c = c - 2}
        \ifthenelse{5}{5}
          {(a \textless\  0) \pKey{and} b $\leq$ 1} {\pTrue}{\pFalse}
            \assign[6]{Output(\textquotedbl  a =\textquotedbl , a, \textquotedbl  b =\textquotedbl , b)}
        \change
            \assign[6]{b = b - 2}
            \assign[6]{a = a - 3}
            \assign[6]{Output(\textquotedbl  a =\textquotedbl , a, \textquotedbl  c =\textquotedbl , c)}
        \ifend
    \whileend
    \assign[6]{Output(\textquotedbl  c =\textquotedbl , c)}
  \end{struktogramm}
\end{centernss}
"#
            )
        );
    }

    #[test]
    fn input_example() {
        let source = std::fs::read_to_string("tests/samples/fn_input.py").unwrap();
        let fragment = draw(&source);

        assert!(fragment.problems.is_empty(), "{:?}", fragment.problems);
        assert!(fragment
            .markup
            .contains("\n    \\assign[6]{Input(limit)}\n    \\assign[6]{x = 1}\n"));
        assert!(fragment
            .markup
            .contains("\\until[8]{y \\textless\\  limit} \n"));
    }

    #[test]
    fn plain_input_box_keeps_its_newline() {
        let source = "def f():\n    name = input('Who? ')\n";
        let fragment = draw(source);

        assert!(fragment
            .markup
            .contains("    \\assign[6]{Input(name) \n}\n"));
    }

    #[test]
    fn switch_case_example() {
        let source = std::fs::read_to_string("tests/samples/fn_switch_case.py").unwrap();
        let fragment = draw(&source);

        assert!(fragment.problems.is_empty(), "{:?}", fragment.problems);
        assert!(normalize(&fragment.markup).contains(&normalize(
                    r#"
    \while[8]{n \textless\  10}
        \case[12]{1}{3}{n \% 3}{0}
            \assign[6]{n = n - m}
            \assign[6]{k = k + m}
            \assign[6]{Output(\textquotedbl n =\textquotedbl , n)}
            \assign[6]{Output(\textquotedbl k =\textquotedbl , k)}
        \switch{1}
            \assign[6]{n = n + k}
            \assign[6]{m = m + 1}
            \assign[6]{Output(\textquotedbl n =\textquotedbl , n)}
            \assign[6]{Output(\textquotedbl m =\textquotedbl , m)}
        \switch[r]{otherwise}
            \assign[6]{n = k + 10}
            \assign[6]{m = m + k}
            \assign[6]{Output(\textquotedbl n =\textquotedbl , n)}
            \assign[6]{Output(\textquotedbl m =\textquotedbl , m)}
        \caseend
    \whileend
"#
                )));
    }

    #[test]
    fn switch_without_default() {
        let source = r#"
def f():
    match n:
        case 0:
            pass
        case 1:
            pass
        case 2:
            pass
            "#
        .trim_ascii();
        let fragment = draw(source);

        assert!(fragment.problems.is_empty(), "{:?}", fragment.problems);
        assert!(fragment
            .markup
            .contains("    \\case[12]{0}{3}{n}{0}\n"));
        assert!(fragment
            .markup
            .contains("    \\switch{1}\n"));
        assert!(fragment
            .markup
            .contains("    \\switch{2}\n"));
        assert!(!fragment
            .markup
            .contains("\\switch[r]"));
        assert!(!fragment
            .markup
            .contains("otherwise"));
    }

    #[test]
    fn switch_with_default_marks_only_the_last_case() {
        let source = r#"
def f():
    match n:
        case 0:
            pass
        case 1:
            pass
        case _:
            pass
            "#
        .trim_ascii();
        let fragment = draw(source);

        let headers: Vec<&str> = fragment
            .markup
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("\\case[") || line.starts_with("\\switch"))
            .collect();

        assert_eq!(
            headers,
            vec![
                "\\case[12]{1}{3}{n}{0}",
                "\\switch{1}",
                "\\switch[r]{otherwise}"
            ]
        );
    }

    #[test]
    fn string_case_labels_are_escaped() {
        let source = r#"
def f():
    match answer:
        case "yes":
            pass
        case _:
            pass
            "#
        .trim_ascii();
        let fragment = draw(source);

        assert!(fragment
            .markup
            .contains("\\case[12]{1}{2}{answer}{\\textquotedbl yes\\textquotedbl }\n"));
    }

    #[test]
    fn complex_patterns_are_reported() {
        let source = r#"
def f():
    x = 1
    match point:
        case (0, y):
            pass
        case _:
            pass
            "#
        .trim_ascii();
        let fragment = draw(source);

        assert_eq!(fragment.problems.len(), 1);
        assert!(matches!(
            fragment.problems[0],
            Problem::InvalidPattern(_, "sequence pattern")
        ));
        assert!(fragment
            .markup
            .contains("\\assign[6]{x = 1}"));
        assert!(!fragment
            .markup
            .contains("\\case"));
    }

    #[test]
    fn wildcard_before_the_last_case_is_rejected() {
        let source = r#"
def f():
    match n:
        case _:
            pass
        case 1:
            pass
            "#
        .trim_ascii();
        let fragment = draw(source);

        let offset = source
            .find("_:")
            .unwrap();
        assert_eq!(
            fragment.problems,
            vec![Problem::InvalidPattern(
                offset,
                "wildcard before the last case"
            )]
        );
        assert!(!fragment
            .markup
            .contains("\\case"));
    }

    #[test]
    fn missing_else_gets_a_placeholder() {
        let source = r#"
def f():
    if x:
        y = 1
            "#
        .trim_ascii();
        let fragment = draw(source);

        assert!(normalize(&fragment.markup).contains(&normalize(
                    r#"
    \ifthenelse{5}{5}
      {x} {\pTrue}{\pFalse}
        \assign[6]{y = 1}
    \change
        \assign[6]{$\emptyset$}
    \ifend
"#
                )));
    }

    #[test]
    fn undrawable_arm_gets_a_placeholder() {
        let source = r#"
def f():
    if x:
        return
    else:
        y = 1
            "#
        .trim_ascii();
        let fragment = draw(source);

        assert!(fragment
            .markup
            .contains("      {x} {\\pTrue}{\\pFalse} \n        \\assign[6]{$\\emptyset$}\n    \\change \n"));
        assert_eq!(fragment.problems.len(), 1);
    }

    #[test]
    fn negated_do_while_guard() {
        let source = r#"
def f():
    while True:
        x = 1
        if not (x < 2):
            break
            "#
        .trim_ascii();
        let fragment = draw(source);

        assert!(fragment.problems.is_empty(), "{:?}", fragment.problems);
        assert!(normalize(&fragment.markup).contains(&normalize(
                    r#"
    \until[8]{(x \textless\  2)}
        \assign[6]{x = 1}
    \untilend
"#
                )));
        assert_eq!(
            fragment
                .markup
                .matches("\\assign")
                .count(),
            1
        );
        assert!(!fragment
            .markup
            .contains("\\ifthenelse"));
    }

    #[test]
    fn unsupported_statements_render_nothing() {
        let source = r#"
def f():
    x = 1
    for i in range(3):
        print(i)
    x += 2
    y = 2
            "#
        .trim_ascii();
        let fragment = draw(source);

        assert_eq!(
            fragment.problems,
            vec![
                Problem::UnsupportedStatement(
                    source
                        .find("for")
                        .unwrap(),
                    "for"
                ),
                Problem::UnsupportedStatement(
                    source
                        .find("x +=")
                        .unwrap(),
                    "augmented assignment"
                ),
            ]
        );
        assert_eq!(
            fragment
                .markup
                .matches("\\assign")
                .count(),
            2
        );
    }

    #[test]
    fn pass_is_an_empty_box() {
        let fragment = draw("def f():\n    pass\n");

        assert!(fragment
            .markup
            .contains("    \\assign[6]{$\\emptyset$}\n"));
    }

    #[test]
    fn depth_controls_indentation() {
        let source = "def f():\n    x = 1\n";
        let module = parse(source).unwrap();
        let function = module
            .functions()
            .next()
            .unwrap();

        let fragment = render(Node::Sequence(&function.body), source, 0).unwrap();
        assert_eq!(fragment.markup, "    \\assign[6]{x = 1}\n");

        let fragment = render(Node::Sequence(&function.body), source, 2).unwrap();
        assert_eq!(fragment.markup, "            \\assign[6]{x = 1}\n");
    }

    #[test]
    fn rendering_is_repeatable() {
        let source = std::fs::read_to_string("tests/samples/fn_switch_case.py").unwrap();

        assert_eq!(draw(&source), draw(&source));
    }

    #[test]
    fn expressions_are_not_renderable() {
        let source = "def f():\n    x = 1\n";
        let module = parse(source).unwrap();
        let function = module
            .functions()
            .next()
            .unwrap();
        let StatementKind::Assignment { value, .. } = &function.body[0].kind else {
            panic!("expected an assignment");
        };

        let result = structogram(Node::Expression(value), source);
        assert!(matches!(result, Err(RenderError::UnexpectedNode(_))));
    }
}
