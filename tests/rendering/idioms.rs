#[cfg(test)]
mod verify {
    use structogram::language::*;
    use structogram::parsing::parse;
    use structogram::rendering::{do_while_shape, escape, input_shape};

    fn first_statement<'a, 'i>(module: &'a Module<'i>) -> &'a Statement<'i> {
        let function = module
            .functions()
            .next()
            .unwrap();
        &function.body[0]
    }

    #[test]
    fn escaping_metacharacters() {
        assert_eq!(escape("%{}_&$"), "\\%\\{\\}\\_\\&\\$");
        assert_eq!(escape("$&_}{%"), "\\$\\&\\_\\}\\{\\%");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn input_label_has_trailing_space_and_newline() {
        let source = "def f():\n    x = input('value? ')\n";
        let module = parse(source).unwrap();

        assert_eq!(
            input_shape(first_statement(&module)),
            Some("Input(x) \n".to_string())
        );
    }

    #[test]
    fn evaluated_input_label_is_bare() {
        let source = "def f():\n    x = eval(input('value? '))\n";
        let module = parse(source).unwrap();

        assert_eq!(
            input_shape(first_statement(&module)),
            Some("Input(x)".to_string())
        );
    }

    #[test]
    fn other_assignments_are_not_input() {
        for source in [
            "def f():\n    x = int(input())\n",
            "def f():\n    x = eval('1 + 2')\n",
            "def f():\n    x, y = input(), 2\n",
            "def f():\n    print(input())\n",
        ] {
            let module = parse(source).unwrap();
            assert_eq!(input_shape(first_statement(&module)), None, "{}", source);
        }
    }

    #[test]
    fn do_while_condition_is_extracted() {
        let source = r#"
def f():
    while True:
        y = y + 1
        if not y < limit:
            break
            "#
        .trim_ascii();
        let module = parse(source).unwrap();

        assert_eq!(
            do_while_shape(first_statement(&module), source),
            Some("y \\textless\\  limit".to_string())
        );
    }

    #[test]
    fn unconditional_exit_is_not_do_while() {
        let source = r#"
def f():
    while True:
        y = y + 1
        break
            "#
        .trim_ascii();
        let module = parse(source).unwrap();

        assert_eq!(do_while_shape(first_statement(&module), source), None);
    }

    #[test]
    fn positive_guard_is_not_do_while() {
        let source = r#"
def f():
    while True:
        y = y + 1
        if y >= limit:
            break
            "#
        .trim_ascii();
        let module = parse(source).unwrap();

        assert_eq!(do_while_shape(first_statement(&module), source), None);
    }

    #[test]
    fn other_loop_tests_are_not_do_while() {
        let source = r#"
def f():
    while y:
        y = y + 1
        if not y < limit:
            break
            "#
        .trim_ascii();
        let module = parse(source).unwrap();

        assert_eq!(do_while_shape(first_statement(&module), source), None);
    }

    #[test]
    fn guard_must_start_with_break() {
        let source = r#"
def f():
    while True:
        y = y + 1
        if not y < limit:
            print(y)
            break
            "#
        .trim_ascii();
        let module = parse(source).unwrap();

        assert_eq!(do_while_shape(first_statement(&module), source), None);
    }
}
