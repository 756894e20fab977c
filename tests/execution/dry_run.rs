#[cfg(test)]
mod verify {
    use structogram::execution::{capture, run, ExecutionError};
    use structogram::parsing::parse;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter()
            .map(|line| line.to_string())
            .collect()
    }

    fn dry_run(source: &str, input: &str) -> Result<Vec<String>, ExecutionError> {
        let module = parse(source).unwrap();
        let function = module
            .functions()
            .next()
            .unwrap();
        let mut input = input.as_bytes();
        capture(function, &mut input)
    }

    fn sample(name: &str) -> String {
        std::fs::read_to_string(format!("tests/samples/{}.py", name)).unwrap()
    }

    #[test]
    fn do_while_prints_fibonacci() {
        let output = dry_run(&sample("fn_do_while"), "").unwrap();

        assert_eq!(output, lines(&["1 1", "2", "3", "5", "8", "13"]));
    }

    #[test]
    fn while_do_example() {
        let output = dry_run(&sample("fn_while_do"), "").unwrap();

        assert_eq!(
            output,
            lines(&[
                " a = -18  c = 1",
                " a = -14  b = -4",
                " a = 1  c = -3",
                " c = -3"
            ])
        );
    }

    #[test]
    fn switch_case_example() {
        let output = dry_run(&sample("fn_switch_case"), "").unwrap();

        assert_eq!(
            output,
            lines(&[
                "n = 4", "k = 4", "n = 8", "m = 3", "n = 14", "m = 7", "n = 42"
            ])
        );
    }

    #[test]
    fn input_reads_from_the_supplied_reader() {
        let output = dry_run(&sample("fn_input"), "7\n").unwrap();

        // the prompt has no newline of its own
        assert_eq!(
            output,
            lines(&["What is the upper limit?1 1", "2", "3", "5", "8"])
        );
    }

    #[test]
    fn elif_example() {
        let output = dry_run(&sample("fn_elif"), "80\n").unwrap();

        assert_eq!(output, lines(&["Score? grade B for 80"]));
    }

    #[test]
    fn running_out_of_input() {
        let result = dry_run(&sample("fn_input"), "");

        assert!(matches!(result, Err(ExecutionError::EndOfInput(_))));
    }

    #[test]
    fn print_separators_and_endings() {
        let source = r#"
def f():
    print(1, 2, 3, sep='-')
    print('a', end='')
    print('b')
    print()
    print(1 / 4, 2 ** 3, 7 // 2, True, None)
            "#
        .trim_ascii();

        let output = dry_run(source, "").unwrap();

        assert_eq!(
            output,
            lines(&["1-2-3", "ab", "", "0.25 8 3 True None"])
        );
    }

    #[test]
    fn trailing_partial_line_is_kept() {
        let source = "def f():\n    print('no newline', end='')\n";

        let output = dry_run(source, "").unwrap();

        assert_eq!(output, lines(&["no newline"]));
    }

    #[test]
    fn tuple_assignment_swaps() {
        let source = r#"
def f():
    a, b = 1, 2
    a, b = b, a
    print(a, b)
            "#
        .trim_ascii();

        let output = dry_run(source, "").unwrap();

        assert_eq!(output, lines(&["2 1"]));
    }

    #[test]
    fn loops_with_break_and_continue() {
        let source = r#"
def f():
    i = 0
    while i < 10:
        i = i + 1
        if i % 2 == 0:
            continue
        if i > 7:
            break
        print(i)
    print('done', i)
            "#
        .trim_ascii();

        let output = dry_run(source, "").unwrap();

        assert_eq!(output, lines(&["1", "3", "5", "7", "done 9"]));
    }

    #[test]
    fn match_binds_captures() {
        let source = r#"
def f():
    n = 5
    match n:
        case 1 | 2:
            print('small')
        case other:
            print('got', other)
            "#
        .trim_ascii();

        let output = dry_run(source, "").unwrap();

        assert_eq!(output, lines(&["got 5"]));
    }

    #[test]
    fn formatted_strings() {
        let source = r#"
def f():
    name = 'x'
    value = 3
    print(f"{name} = {value * 2}, {{literal}} {name!r}")
            "#
        .trim_ascii();

        let output = dry_run(source, "").unwrap();

        assert_eq!(output, lines(&["x = 6, {literal} 'x'"]));
    }

    #[test]
    fn return_ends_the_run() {
        let source = r#"
def f():
    print('before')
    return
    print('after')
            "#
        .trim_ascii();

        let output = dry_run(source, "").unwrap();

        assert_eq!(output, lines(&["before"]));
    }

    #[test]
    fn errors_point_at_the_source() {
        let source = "def f():\n    x = 1\n    print(x / (x - 1))\n";

        let result = dry_run(source, "");

        assert_eq!(
            result,
            Err(ExecutionError::DivisionByZero(
                source
                    .find("x / (")
                    .unwrap()
            ))
        );
    }

    #[test]
    fn functions_with_parameters_are_not_run() {
        let result = dry_run("def f(a):\n    print(a)\n", "");

        assert_eq!(result, Err(ExecutionError::Parameters(0)));
    }

    #[test]
    fn unsupported_statements_stop_the_run() {
        let source = "def f():\n    for i in range(3):\n        print(i)\n";

        let result = dry_run(source, "");

        assert_eq!(result, Err(ExecutionError::Unsupported(13, "for")));
    }

    #[test]
    fn output_goes_to_any_writer() {
        let source = "def f():\n    print('hello')\n";
        let module = parse(source).unwrap();
        let function = module
            .functions()
            .next()
            .unwrap();

        let mut output: Vec<u8> = Vec::new();
        let mut input: &[u8] = b"";
        run(function, &mut output, &mut input).unwrap();

        assert_eq!(output, b"hello\n");
    }
}
