#[cfg(test)]
mod samples {
    use std::fs;
    use std::path::{Path, PathBuf};

    use structogram::language::Node;
    use structogram::parsing;
    use structogram::rendering;

    fn python_files(dir: &Path) -> Vec<PathBuf> {
        assert!(dir.exists(), "{} directory missing", dir.display());

        let entries = fs::read_dir(dir).expect("Failed to read directory");

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.expect("Failed to read directory entry");
            let path = entry.path();

            if path
                .extension()
                .and_then(|s| s.to_str())
                == Some("py")
            {
                files.push(path);
            }
        }

        assert!(!files.is_empty(), "No .py files found in {}", dir.display());
        files
    }

    #[test]
    fn ensure_samples_parse() {
        let files = python_files(Path::new("tests/samples/"));

        let mut failures = Vec::new();

        for file in &files {
            let content = parsing::load(&file)
                .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", file, e));

            match parsing::parse(&content) {
                Ok(_) => {}
                Err(e) => {
                    println!("File {:?} failed to parse: {:?}", file, e);
                    failures.push(file.clone());
                }
            }
        }

        if !failures.is_empty() {
            panic!(
                "Sample files should parse successfully, but {} files failed",
                failures.len()
            );
        }
    }

    #[test]
    fn ensure_samples_render_cleanly() {
        let files = python_files(Path::new("tests/samples/"));

        for file in &files {
            let content = parsing::load(&file)
                .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", file, e));
            let module = parsing::parse(&content)
                .unwrap_or_else(|e| panic!("Failed to parse {:?}: {:?}", file, e));

            let function = module
                .functions()
                .next()
                .unwrap_or_else(|| panic!("No function in {:?}", file));

            let fragment = rendering::structogram(Node::Function(function), &content).unwrap();

            assert!(
                fragment
                    .problems
                    .is_empty(),
                "{:?} rendered with problems: {:?}",
                file,
                fragment.problems
            );
            assert!(fragment
                .markup
                .starts_with(&format!("% Structogram {} \n", function.name.0)));
            assert!(fragment
                .markup
                .ends_with("\\end{centernss}\n"));
        }
    }
}
