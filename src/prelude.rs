use std::path::PathBuf;

use tracing::debug;

use crate::diagnostics::Error;
use crate::loader::{Package, Program, SourceUnit};
use crate::parser;

/// Standard packages bundled with the tool, keyed by import path.
const PRELUDE: &[(&str, &str)] = &[
    ("context", include_str!("../stdlib/context.go")),
    ("time", include_str!("../stdlib/time.go")),
];

/// Import path of every bundled package.
pub fn builtin_paths() -> impl Iterator<Item = &'static str> {
    PRELUDE.iter().map(|(path, _)| *path)
}

/// Add a non-rewritable bundled package for every import that neither the
/// project nor a stub root provides. Bundled packages import each other, so
/// this repeats until nothing new is added.
pub fn add_missing(program: &mut Program) -> Result<(), Error> {
    while let Some((path, source)) = PRELUDE
        .iter()
        .find(|(path, _)| program.package(path).is_none() && program.imports(path))
    {
        let file_id = program.units().map(|(_, u)| u.file_id + 1).max().unwrap_or(0);
        let file = parser::parse_file(source, file_id)?;
        debug!(path, file_id, "adding builtin package");
        program.packages.push(Package {
            import_path: path.to_string(),
            name: file.package.node.clone(),
            dir: PathBuf::from("<builtin>"),
            rewritable: false,
            units: vec![SourceUnit {
                path: PathBuf::from(format!("<builtin>/{path}.go")),
                file_id,
                source: source.to_string(),
                file,
            }],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_packages_parse() {
        for (i, (path, source)) in PRELUDE.iter().enumerate() {
            let file = parser::parse_file(source, i as u32).unwrap();
            assert_eq!(file.package.node, *path);
        }
    }

    #[test]
    fn only_imported_packages_are_added() {
        let mut program = Program::from_sources(&[("example.com/app", "app.go", "package app\n")]).unwrap();
        add_missing(&mut program).unwrap();
        assert_eq!(program.packages.len(), 1);
    }

    #[test]
    fn context_pulls_in_time() {
        let mut program =
            Program::from_sources(&[("example.com/app", "app.go", "package app\n\nimport \"context\"\n")]).unwrap();
        add_missing(&mut program).unwrap();
        let paths: Vec<&str> = program.packages.iter().map(|p| p.import_path.as_str()).collect();
        assert_eq!(paths, ["example.com/app", "context", "time"]);
        assert!(!program.is_rewritable("context"));
        assert_eq!(program.package("time").unwrap().units[0].file_id, 2);
    }

    #[test]
    fn provided_packages_are_not_replaced() {
        let mut program = Program::from_sources(&[
            ("context", "context.go", "package context\n\ntype Context interface{}\n"),
            ("example.com/app", "app.go", "package app\n\nimport \"context\"\n"),
        ])
        .unwrap();
        add_missing(&mut program).unwrap();
        assert_eq!(program.packages.len(), 2);
        assert_eq!(program.package("context").unwrap().units[0].path, PathBuf::from("context.go"));
    }
}
