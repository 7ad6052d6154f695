#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use ctxfirst::canonicalize::canonicalize;
use ctxfirst::handles::HandleTypeSet;
use ctxfirst::loader::Program;
use ctxfirst::render::render_unit;
use ctxfirst::typeck::{check_program, TypeInfo};

/// A cut-down `context` package.
pub const CONTEXT_STUB: &str = "package context

type Context interface {
	Done() <-chan struct{}
	Err() error
	Value(key any) any
}

type CancelFunc func()

func Background() Context { return nil }

func TODO() Context { return nil }

func WithCancel(parent Context) (Context, CancelFunc) { return parent, nil }
";

pub fn ctxfirst() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ctxfirst"))
}

/// Write `files` (relative path, text) into a fresh temporary directory.
pub fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in files {
        write(dir.path(), name, text);
    }
    dir
}

pub fn write(root: &Path, name: &str, text: &str) {
    let path = root.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

pub fn read(root: &Path, name: &str) -> String {
    std::fs::read_to_string(root.join(name)).unwrap()
}

/// Build an in-memory program; packages listed in `stubs` are not rewritable.
pub fn program(sources: &[(&str, &str, &str)], stubs: &[&str]) -> Program {
    let mut program = Program::from_sources(sources).unwrap();
    for pkg in &mut program.packages {
        pkg.rewritable = !stubs.contains(&pkg.import_path.as_str());
    }
    program
}

/// Canonicalize every rewritable unit of `program` in place. Returns the
/// oracle and `(file name, rendered text, changed)` per rewritable unit.
pub fn rewrite(program: &mut Program, handles: &HandleTypeSet) -> (TypeInfo, Vec<(String, String, bool)>) {
    let info = check_program(program);
    let mut out = Vec::new();
    for pkg in program.packages.iter_mut().filter(|p| p.rewritable) {
        for unit in &mut pkg.units {
            let changed = canonicalize(&mut unit.file, &info, handles);
            out.push((unit.path.display().to_string(), render_unit(unit), changed));
        }
    }
    (info, out)
}

/// Rewrite one file of package `example.com/app` against the `context` stub.
pub fn rewrite_with_context(src: &str) -> (String, bool) {
    let mut program = program(
        &[("context", "context.go", CONTEXT_STUB), ("example.com/app", "app.go", src)],
        &["context"],
    );
    let (_, mut files) = rewrite(&mut program, &HandleTypeSet::default());
    let (_, text, changed) = files.remove(0);
    (text, changed)
}
