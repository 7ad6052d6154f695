pub mod span;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod visit;
pub mod typeck;
pub mod handles;
pub mod canonicalize;
pub mod render;
pub mod loader;
pub mod prelude;
pub mod config;
pub mod consistency;
pub mod rewrite;

use std::path::PathBuf;

use diagnostics::Error;
use handles::HandleTypeSet;
use loader::{Package, Program, SourceUnit};

/// Rewrite a single Go source file (parse → resolve → canonicalize → render).
/// The file is resolved on its own against the bundled standard packages.
/// Returns the new text and whether anything moved.
pub fn canonicalize_source(source: &str, handles: &HandleTypeSet) -> Result<(String, bool), Error> {
    let file = parser::parse_file(source, 0)?;
    let name = file.package.node.clone();
    let mut program = Program {
        packages: vec![Package {
            import_path: name.clone(),
            name,
            dir: PathBuf::new(),
            rewritable: true,
            units: vec![SourceUnit { path: PathBuf::from("input.go"), file_id: 0, source: source.to_string(), file }],
        }],
    };
    prelude::add_missing(&mut program)?;
    let info = typeck::check_program(&program);
    let Some(unit) = program.packages.iter_mut().flat_map(|p| &mut p.units).next() else {
        return Ok((source.to_string(), false));
    };
    let changed = canonicalize::canonicalize(&mut unit.file, &info, handles);
    Ok((render::render_unit(unit), changed))
}
