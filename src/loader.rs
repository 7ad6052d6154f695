use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::diagnostics::Error;
use crate::parser::{self, ast::File};

/// One parsed `.go` file.
#[derive(Debug)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub file_id: u32,
    pub source: String,
    pub file: File,
}

#[derive(Debug)]
pub struct Package {
    pub import_path: String,
    pub name: String,
    pub dir: PathBuf,
    /// False for stub packages, which only contribute type facts.
    pub rewritable: bool,
    pub units: Vec<SourceUnit>,
}

/// Every package loaded for one run.
#[derive(Debug, Default)]
pub struct Program {
    pub packages: Vec<Package>,
}

impl Program {
    pub fn package(&self, import_path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.import_path == import_path)
    }

    pub fn units(&self) -> impl Iterator<Item = (&Package, &SourceUnit)> {
        self.packages.iter().flat_map(|p| p.units.iter().map(move |u| (p, u)))
    }

    pub fn unit(&self, file_id: u32) -> Option<&SourceUnit> {
        self.units().map(|(_, u)| u).find(|u| u.file_id == file_id)
    }

    pub fn is_rewritable(&self, import_path: &str) -> bool {
        self.package(import_path).is_some_and(|p| p.rewritable)
    }

    /// True when some file imports `import_path`.
    pub fn imports(&self, import_path: &str) -> bool {
        self.units().any(|(_, u)| u.file.imports.iter().any(|i| i.node.path.node == import_path))
    }

    /// Build a program from in-memory sources, one `(import path, file name,
    /// text)` triple per file. Files sharing an import path form one package.
    pub fn from_sources(sources: &[(&str, &str, &str)]) -> Result<Program, Error> {
        let mut program = Program::default();
        for (file_id, (import_path, name, text)) in sources.iter().enumerate() {
            let file = parser::parse_file(text, file_id as u32)?;
            let unit = SourceUnit {
                path: PathBuf::from(name),
                file_id: file_id as u32,
                source: text.to_string(),
                file,
            };
            match program.packages.iter_mut().find(|p| p.import_path == *import_path) {
                Some(pkg) => pkg.units.push(unit),
                None => program.packages.push(Package {
                    import_path: import_path.to_string(),
                    name: unit.file.package.node.clone(),
                    dir: PathBuf::new(),
                    rewritable: true,
                    units: vec![unit],
                }),
            }
        }
        Ok(program)
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub root: PathBuf,
    pub stub_roots: Vec<PathBuf>,
    /// Directory names skipped anywhere below a root.
    pub exclude: Vec<String>,
    pub include_tests: bool,
}

impl LoadOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stub_roots: Vec::new(),
            exclude: vec!["vendor".to_string(), "testdata".to_string()],
            include_tests: true,
        }
    }
}

/// Load and parse every Go file under the root, then every stub root.
pub fn load(opts: &LoadOptions) -> Result<Program, Error> {
    let module = read_module_path(&opts.root)?;
    let mut roots = vec![(opts.root.clone(), module, true)];
    for stub in &opts.stub_roots {
        roots.push((stub.clone(), None, false));
    }

    let mut files: Vec<(PathBuf, PathBuf, Option<String>, bool)> = Vec::new();
    for (root, module, rewritable) in &roots {
        // Stub roots nested in the project are loaded only as stubs.
        let skip: &[PathBuf] = if *rewritable { &opts.stub_roots } else { &[] };
        for path in discover(root, opts, skip)? {
            files.push((path, root.clone(), module.clone(), *rewritable));
        }
    }

    let parsed: Vec<(SourceUnit, String, bool)> = files
        .par_iter()
        .enumerate()
        .map(|(file_id, (path, root, module, rewritable))| {
            let source = std::fs::read_to_string(path)
                .map_err(|e| Error::io(format!("failed to read {}: {e}", path.display()), path))?;
            let file = parser::parse_file(&source, file_id as u32).map_err(|e| {
                crate::diagnostics::render_error(&source, &path.display().to_string(), &e);
                e
            })?;
            let dir = path.parent().unwrap_or(root);
            let import_path = import_path_for(root, dir, module.as_deref(), &file.package.node);
            let unit = SourceUnit { path: path.clone(), file_id: file_id as u32, source, file };
            Ok((unit, import_path, *rewritable))
        })
        .collect::<Result<_, Error>>()?;

    // Group by (directory, package clause); BTreeMap keeps the result ordered.
    let mut grouped: BTreeMap<(PathBuf, String), Package> = BTreeMap::new();
    for (unit, import_path, rewritable) in parsed {
        let dir = unit.path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = unit.file.package.node.clone();
        // External test packages (`package foo_test`) get their own import path.
        let import_path = match name.strip_suffix("_test") {
            Some(_) if !import_path.ends_with("_test") => format!("{import_path}_test"),
            _ => import_path,
        };
        let pkg = grouped.entry((dir.clone(), name.clone())).or_insert_with(|| Package {
            import_path,
            name,
            dir,
            rewritable,
            units: Vec::new(),
        });
        pkg.units.push(unit);
    }

    let mut program = Program { packages: grouped.into_values().collect() };
    crate::prelude::add_missing(&mut program)?;
    info!(
        packages = program.packages.len(),
        files = program.units().count(),
        "loaded program"
    );
    Ok(program)
}

fn discover(root: &Path, opts: &LoadOptions, skip: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
    if !root.is_dir() {
        return Err(Error::io("not a directory", root));
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        if skip.iter().any(|s| s == entry.path()) {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        !(name.starts_with('.') || name.starts_with('_') || opts.exclude.iter().any(|x| x == name.as_ref()))
    });
    for entry in walker {
        let entry = entry.map_err(|e| Error::io(e.to_string(), root))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(".go") {
            continue;
        }
        if !opts.include_tests && name.ends_with("_test.go") {
            debug!(path = %path.display(), "skipping test file");
            continue;
        }
        files.push(path.to_path_buf());
    }
    Ok(files)
}

/// The `module` path from `go.mod` at the root, if there is one.
fn read_module_path(root: &Path) -> Result<Option<String>, Error> {
    let go_mod = root.join("go.mod");
    if !go_mod.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&go_mod)
        .map_err(|e| Error::io(format!("failed to read go.mod: {e}"), &go_mod))?;
    Ok(text.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        let module = rest.trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    }))
}

fn import_path_for(root: &Path, dir: &Path, module: Option<&str>, package_name: &str) -> String {
    let rel: Vec<String> = dir
        .strip_prefix(root)
        .map(|p| p.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect())
        .unwrap_or_default();
    let rel = rel.join("/");
    match (module, rel.is_empty()) {
        (Some(module), true) => module.to_string(),
        (Some(module), false) => format!("{module}/{rel}"),
        (None, true) => package_name.to_string(),
        (None, false) => rel,
    }
}
