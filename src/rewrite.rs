//! The whole-project pipeline: load, resolve, canonicalize, render, check,
//! write back.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::canonicalize::canonicalize;
use crate::config::Config;
use crate::consistency::{check_call_sites, Mismatch};
use crate::diagnostics::Error;
use crate::loader;
use crate::render::render_unit;
use crate::typeck;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute everything but write nothing.
    pub dry_run: bool,
    /// Refuse to write when any call site disagrees with its callee.
    pub strict: bool,
    /// Report-only mode used by `ctxfirst check`.
    pub check: bool,
}

/// Outcome of one run.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    /// Files whose text changed (or would change).
    pub changed_files: Vec<PathBuf>,
    pub mismatches: Vec<Mismatch>,
    /// Expressions and type expressions the resolver could not type.
    pub unresolved: usize,
    /// True when changed files were written back.
    pub written: bool,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.changed_files.is_empty() && self.mismatches.is_empty()
    }
}

pub fn run(config: &Config, root: &Path, opts: &RunOptions) -> Result<Report, Error> {
    let handles = config.handles();
    let mut program = loader::load(&config.load_options(root))?;
    let info = typeck::check_program(&program);

    let rendered: Vec<(PathBuf, String)> = program
        .packages
        .par_iter_mut()
        .filter(|pkg| pkg.rewritable)
        .flat_map(|pkg| pkg.units.par_iter_mut())
        .filter_map(|unit| {
            if !canonicalize(&mut unit.file, &info, &handles) {
                return None;
            }
            let text = render_unit(unit);
            (text != unit.source).then(|| (unit.path.clone(), text))
        })
        .collect();

    let mismatches = check_call_sites(&program, &info, &handles);
    let mut report = Report {
        changed_files: rendered.iter().map(|(path, _)| path.clone()).collect(),
        mismatches,
        unresolved: info.unresolved_count(),
        written: false,
    };

    if opts.dry_run || opts.check {
        return Ok(report);
    }
    if opts.strict && !report.mismatches.is_empty() {
        return Err(Error::Inconsistent { count: report.mismatches.len() });
    }
    for (path, text) in &rendered {
        std::fs::write(path, text).map_err(|e| Error::io(format!("failed to write: {e}"), path))?;
        info!(path = %path.display(), "rewrote");
    }
    report.written = !rendered.is_empty();
    Ok(report)
}
