//! Loading router source code for the source-based adapters.
//!
//! A [`SourceSet`] is every Rust file of a project that `syn` could parse.
//! Files under `target` and hidden directories are skipped; files with syntax
//! errors are reported as warnings and left out.

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use syn::{Item, UseTree};
use walkdir::WalkDir;

/// Web frameworks whose routers can be read from source
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Framework {
    /// Axum framework
    Axum,
    /// Actix-Web framework
    #[value(name = "actix-web")]
    ActixWeb,
}

/// A successfully parsed Rust file
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed syntax tree
    pub syntax_tree: syn::File,
}

/// The parsed Rust files of one project
#[derive(Debug, Default)]
pub struct SourceSet {
    pub files: Vec<ParsedFile>,
    /// Files or directories that could not be read or parsed
    pub warnings: Vec<String>,
}

impl SourceSet {
    /// Scan `root` recursively and parse every `.rs` file found.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a readable directory.
    pub fn load(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("Project path is not a directory: {}", root.display());
        }

        let mut set = SourceSet::default();
        for path in Self::scan(root, &mut set.warnings)? {
            match Self::parse_file(&path) {
                Ok(parsed) => set.files.push(parsed),
                Err(e) => {
                    warn!("Skipping {}: {:#}", path.display(), e);
                    set.warnings.push(format!("{:#}", e));
                }
            }
        }

        debug!(
            "Loaded {} files from {} ({} warnings)",
            set.files.len(),
            root.display(),
            set.warnings.len()
        );
        Ok(set)
    }

    /// Build a set from in-memory sources, e.g. `("src/main.rs", code)`
    pub fn from_sources<'a, I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut set = SourceSet::default();
        for (name, code) in sources {
            let syntax_tree = syn::parse_file(code)
                .with_context(|| format!("Failed to parse Rust syntax in {}", name))?;
            set.files.push(ParsedFile {
                path: PathBuf::from(name),
                syntax_tree,
            });
        }
        Ok(set)
    }

    /// Collect `.rs` files under `root` in path order
    fn scan(root: &Path, warnings: &mut Vec<String>) -> Result<Vec<PathBuf>> {
        let mut rust_files = Vec::new();

        let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let file_name = e.file_name().to_string_lossy();
            !file_name.starts_with('.') && file_name != "target"
        });

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file()
                        && path.extension().and_then(|s| s.to_str()) == Some("rs")
                    {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(rust_files)
    }

    /// Parse a single Rust source file
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let syntax_tree = syn::parse_file(&content)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Frameworks imported anywhere in the set, judged by `use` items
    pub fn detect_frameworks(&self) -> Vec<Framework> {
        let mut detected = BTreeSet::new();
        for file in &self.files {
            for item in &file.syntax_tree.items {
                if let Item::Use(use_item) = item {
                    check_use_tree(&use_item.tree, &mut detected);
                }
            }
        }
        debug!("Detected frameworks: {:?}", detected);
        detected.into_iter().collect()
    }
}

fn check_use_tree(tree: &UseTree, detected: &mut BTreeSet<Framework>) {
    match tree {
        UseTree::Path(path) => {
            match path.ident.to_string().as_str() {
                "axum" => {
                    detected.insert(Framework::Axum);
                }
                "actix_web" => {
                    detected.insert(Framework::ActixWeb);
                }
                _ => {}
            }
            check_use_tree(&path.tree, detected);
        }
        UseTree::Name(name) => match name.ident.to_string().as_str() {
            "axum" => {
                detected.insert(Framework::Axum);
            }
            "actix_web" => {
                detected.insert(Framework::ActixWeb);
            }
            _ => {}
        },
        UseTree::Group(group) => {
            for tree in &group.items {
                check_use_tree(tree, detected);
            }
        }
        UseTree::Rename(_) | UseTree::Glob(_) => {}
    }
}
