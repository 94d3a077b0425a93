use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::core::error::HeroError;
use crate::artifacts::core::prompt::Prompter;
use crate::artifacts::core::settings::Settings;
use std::cell::{RefCell, RefMut};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Name of the repository directory under the root
pub const REPOSITORY_DIR: &str = ".hero";
const COMMITS_DIR: &str = "commits";
const INDEX_DIR: &str = "index";

/// Everything a command works on
///
/// Built once per invocation from an explicit root; nothing here reads the
/// process working directory.
pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    prompter: RefCell<Box<dyn Prompter>>,
    settings: Settings,
    index: Arc<Mutex<Index>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    pub fn new(
        path: &Path,
        writer: Box<dyn std::io::Write>,
        prompter: Box<dyn Prompter>,
        settings: Settings,
    ) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        let path = path.canonicalize()?;
        let hero_path = path.join(REPOSITORY_DIR);

        let index = Index::new(hero_path.join(INDEX_DIR).into_boxed_path());
        let database = Database::new(hero_path.join(COMMITS_DIR).into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(hero_path.into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            prompter: RefCell::new(prompter),
            settings,
            index: Arc::new(Mutex::new(index)),
            database,
            workspace,
            refs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hero_path(&self) -> &Path {
        self.refs.path()
    }

    pub fn is_initialized(&self) -> bool {
        self.refs.head_path().is_file()
    }

    /// Fail unless the repository directory exists
    pub fn ensure_initialized(&self) -> anyhow::Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(HeroError::NotARepository(self.path.to_path_buf()).into())
        }
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn prompter(&'_ self) -> RefMut<'_, Box<dyn Prompter>> {
        self.prompter.borrow_mut()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }
}
