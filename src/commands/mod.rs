pub mod create;
pub mod get;
pub mod info;
pub mod list;
pub mod passwd;
pub mod remove;
pub mod reset;
pub mod set;

pub use create::create;
pub use get::get;
pub use info::info;
pub use list::list;
pub use passwd::passwd;
pub use remove::remove;
pub use reset::reset;
pub use set::{set, ValueSource};

use crate::prompt::{self, TerminalPrompt};
use anyhow::Context as _;
use std::path::Path;
use vstore::{Session, StorePaths};
use zeroize::Zeroizing;

/// What every command starts from: the root layout and the unlocking password
pub struct Context {
    paths: StorePaths,
    password: Option<Zeroizing<String>>,
}

impl Context {
    pub fn new(root: Option<&Path>, password: Option<String>) -> anyhow::Result<Self> {
        let paths = StorePaths::discover(root).context("Couldn't locate the vstore root")?;
        Ok(Self {
            paths,
            password: password.map(Zeroizing::new),
        })
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Password from the flag or environment, asked for otherwise
    pub fn password(&self) -> anyhow::Result<Zeroizing<String>> {
        match &self.password {
            Some(password) => Ok(password.clone()),
            None => Ok(Zeroizing::new(prompt::secret("Password: ")?)),
        }
    }

    /// Unlock the settings and sync the repository
    pub fn open_session(&self) -> anyhow::Result<Session> {
        let password = self.password()?;
        let session = Session::open(self.paths.clone(), &password, &mut TerminalPrompt)
            .context("Couldn't open the store")?;
        Ok(session)
    }
}
