use super::Context;
use crate::prompt;
use anyhow::{bail, Context as _};
use vstore::{settings, StoreLock};
use zeroize::Zeroizing;

/// Re-encrypt the settings under a new password
pub fn passwd(ctx: &Context, new_password: Option<String>) -> anyhow::Result<()> {
    let paths = ctx.paths();
    if !paths.settings_file().exists() {
        bail!("No settings at {}", paths.settings_file().display());
    }

    let _lock = StoreLock::acquire(paths.lock_file())?;
    let old_password = ctx.password()?;
    let new_password = match new_password {
        Some(password) => Zeroizing::new(password),
        None => Zeroizing::new(prompt::secret("New password: ")?),
    };
    if new_password.is_empty() {
        bail!("The new password must not be empty");
    }

    settings::change_password(paths, &old_password, &new_password)
        .context("Couldn't change the password")?;
    println!("Password changed");
    Ok(())
}
