use super::Context;
use anyhow::Context as _;
use vstore::resolver::prepare_new_object;

/// Create an empty object at the literal path, rekeying it if it exists
pub fn create(ctx: &Context, path: &str) -> anyhow::Result<()> {
    let session = ctx.open_session()?;
    let resolved = prepare_new_object(&session.store_dir(), path)?;

    session
        .documents()
        .create_empty(&resolved.relative, session.master_key())
        .with_context(|| format!("Couldn't create {path}"))?;

    if resolved.is_new {
        println!("Created {}", resolved.relative.display());
    } else {
        println!("Re-encrypted {}", resolved.relative.display());
    }
    Ok(())
}
