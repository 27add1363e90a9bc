use super::Context;
use anyhow::Context as _;
use vstore::resolver::validate_object_path;

/// Remove the object at the literal path
pub fn remove(ctx: &Context, path: &str) -> anyhow::Result<()> {
    let session = ctx.open_session()?;
    let object = validate_object_path(path)?;

    session
        .documents()
        .remove(&object)
        .with_context(|| format!("Couldn't remove {path}"))?;

    println!("Removed {}", object.display());
    Ok(())
}
