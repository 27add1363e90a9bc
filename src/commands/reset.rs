use super::Context;

/// Delete the whole root directory
pub fn reset(ctx: &Context) -> anyhow::Result<()> {
    let root = ctx.paths().root();
    if ctx.paths().reset()? {
        println!("Removed {}", root.display());
    } else {
        println!("Nothing to remove at {}", root.display());
    }
    Ok(())
}
