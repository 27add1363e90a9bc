use super::Context;
use vstore::resolver::list_objects;

/// Show the root layout without unlocking anything
pub fn info(ctx: &Context) -> anyhow::Result<()> {
    let paths = ctx.paths();
    let settings = if paths.settings_file().exists() {
        "present"
    } else {
        "missing"
    };

    println!("Root:       {}", paths.root().display());
    println!("Settings:   {} ({settings})", paths.settings_file().display());
    println!("Repository: {}", paths.repo_dir().display());
    println!("Store:      {}", paths.store_dir().display());
    println!("Objects:    {}", list_objects(&paths.store_dir())?.len());
    Ok(())
}
