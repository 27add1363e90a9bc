use super::Context;
use vstore::resolver::{fuzzy_find, list_objects};

/// Print object paths, best fuzzy matches first when a query is given
pub fn list(ctx: &Context, query: Option<&str>) -> anyhow::Result<()> {
    let session = ctx.open_session()?;
    let objects = list_objects(&session.store_dir())?;

    match query {
        Some(query) => {
            for candidate in fuzzy_find(query, &objects) {
                println!("{}", candidate.path);
            }
        }
        None => {
            for object in objects {
                println!("{object}");
            }
        }
    }
    Ok(())
}
