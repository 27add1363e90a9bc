use super::Context;
use crate::prompt::StdinSelector;
use anyhow::Context as _;
use serde_json::Value;
use vstore::VstoreError;

/// Print a field, or the whole document when no pointer is given
pub fn get(ctx: &Context, query: &str, pointer: Option<&str>) -> anyhow::Result<()> {
    let session = ctx.open_session()?;
    let mut selector = StdinSelector::new(session.config().select_attempts);
    let resolved = session.resolve(query, &mut selector)?;
    if resolved.is_new {
        return Err(VstoreError::ObjectNotFound(query.to_string()).into());
    }

    let object = resolved.relative.display().to_string();
    let docs = session.documents();
    match pointer {
        Some(pointer) => {
            let value = docs
                .get_field(&resolved.relative, pointer, session.master_key())
                .with_context(|| format!("Couldn't read {pointer} in {object}"))?;
            println!("{value}");
        }
        None => {
            let document = docs
                .read_document(&resolved.relative, session.master_key())
                .with_context(|| format!("Couldn't read {object}"))?;
            println!("{}", serde_json::to_string_pretty(&Value::Object(document))?);
        }
    }
    Ok(())
}
