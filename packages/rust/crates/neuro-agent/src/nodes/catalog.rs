use neuro_agent::{ToolCatalog, eeg_catalog};

pub(crate) fn run_catalog_mode() -> anyhow::Result<()> {
    let catalog = ToolCatalog::new(eeg_catalog())?;
    let schemas = catalog.json_schemas();
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}
