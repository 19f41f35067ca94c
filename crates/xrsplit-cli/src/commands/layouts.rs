use anyhow::Result;
use xrsplit_core::LayoutTable;
use xrsplit_core::layout::format_layouts;

/// Print the built-in layout table in the format accepted by `--layouts`.
pub fn run() -> Result<()> {
    print!("{}", format_layouts(&LayoutTable::builtin())?);
    Ok(())
}
