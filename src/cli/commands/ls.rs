use super::{Session, SourceArgs};
use crate::colors::*;
use crate::error::Result;
use crate::linker::PlannedLinker;

pub fn cmd_ls(source: &SourceArgs) -> Result<()> {
    let session = Session::open(source)?;
    let linker = PlannedLinker::new(session.externals());
    let store = session.build(&linker)?;

    println!(
        "{gray}[pnpgen]{reset} packages ({count} instances):",
        gray = C_GRAY,
        reset = C_RESET,
        count = store.len()
    );
    for (locator, info) in store.iter() {
        println!(
            "{gray}[pnpgen]{reset}  {dim}-{reset} {locator} {dim}{location}{reset}",
            gray = C_GRAY,
            dim = C_DIM,
            reset = C_RESET,
            location = info.package_location
        );
        for (dep, reference) in &info.package_dependencies {
            println!("{C_GRAY}[pnpgen]{C_RESET}      {dep} => {reference}");
        }
    }
    Ok(())
}
