use super::status::format_status;
use super::{absolute, Session, SourceArgs};
use crate::colors::*;
use crate::error::Result;
use crate::linker::PlannedLinker;
use crate::pnp::{LocationIndex, PrefixMatcher};

pub fn cmd_locate(source: &SourceArgs, paths: &[String]) -> Result<()> {
    let session = Session::open(source)?;
    let linker = PlannedLinker::new(session.externals());
    let store = session.build(&linker)?;
    let index = LocationIndex::from_store(&store);
    let matcher = PrefixMatcher::new(&index);

    for raw in paths {
        let path = absolute(raw)?;
        match matcher.locate(path.as_str()) {
            Ok(Some(locator)) => println!("{C_GRAY}[pnpgen]{C_RESET} {path} => {locator}"),
            Ok(None) => {
                println!("{C_GRAY}[pnpgen]{C_RESET} {path} => {C_DIM}(no owning package){C_RESET}")
            }
            Err(err) => println!("{}", format_status("error", &err.to_string())),
        }
    }
    Ok(())
}
